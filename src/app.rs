//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves configuration (.env, access token, endpoints)
//! - initializes logging
//! - runs the map pipeline and hands the result to a front-end

use std::time::Duration;

use clap::Parser;

use crate::cli::{Command, FeedArgs, HtmlArgs};
use crate::data::{DEFAULT_FAULT_LINES_URL, earthquake_feed_url};
use crate::domain::{AccessToken, MapConfig};
use crate::error::AppError;
use crate::logging::{self, LogTarget};

pub mod pipeline;

const TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Entry point for the `quake` binary.
pub fn run() -> Result<(), AppError> {
    // `quake` and `quake -w day` behave like `quake tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Html(args) => handle_html(args),
    }
}

fn handle_tui(args: FeedArgs) -> Result<(), AppError> {
    let config = map_config_from_args(&args)?;
    // The terminal belongs to the UI; logs go to the file only.
    let _log = logging::init(LogTarget::FileOnly)?;
    crate::tui::run(config)
}

fn handle_summary(args: FeedArgs) -> Result<(), AppError> {
    let config = map_config_from_args(&args)?;
    let _log = logging::init(LogTarget::FileAndStderr)?;
    let run = pipeline::run_map(&config)?;

    println!("{}", crate::report::format_map_summary(&run, &config));
    println!("{}", crate::report::format_strongest(&run, config.top_n));
    Ok(())
}

fn handle_html(args: HtmlArgs) -> Result<(), AppError> {
    let config = map_config_from_args(&args.feed)?;
    let _log = logging::init(LogTarget::FileAndStderr)?;
    let run = pipeline::run_map(&config)?;

    crate::io::write_map_html(&args.out, &run.map)?;
    for issue in &run.issues {
        eprintln!("warning: {} layer missing: {}", issue.overlay.display_name(), issue.error);
    }
    println!("Wrote {}", args.out.display());
    Ok(())
}

/// Resolve a [`MapConfig`] from arguments and the environment.
pub fn map_config_from_args(args: &FeedArgs) -> Result<MapConfig, AppError> {
    dotenvy::dotenv().ok();
    let env_token = std::env::var(TOKEN_ENV).ok();
    map_config_with_token(args, env_token)
}

fn map_config_with_token(args: &FeedArgs, env_token: Option<String>) -> Result<MapConfig, AppError> {
    let token = args
        .access_token
        .clone()
        .or(env_token)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            AppError::usage(format!(
                "Missing tile access token: pass --access-token or set {TOKEN_ENV} (.env)."
            ))
        })?;

    if args.timeout_secs == 0 {
        return Err(AppError::usage("--timeout-secs must be at least 1."));
    }

    Ok(MapConfig {
        earthquake_url: args
            .quakes_url
            .clone()
            .unwrap_or_else(|| earthquake_feed_url(args.window)),
        fault_lines_url: args
            .faults_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FAULT_LINES_URL.to_string()),
        window: args.window,
        access_token: AccessToken::new(token.trim()),
        timeout: Duration::from_secs(args.timeout_secs),
        top_n: args.top,
    })
}

/// Rewrite argv so `quake` defaults to `quake tui`.
///
/// Rules:
/// - `quake`                      -> `quake tui`
/// - `quake -w day ...`           -> `quake tui -w day ...`
/// - `quake --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "summary" | "html");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedWindow;
    use crate::error::ErrorKind;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn feed_args() -> FeedArgs {
        FeedArgs {
            window: FeedWindow::Week,
            quakes_url: None,
            faults_url: None,
            access_token: None,
            timeout_secs: 30,
            top: 10,
        }
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["quake"])), args(&["quake", "tui"]));
        assert_eq!(
            rewrite_args(args(&["quake", "-w", "day"])),
            args(&["quake", "tui", "-w", "day"])
        );
        assert_eq!(
            rewrite_args(args(&["quake", "summary", "--top", "3"])),
            args(&["quake", "summary", "--top", "3"])
        );
        assert_eq!(rewrite_args(args(&["quake", "--help"])), args(&["quake", "--help"]));
    }

    #[test]
    fn config_prefers_flag_token_over_env() {
        let mut a = feed_args();
        a.access_token = Some("pk.flag".to_string());
        let config = map_config_with_token(&a, Some("pk.env".to_string())).unwrap();
        assert_eq!(config.access_token.as_str(), "pk.flag");
        assert!(config.earthquake_url.ends_with("all_week.geojson"));
        assert_eq!(config.fault_lines_url, DEFAULT_FAULT_LINES_URL);
    }

    #[test]
    fn config_without_token_is_a_usage_error() {
        let err = map_config_with_token(&feed_args(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.exit_code(), 2);

        let err = map_config_with_token(&feed_args(), Some("  ".to_string())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn url_overrides_win() {
        let mut a = feed_args();
        a.quakes_url = Some("http://localhost:9000/q.json".to_string());
        let config = map_config_with_token(&a, Some("pk.env".to_string())).unwrap();
        assert_eq!(config.earthquake_url, "http://localhost:9000/q.json");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn cli_parses_html_command() {
        let cli = crate::cli::Cli::parse_from(args(&["quake", "html", "-o", "out.html", "-w", "day"]));
        match cli.command {
            Command::Html(html) => {
                assert_eq!(html.out, std::path::PathBuf::from("out.html"));
                assert_eq!(html.feed.window, FeedWindow::Day);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
