/// Broad category of an [`AppError`].
///
/// The pipeline uses the kind to decide whether a failed feed can be dropped
/// (partial failure) or whether the whole run has to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or missing configuration (e.g. no tile access token).
    Usage,
    /// The request failed or the server answered with a non-success status.
    Network,
    /// The response body is not the GeoJSON document we expected.
    Malformed,
    /// Terminal setup, drawing, or input failure.
    Terminal,
    /// Local file or directory failure.
    Io,
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let exit_code = match kind {
            ErrorKind::Usage => 2,
            ErrorKind::Network | ErrorKind::Malformed | ErrorKind::Terminal | ErrorKind::Io => 4,
        };
        Self {
            kind,
            exit_code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::usage("x").exit_code(), 2);
        assert_eq!(AppError::network("x").exit_code(), 4);
        assert_eq!(AppError::malformed("x").exit_code(), 4);
        assert_eq!(AppError::malformed("x").kind(), ErrorKind::Malformed);
        assert_eq!(AppError::io("disk full").to_string(), "disk full");
    }
}
