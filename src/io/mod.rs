//! Output helpers.
//!
//! - standalone Leaflet page for the assembled map (`html`)

pub mod html;

pub use html::*;
