//! Data models for Echo
//!
//! These models are shared by the capture buffer, the filter engine and the
//! format converters.

pub mod display;
pub mod exchange;

pub use display::UrlDisplayMode;
pub use exchange::*;
