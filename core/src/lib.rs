//! # Echo Core
//!
//! Capture-and-presentation engine behind the Echo network inspector panel.
//!
//! ## Features
//!
//! - Bounded in-memory capture of finished HTTP exchanges
//! - Type, domain and free-text filtering
//! - Export to cURL, Postman collections, HAR and JSON
//! - Size-bounded dashboard links with gzip transport
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 DevTools panel (host)                    │
//! ├─────────────────────────────────────────────────────────┤
//! │        PresentationController  ·  RenderScheduler        │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌──────────┐  ┌───────────┐  ┌─────────┐  │
//! │  │ Capture │  │  Filter  │  │ Converters│  │Transport│  │
//! │  │ Buffer  │──│  Engine  │──│           │──│ Bridge  │  │
//! │  └─────────┘  └──────────┘  └───────────┘  └─────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod convert;
pub mod error;
pub mod filter;
pub mod models;
pub mod storage;
pub mod transport;

pub use config::{create_default_config, init_core, EchoConfig};
pub use error::EchoError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the version of the Echo core library
pub fn get_version() -> String {
    VERSION.to_string()
}
