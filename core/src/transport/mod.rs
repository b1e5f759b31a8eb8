//! Transport to external surfaces: viewer links, clipboard, Postman fork

pub mod bridge;
pub mod clipboard;
pub mod compression;
pub mod viewer;

pub use bridge::{postman_fork_page, BridgeMessage, BridgeResponse, EncodedPayload, Surface, TransportBridge};
pub use clipboard::{ClipboardRelay, ClipboardTarget, FOCUS_SETTLE_DELAY};
pub use compression::{CompressionService, GzipCompression};
pub use viewer::{build_viewer_url, decode_viewer_payload, decode_viewer_url, selector_label, ViewerState};
