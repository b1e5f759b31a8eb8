//! Panel-facing API: capture session, render scheduling and conversions

pub mod controller;
pub mod render;
pub mod session;

pub use controller::{ConversionKind, Notification, NotificationKind, PresentationController};
pub use render::{RenderFrame, RenderGuard, RenderScheduler, RowView};
pub use session::CaptureSession;
