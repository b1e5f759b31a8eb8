//! Clipboard relay
//!
//! Writes need a focused page, so the relay focuses the target, gives focus
//! a moment to settle, then tries the native API before the legacy
//! select-and-copy path.

use crate::error::EchoError;
use async_trait::async_trait;
use std::time::Duration;

pub const FOCUS_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// A page context able to receive clipboard writes
#[async_trait]
pub trait ClipboardTarget: Send + Sync {
    /// Focus the page. Fails when there is no page to focus.
    async fn focus(&self) -> Result<(), String>;
    async fn write_native(&self, text: &str) -> Result<(), String>;
    /// Selection-based copy; `Ok(false)` when the command was refused
    async fn write_legacy(&self, text: &str) -> Result<bool, String>;
}

#[derive(Debug, Clone, Copy)]
pub struct ClipboardRelay {
    focus_delay: Duration,
}

impl Default for ClipboardRelay {
    fn default() -> Self {
        Self::new(FOCUS_SETTLE_DELAY)
    }
}

impl ClipboardRelay {
    pub fn new(focus_delay: Duration) -> Self {
        Self { focus_delay }
    }

    pub async fn copy<T: ClipboardTarget>(&self, target: &T, text: &str) -> Result<(), EchoError> {
        target.focus().await.map_err(EchoError::Clipboard)?;
        tokio::time::sleep(self.focus_delay).await;

        let native_err = match target.write_native(text).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        tracing::warn!("Clipboard write failed: {}", native_err);

        match target.write_legacy(text).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(EchoError::Clipboard(
                "Both clipboard API and execCommand failed".to_string(),
            )),
            Err(fallback_err) => {
                tracing::error!("Fallback copy failed: {}", fallback_err);
                Err(EchoError::Clipboard(format!(
                    "Clipboard API failed: {}, Fallback failed: {}",
                    native_err, fallback_err
                )))
            }
        }
    }
}
