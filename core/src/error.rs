//! Error taxonomy for conversions and external surfaces
//!
//! Malformed input never reaches this type: converters degrade to text
//! instead. What remains are failures the user has to see.

use crate::models::ExchangeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EchoError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("encoded payload is {len} chars, limit is {limit}")]
    PayloadTooLarge { len: usize, limit: usize },

    /// Every serialization strategy failed; one reason per attempt
    #[error("dashboard payload could not be built ({})", .0.join("; "))]
    DashboardUnavailable(Vec<String>),

    #[error("viewer payload could not be decoded: {0}")]
    ViewerDecode(String),

    #[error("surface unavailable: {0}")]
    Transport(String),

    #[error("{0}")]
    Clipboard(String),

    #[error("exchange {0} is no longer captured")]
    NotFound(ExchangeId),

    #[error("no request selected")]
    NoSelection,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl EchoError {
    /// Short text for an error toast
    pub fn user_message(&self) -> String {
        match self {
            Self::Clipboard(detail) => format!("Failed to copy: {}", detail),
            Self::NotFound(_) => "Request is no longer available".to_string(),
            Self::NoSelection => "Select a request first".to_string(),
            Self::DashboardUnavailable(_) | Self::PayloadTooLarge { .. } => {
                "Error: request is too large to open in the dashboard".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}
