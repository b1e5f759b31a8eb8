//! Relay of converted payloads to the privileged surface
//!
//! The panel sends [`BridgeMessage`]s; the bridge turns them into tab opens,
//! documents or clipboard writes on a [`Surface`] and answers with a
//! [`BridgeResponse`].

use super::clipboard::{ClipboardRelay, ClipboardTarget};
use super::compression::CompressionService;
use super::viewer::build_viewer_url;
use crate::config::EchoConfig;
use crate::convert::{DashboardLimits, PostmanCollection, SerializationStrategy};
use crate::error::EchoError;
use crate::models::ExchangeRecord;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Host side of the bridge: tab creation plus a clipboard-capable page
#[async_trait]
pub trait Surface: ClipboardTarget {
    async fn open_url(&self, url: &str) -> Result<(), EchoError>;
    /// Open a generated HTML document in a new browsing context
    async fn open_document(&self, html: &str) -> Result<(), EchoError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BridgeMessage {
    /// `data` is an encoded viewer payload
    OpenDashboard { data: String },
    OpenLocalDashboard { data: String },
    RunPostman { data: PostmanCollection },
    CopyToClipboard { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

impl From<Result<(), EchoError>> for BridgeResponse {
    fn from(result: Result<(), EchoError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

/// A viewer payload and the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
    pub data: String,
    pub strategy: SerializationStrategy,
}

pub struct TransportBridge<S, C> {
    surface: S,
    compression: C,
    relay: ClipboardRelay,
    viewer_base_url: String,
    local_viewer_url: String,
    fork_endpoint: String,
    limits: DashboardLimits,
    strategies: Vec<SerializationStrategy>,
}

impl<S: Surface, C: CompressionService> TransportBridge<S, C> {
    pub fn new(surface: S, compression: C, config: &EchoConfig) -> Self {
        Self {
            surface,
            compression,
            relay: ClipboardRelay::default(),
            viewer_base_url: config.viewer_base_url.clone(),
            local_viewer_url: config.local_viewer_url.clone(),
            fork_endpoint: config.fork_endpoint.clone(),
            limits: config.dashboard,
            strategies: SerializationStrategy::fallback_chain(),
        }
    }

    pub fn with_relay(mut self, relay: ClipboardRelay) -> Self {
        self.relay = relay;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Answer one panel message. Failures are reported, never retried.
    pub async fn handle(&self, message: BridgeMessage) -> BridgeResponse {
        self.dispatch(message).await.into()
    }

    pub async fn dispatch(&self, message: BridgeMessage) -> Result<(), EchoError> {
        match message {
            BridgeMessage::OpenDashboard { data } => {
                let url = build_viewer_url(&self.viewer_base_url, &data, false);
                self.surface.open_url(&url).await
            }
            BridgeMessage::OpenLocalDashboard { data } => {
                let url = build_viewer_url(&self.local_viewer_url, &data, true);
                self.surface.open_url(&url).await
            }
            BridgeMessage::RunPostman { data } => self.run_postman(&data).await,
            BridgeMessage::CopyToClipboard { text } => self.copy_to_clipboard(&text).await,
        }
    }

    pub async fn copy_to_clipboard(&self, text: &str) -> Result<(), EchoError> {
        self.relay.copy(&self.surface, text).await
    }

    pub async fn run_postman(&self, collection: &PostmanCollection) -> Result<(), EchoError> {
        let json = serde_json::to_string(collection)?;
        let page = postman_fork_page(&json, &self.fork_endpoint);
        self.surface.open_document(&page).await
    }

    /// Serialize, compress and base64-encode `records` for the viewer,
    /// walking the fallback chain until one strategy fits.
    pub async fn encode_for_viewer<R: Borrow<ExchangeRecord>>(
        &self,
        records: &[R],
    ) -> Result<EncodedPayload, EchoError> {
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match self.encode_with(*strategy, records).await {
                Ok(data) => {
                    if !failures.is_empty() {
                        tracing::info!(
                            "Dashboard payload built with {} strategy after {} failure(s)",
                            strategy.name(),
                            failures.len()
                        );
                    }
                    return Ok(EncodedPayload {
                        data,
                        strategy: *strategy,
                    });
                }
                Err(err) => {
                    tracing::warn!("{} dashboard serialization failed: {}", strategy.name(), err);
                    failures.push(format!("{}: {}", strategy.name(), err));
                }
            }
        }
        Err(EchoError::DashboardUnavailable(failures))
    }

    async fn encode_with<R: Borrow<ExchangeRecord>>(
        &self,
        strategy: SerializationStrategy,
        records: &[R],
    ) -> Result<String, EchoError> {
        let json = strategy.serialize(records, &self.limits)?;
        let compressed = self.compression.compress(&json).await?;
        let data = general_purpose::STANDARD.encode(compressed);
        if data.len() > self.limits.max_encoded_chars {
            return Err(EchoError::PayloadTooLarge {
                len: data.len(),
                limit: self.limits.max_encoded_chars,
            });
        }
        Ok(data)
    }

    /// Encode `records` and open them in the hosted or bundled viewer.
    /// Returns the opened URL.
    pub async fn open_dashboard<R: Borrow<ExchangeRecord>>(
        &self,
        records: &[R],
        local: bool,
    ) -> Result<String, EchoError> {
        let payload = self.encode_for_viewer(records).await?;
        let url = if local {
            build_viewer_url(&self.local_viewer_url, &payload.data, true)
        } else {
            build_viewer_url(&self.viewer_base_url, &payload.data, false)
        };
        self.surface.open_url(&url).await?;
        Ok(url)
    }
}

/// Auto-submitting page that forks `collection_json` into Postman
pub fn postman_fork_page(collection_json: &str, endpoint: &str) -> String {
    let value = collection_json.replace('&', "&amp;").replace('\'', "&#39;");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Opening in Postman...</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f5f5f5; }}
        .loading {{ text-align: center; }}
    </style>
</head>
<body>
    <div class="loading">
        <h2>Opening in Postman...</h2>
        <p>If nothing happens, please check if popups are blocked.</p>
    </div>
    <form id="postmanForm" method="POST" action="{endpoint}" target="_blank">
        <input type="hidden" name="collection" value='{value}'>
    </form>
    <script>
        document.getElementById('postmanForm').submit();
        setTimeout(() => window.close(), 2000);
    </script>
</body>
</html>
"#
    )
}
