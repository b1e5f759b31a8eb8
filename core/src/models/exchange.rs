//! Captured exchange model
//!
//! Represents a single HTTP request/response pair observed by the devtools
//! network inspector during a debugging session.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Domain used when the URL host cannot be determined
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Exchanges slower than this (in ms) are flagged as slow
pub const SLOW_THRESHOLD_MS: f64 = 1000.0;

/// Query parameters extracted from a GET URL, in URL order
pub type QueryParams = Map<String, Value>;

/// Identifier assigned to an exchange at capture time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Generate a fresh identifier: capture time in ms plus a random suffix
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", millis, &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExchangeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExchangeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single header as reported by the network inspector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Case-insensitive header lookup returning the first match
pub fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Coarse resource classification used by the type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Xhr,
    Js,
    Css,
    Img,
    Doc,
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Xhr => "xhr",
            ResourceType::Js => "js",
            ResourceType::Css => "css",
            ResourceType::Img => "img",
            ResourceType::Doc => "doc",
            ResourceType::Other => "other",
        }
    }

    /// Parse the short filter name (`xhr`, `js`, ...)
    pub fn from_filter_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "xhr" => Some(ResourceType::Xhr),
            "js" => Some(ResourceType::Js),
            "css" => Some(ResourceType::Css),
            "img" => Some(ResourceType::Img),
            "doc" => Some(ResourceType::Doc),
            "other" => Some(ResourceType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finished-exchange event delivered by the host network-inspection API.
///
/// The response body is not part of the event; it arrives later through a
/// separate content retrieval and is attached by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub url: String,
    pub method: String,
    pub status: u16,
    /// When the request started, if the host reported it
    pub started_at: Option<DateTime<Utc>>,
    /// Total time in ms as reported by the host
    pub time_ms: f64,
    pub request_headers: Vec<Header>,
    pub response_headers: Vec<Header>,
    pub request_body: Option<String>,
    /// Response body size; hosts report -1 when unknown
    pub body_size: i64,
    /// Protocol-reported resource type (`xhr`, `fetch`, `script`, ...)
    pub resource_type: Option<String>,
}

impl CaptureEvent {
    /// Data URIs and the extension's own pages never enter the buffer
    pub fn is_capturable(&self) -> bool {
        let url = self.url.trim_start();
        !(starts_with_ignore_case(url, "data:") || starts_with_ignore_case(url, "chrome-extension:"))
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

/// One captured network exchange. Immutable once built; derived views are
/// always new structures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRecord {
    pub id: ExchangeId,
    pub url: String,
    pub method: String,
    pub domain: String,
    pub status: u16,
    /// Start of the exchange, ms since epoch
    pub start_time: i64,
    /// End of the exchange, ms since epoch
    pub end_time: i64,
    /// Total duration in ms, never negative
    pub duration: f64,
    pub size_bytes: u64,
    pub resource_type: ResourceType,
    pub failed: bool,
    pub slow: bool,
    pub request_headers: Vec<Header>,
    pub response_headers: Vec<Header>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<QueryParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl ExchangeRecord {
    /// Build a record from a finished-exchange event. Never fails: an
    /// unparseable URL yields the `unknown` domain.
    pub fn from_event(id: ExchangeId, event: CaptureEvent) -> Self {
        let parsed = Url::parse(&event.url).ok();
        let domain = parsed
            .as_ref()
            .and_then(|u| u.host_str())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                tracing::debug!("Could not derive domain from {:?}", event.url);
                UNKNOWN_DOMAIN.to_string()
            });

        let duration = if event.time_ms.is_finite() {
            event.time_ms.max(0.0)
        } else {
            0.0
        };
        let start_time = event
            .started_at
            .map(|t| t.timestamp_millis())
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        let end_time = start_time.saturating_add(duration.round() as i64);

        let content_type = find_header(&event.response_headers, "content-type");
        let resource_type = crate::filter::classify_resource_type(
            event.resource_type.as_deref(),
            &event.url,
            content_type,
        );

        let query_params = if event.method.eq_ignore_ascii_case("GET") {
            parsed.as_ref().and_then(extract_query_params)
        } else {
            None
        };

        Self {
            id,
            url: event.url,
            method: event.method,
            domain,
            status: event.status,
            start_time,
            end_time,
            duration,
            size_bytes: event.body_size.max(0) as u64,
            resource_type,
            failed: event.status >= 400,
            slow: duration > SLOW_THRESHOLD_MS,
            request_headers: event.request_headers,
            response_headers: event.response_headers,
            request_body: event.request_body,
            query_params,
            response_body: None,
        }
    }

    /// Copy of this record carrying the retrieved response body
    pub fn with_response_body(&self, body: Option<String>) -> Self {
        Self {
            response_body: body,
            ..self.clone()
        }
    }

    pub fn request_header(&self, name: &str) -> Option<&str> {
        find_header(&self.request_headers, name)
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        find_header(&self.response_headers, name)
    }

    pub fn request_content_type(&self) -> Option<&str> {
        self.request_header("content-type")
    }

    pub fn response_content_type(&self) -> Option<&str> {
        self.response_header("content-type")
    }

    /// Duration for the list view, empty when unknown
    pub fn duration_str(&self) -> String {
        if self.duration <= 0.0 {
            String::new()
        } else {
            format!("{}ms", self.duration.round() as u64)
        }
    }

    /// Human readable response size, empty when unknown
    pub fn size_str(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        if self.size_bytes == 0 {
            return String::new();
        }
        let mut size = self.size_bytes as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        let rounded = (size * 10.0).round() / 10.0;
        format!("{}{}", rounded, UNITS[unit])
    }

    /// CSS-style status bucket used by the list view
    pub fn status_class(&self) -> &'static str {
        match self.status {
            200..=299 => "status-2xx",
            300..=399 => "status-3xx",
            400..=499 => "status-4xx",
            500.. => "status-5xx",
            _ => "",
        }
    }
}

/// Shared handle to a captured record
pub type SharedRecord = Arc<ExchangeRecord>;

fn extract_query_params(url: &Url) -> Option<QueryParams> {
    match url.query() {
        Some(query) if !query.is_empty() => {
            let params: QueryParams = crate::convert::query::parse_pairs(query)
                .into_iter()
                .map(|pair| (pair.key, Value::String(pair.value)))
                .collect();
            if params.is_empty() {
                None
            } else {
                Some(params)
            }
        }
        _ => None,
    }
}
