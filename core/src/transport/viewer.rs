//! Dashboard viewer URL codec
//!
//! `<viewer>?data=<base64>[&compressed=true]`. The payload is gzip-compressed
//! JSON; older links carry base64 of the plain UTF-8 JSON instead.

use super::compression::gunzip;
use crate::convert::char_prefix;
use crate::convert::query::{parse_pairs, percent_decode, raw_query};
use crate::error::EchoError;
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;

const MAX_LABEL_URL_CHARS: usize = 60;
const LABEL_URL_KEEP: usize = 57;

/// What the viewer shows for a decoded payload
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerState {
    Empty,
    Single(Value),
    Multiple {
        exchanges: Vec<Value>,
        labels: Vec<String>,
        selected: usize,
    },
}

impl ViewerState {
    pub fn from_document(document: Value) -> Self {
        match document {
            Value::Array(mut items) => match items.len() {
                0 => Self::Empty,
                1 => Self::Single(items.remove(0)),
                _ => Self::Multiple {
                    labels: items.iter().map(selector_label).collect(),
                    exchanges: items,
                    selected: 0,
                },
            },
            single => Self::Single(single),
        }
    }

    /// The exchange currently on screen
    pub fn current(&self) -> Option<&Value> {
        match self {
            Self::Empty => None,
            Self::Single(value) => Some(value),
            Self::Multiple {
                exchanges,
                selected,
                ..
            } => exchanges.get(*selected),
        }
    }

    pub fn labels(&self) -> &[String] {
        match self {
            Self::Multiple { labels, .. } => labels,
            _ => &[],
        }
    }

    /// Switch the selector; false when out of range or there is no selector
    pub fn select(&mut self, index: usize) -> bool {
        match self {
            Self::Multiple {
                exchanges,
                selected,
                ..
            } if index < exchanges.len() => {
                *selected = index;
                true
            }
            _ => false,
        }
    }
}

/// `METHOD url (status)` with the url cut to 57 chars past 60
pub fn selector_label(exchange: &Value) -> String {
    let method = exchange["request"]["method"]
        .as_str()
        .filter(|m| !m.is_empty())
        .unwrap_or("UNKNOWN");
    let url = exchange["request"]["url"]
        .as_str()
        .filter(|u| !u.is_empty())
        .unwrap_or("No URL");
    let status = match &exchange["response"]["status"] {
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::String(s) if !s.is_empty() => s.clone(),
        _ => "???".to_string(),
    };
    let display_url = if url.chars().count() > MAX_LABEL_URL_CHARS {
        format!("{}...", char_prefix(url, LABEL_URL_KEEP).0)
    } else {
        url.to_string()
    };
    format!("{} {} ({})", method, display_url, status)
}

/// Append the payload to `base` as the `data` query parameter
pub fn build_viewer_url(base: &str, data: &str, compressed: bool) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    let mut url = format!("{}{}data={}", base, separator, encode_component(data));
    if compressed {
        url.push_str("&compressed=true");
    }
    url
}

// Base64 only needs its three reserved characters escaped.
fn encode_component(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    for c in data.chars() {
        match c {
            '+' => out.push_str("%2B"),
            '/' => out.push_str("%2F"),
            '=' => out.push_str("%3D"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}

/// Pull the raw `data` value out of a viewer URL. Input without a query
/// string is taken to be the payload itself.
pub fn extract_data_param(input: &str) -> Option<String> {
    let input = input.trim();
    let value = match raw_query(input) {
        Some(query) => parse_pairs(query)
            .into_iter()
            .find(|kv| kv.key == "data")
            .map(|kv| kv.value)?,
        None if input.contains("://") => return None,
        None => percent_decode(input),
    };
    // Unencoded links arrive with '+' turned into spaces.
    Some(value.replace(' ', "+"))
}

/// Decode a `data` payload into the JSON document it carries
pub fn decode_viewer_payload(data: &str) -> Result<Value, EchoError> {
    let bytes = general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| EchoError::ViewerDecode(format!("invalid base64: {}", e)))?;

    let json = match gunzip(&bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!("Payload is not gzip ({}), trying legacy encoding", err);
            String::from_utf8(bytes)
                .map_err(|e| EchoError::ViewerDecode(format!("legacy payload is not UTF-8: {}", e)))?
        }
    };

    serde_json::from_str(&json).map_err(|e| EchoError::ViewerDecode(format!("invalid JSON: {}", e)))
}

pub fn decode_viewer_url(input: &str) -> Result<ViewerState, EchoError> {
    let data = extract_data_param(input)
        .ok_or_else(|| EchoError::ViewerDecode("no data parameter".to_string()))?;
    decode_viewer_payload(&data).map(ViewerState::from_document)
}

#[cfg(test)]
mod tests {
    use super::super::compression::gzip;
    use super::*;
    use serde_json::json;

    fn compressed_url(document: &Value) -> String {
        let packed = gzip(document.to_string().as_bytes()).expect("gzip");
        build_viewer_url(
            "dashboard.html",
            &general_purpose::STANDARD.encode(packed),
            true,
        )
    }

    fn exchange(method: &str, url: &str, status: u16) -> Value {
        json!({"request": {"url": url, "method": method, "headers": []},
               "payload": null,
               "response": {"status": status, "headers": [], "body": ""},
               "curl": ""})
    }

    #[test]
    fn empty_array_shows_empty_state() {
        let state = decode_viewer_url(&compressed_url(&json!([]))).expect("decodes");
        assert_eq!(state, ViewerState::Empty);
        assert!(state.current().is_none());
    }

    #[test]
    fn single_element_array_has_no_selector() {
        let only = exchange("GET", "https://example.com/", 200);
        let state = decode_viewer_url(&compressed_url(&json!([only.clone()]))).expect("decodes");
        assert_eq!(state, ViewerState::Single(only));
        assert!(state.labels().is_empty());
    }

    #[test]
    fn bare_object_is_single() {
        let only = exchange("POST", "https://example.com/a", 201);
        let state = decode_viewer_url(&compressed_url(&only)).expect("decodes");
        assert_eq!(state.current(), Some(&only));
    }

    #[test]
    fn many_elements_expose_selector() {
        let long_url = format!("https://example.com/{}", "x".repeat(80));
        let document = json!([
            exchange("GET", "https://example.com/a", 200),
            exchange("DELETE", &long_url, 404),
            json!({"request": {}, "response": {}}),
        ]);
        let mut state = decode_viewer_url(&compressed_url(&document)).expect("decodes");
        assert_eq!(state.labels()[0], "GET https://example.com/a (200)");
        assert_eq!(
            state.labels()[1],
            format!("DELETE {}... (404)", &long_url[..57])
        );
        assert_eq!(state.labels()[2], "UNKNOWN No URL (???)");
        assert_eq!(state.current(), Some(&document[0]));
        assert!(state.select(1));
        assert_eq!(state.current(), Some(&document[1]));
        assert!(!state.select(3));
    }

    #[test]
    fn legacy_uncompressed_payload_still_decodes() {
        let document = json!([exchange("GET", "https://example.com/ü", 200)]);
        let data = general_purpose::STANDARD.encode(document.to_string());
        let url = format!("http://localhost:8081/index2.html?data={}", data);
        let state = decode_viewer_url(&url).expect("decodes");
        assert_eq!(state.current(), Some(&document[0]));
    }

    #[test]
    fn spaces_are_restored_to_plus() {
        let packed = gzip(b"[1]").expect("gzip");
        let data = general_purpose::STANDARD.encode(packed);
        let mangled = format!("?data={}", data.replace('+', " "));
        assert_eq!(extract_data_param(&mangled), Some(data));
    }

    #[test]
    fn build_url_escapes_base64() {
        let url = build_viewer_url("http://localhost:8081/index2.html", "a+b/c==", false);
        assert_eq!(url, "http://localhost:8081/index2.html?data=a%2Bb%2Fc%3D%3D");
        assert_eq!(extract_data_param(&url).as_deref(), Some("a+b/c=="));
    }

    #[test]
    fn garbage_reports_decode_error() {
        assert!(matches!(
            decode_viewer_payload("!!!not base64"),
            Err(EchoError::ViewerDecode(_))
        ));
        assert!(decode_viewer_url("https://example.com/no-data").is_err());
    }
}
