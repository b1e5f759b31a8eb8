//! "Copy as JSON" export

use super::curl::generate_curl;
use crate::models::{ExchangeRecord, Header};
use serde_json::{json, Map, Value};

/// Complete JSON view of one exchange. Bodies that parse as JSON are
/// embedded as structured values, anything else stays a string.
pub fn generate_json_export(record: &ExchangeRecord) -> Value {
    json!({
        "request": {
            "url": record.url,
            "method": record.method,
            "headers": header_map(&record.request_headers),
        },
        "payload": parse_or_text(record.request_body.as_deref()),
        "response": {
            "status": record.status,
            "headers": header_map(&record.response_headers),
            "body": parse_or_text(record.response_body.as_deref()),
        },
        "curl": generate_curl(record),
    })
}

// Repeated names keep the last value.
fn header_map(headers: &[Header]) -> Map<String, Value> {
    let mut map = Map::new();
    for header in headers {
        map.insert(header.name.clone(), Value::String(header.value.clone()));
    }
    map
}

fn parse_or_text(body: Option<&str>) -> Value {
    match body {
        None | Some("") => Value::Null,
        Some(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
    }
}
