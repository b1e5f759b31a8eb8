//! Structural previews of JSON bodies
//!
//! Arrays collapse to one representative element so a body's shape can be
//! shared without its content.

use crate::models::{ExchangeRecord, Header};
use serde_json::{json, Map, Value};

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const MAX_DEPTH_MARKER: &str = "[max depth reached]";

/// Shape of `value`, collapsing every non-empty array to
/// `[schema(first), "... +N more items"]`.
///
/// Objects keep their key order. Containers found at `max_depth` or deeper
/// are replaced by [`MAX_DEPTH_MARKER`].
pub fn schema_of(value: &Value, max_depth: usize) -> Value {
    walk(value, 0, max_depth)
}

fn walk(value: &Value, depth: usize, max_depth: usize) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) if depth >= max_depth => {
            Value::String(MAX_DEPTH_MARKER.to_string())
        }
        Value::Array(items) => match items.first() {
            None => Value::Array(Vec::new()),
            Some(first) => Value::Array(vec![
                walk(first, depth + 1, max_depth),
                Value::String(format!("... +{} more items", items.len() - 1)),
            ]),
        },
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), walk(v, depth + 1, max_depth)))
                .collect::<Map<String, Value>>(),
        ),
        scalar => scalar.clone(),
    }
}

/// Redacted preview of one exchange: header names only, bodies reduced to
/// their schema.
pub fn create_schema_projection(record: &ExchangeRecord, max_depth: usize) -> Value {
    let header_names = |headers: &[Header]| -> Vec<String> {
        headers.iter().map(|h| h.name.clone()).collect()
    };
    json!({
        "url": record.url,
        "method": record.method,
        "status": record.status,
        "requestHeaders": header_names(&record.request_headers),
        "responseHeaders": header_names(&record.response_headers),
        "requestBody": body_schema(record.request_body.as_deref(), max_depth),
        "responseBody": body_schema(record.response_body.as_deref(), max_depth),
    })
}

fn body_schema(body: Option<&str>, max_depth: usize) -> Value {
    let Some(text) = body else {
        return Value::Null;
    };
    match serde_json::from_str::<Value>(text) {
        Ok(parsed) => schema_of(&parsed, max_depth),
        Err(_) => Value::String(format!("[non-JSON body: {} chars]", text.chars().count())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::record;

    #[test]
    fn arrays_collapse_to_first_element() {
        let value = json!({"a": [1, 2, 3]});
        assert_eq!(
            schema_of(&value, DEFAULT_MAX_DEPTH),
            json!({"a": [1, "... +2 more items"]})
        );
    }

    #[test]
    fn empty_array_is_kept() {
        let value = json!({"a": []});
        assert_eq!(schema_of(&value, DEFAULT_MAX_DEPTH), json!({"a": []}));
    }

    #[test]
    fn single_element_array_reports_zero_more() {
        let value = json!([{"id": 1}]);
        assert_eq!(
            schema_of(&value, DEFAULT_MAX_DEPTH),
            json!([{"id": 1}, "... +0 more items"])
        );
    }

    #[test]
    fn nested_arrays_collapse_recursively() {
        let value = json!({"rows": [[1, 2], [3]]});
        assert_eq!(
            schema_of(&value, DEFAULT_MAX_DEPTH),
            json!({"rows": [[1, "... +1 more items"], "... +1 more items"]})
        );
    }

    #[test]
    fn depth_limit_replaces_containers() {
        let value = json!({"a": {"b": {"c": 1}}, "flat": true});
        assert_eq!(
            schema_of(&value, 2),
            json!({"a": {"b": MAX_DEPTH_MARKER}, "flat": true})
        );
        assert_eq!(schema_of(&value, 0), json!(MAX_DEPTH_MARKER));
        assert_eq!(schema_of(&json!(7), 0), json!(7));
    }

    #[test]
    fn key_order_is_preserved() {
        let value: Value = serde_json::from_str(r#"{"z":1,"a":2,"m":3}"#).expect("json");
        let keys: Vec<String> = schema_of(&value, DEFAULT_MAX_DEPTH)
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn projection_redacts_headers_and_bodies() {
        let mut rec = record("POST", "https://api.example.com/items", 200);
        rec.request_headers = vec![Header::new("Authorization", "Bearer secret")];
        rec.request_body = Some("plain text".into());
        let rec = rec.with_response_body(Some(r#"{"items":[{"id":1},{"id":2}]}"#.into()));

        let projection = create_schema_projection(&rec, DEFAULT_MAX_DEPTH);
        assert_eq!(projection["requestHeaders"], json!(["Authorization"]));
        assert!(!projection.to_string().contains("secret"));
        assert_eq!(projection["requestBody"], "[non-JSON body: 10 chars]");
        assert_eq!(
            projection["responseBody"],
            json!({"items": [{"id": 1}, "... +1 more items"]})
        );
    }

    #[test]
    fn missing_body_is_null() {
        let rec = record("GET", "https://example.com/", 204);
        assert_eq!(create_schema_projection(&rec, 3)["responseBody"], Value::Null);
    }
}
