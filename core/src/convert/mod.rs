//! Format converters
//!
//! Stateless transformations from one captured exchange (or a list of them)
//! into shareable representations. None of these functions fail on a
//! well-formed record: malformed bodies or URLs degrade to verbatim text.

pub mod curl;
pub mod dashboard;
pub mod har;
pub mod json;
pub mod postman;
pub mod query;
pub mod schema;

pub use curl::{generate_curl, generate_curl_script, minimal_curl};
pub use dashboard::{
    generate_dashboard_format, DashboardLimits, DashboardProjection, FallbackLimits,
    SerializationStrategy,
};
pub use har::{export_har_to_path, generate_har, har_filename, HarDocument};
pub use json::generate_json_export;
pub use postman::{generate_postman_collection, PostmanCollection};
pub use schema::{create_schema_projection, schema_of, DEFAULT_MAX_DEPTH};

/// Split `value` after `max` characters. Returns the kept prefix and whether
/// anything was cut.
pub(crate) fn char_prefix(value: &str, max: usize) -> (&str, bool) {
    match value.char_indices().nth(max) {
        Some((idx, _)) => (&value[..idx], true),
        None => (value, false),
    }
}

/// Re-indent a JSON document with two spaces, or `None` if it is not JSON
pub(crate) fn pretty_json(text: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
}

pub(crate) fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}
