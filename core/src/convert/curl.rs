//! cURL command generation

use super::{char_prefix, pretty_json};
use crate::models::ExchangeRecord;
use std::borrow::Borrow;
use std::fmt::{self, Write as _};

/// Headers emitted per command
pub const MAX_CURL_HEADERS: usize = 20;
/// Headers with longer values are left out
pub const MAX_HEADER_VALUE_CHARS: usize = 1000;
/// Bodies longer than this are cut
pub const MAX_CURL_BODY_CHARS: usize = 10_000;
pub const TRUNCATED_MARKER: &str = "...[TRUNCATED]";

/// Render `record` as a multi-line cURL command.
///
/// Cookies and oversized header values are omitted, JSON bodies are
/// re-indented. Falls back to [`minimal_curl`] if rendering fails.
pub fn generate_curl(record: &ExchangeRecord) -> String {
    match render(record) {
        Ok(command) => command,
        Err(err) => {
            tracing::warn!("Falling back to minimal cURL for {}: {}", record.id, err);
            minimal_curl(record)
        }
    }
}

/// `curl -X METHOD 'url'` with no headers or body
pub fn minimal_curl(record: &ExchangeRecord) -> String {
    format!(
        "curl -X {} '{}'",
        record.method,
        escape_single_quotes(&record.url)
    )
}

/// "Copy all as cURL": one commented command per record
pub fn generate_curl_script<R: Borrow<ExchangeRecord>>(records: &[R]) -> String {
    records
        .iter()
        .map(|r| {
            let r = r.borrow();
            format!("# {} {}\n{}\n", r.method, r.url, generate_curl(r))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Close the quoted string, emit an escaped quote, reopen it
pub fn escape_single_quotes(value: &str) -> String {
    value.replace('\'', r"'\''")
}

fn render(record: &ExchangeRecord) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write!(
        out,
        "curl -X {} \\\n  '{}'",
        record.method,
        escape_single_quotes(&record.url)
    )?;

    let headers = record
        .request_headers
        .iter()
        .filter(|h| !h.name.eq_ignore_ascii_case("cookie"))
        .filter(|h| h.value.chars().count() <= MAX_HEADER_VALUE_CHARS)
        .take(MAX_CURL_HEADERS);
    for header in headers {
        write!(
            out,
            " \\\n  -H '{}: {}'",
            escape_single_quotes(&header.name),
            escape_single_quotes(&header.value)
        )?;
    }

    if let Some(body) = record.request_body.as_deref().filter(|b| !b.is_empty()) {
        let formatted = pretty_json(body).unwrap_or_else(|| body.to_string());
        let (kept, cut) = char_prefix(&formatted, MAX_CURL_BODY_CHARS);
        let mut data = escape_single_quotes(kept);
        if cut {
            data.push_str(TRUNCATED_MARKER);
        }
        write!(out, " \\\n  -d '{}'", data)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::record;
    use crate::models::Header;

    #[test]
    fn renders_method_url_headers_and_json_body() {
        let mut rec = record("POST", "https://api.example.com/items", 201);
        rec.request_headers = vec![
            Header::new("Content-Type", "application/json"),
            Header::new("Authorization", "Bearer abc"),
        ];
        rec.request_body = Some(r#"{"name":"widget"}"#.into());
        assert_eq!(
            generate_curl(&rec),
            "curl -X POST \\\n  'https://api.example.com/items' \\\n  -H 'Content-Type: application/json' \\\n  -H 'Authorization: Bearer abc' \\\n  -d '{\n  \"name\": \"widget\"\n}'"
        );
    }

    #[test]
    fn cookie_headers_never_appear() {
        let mut rec = record("GET", "https://example.com/", 200);
        rec.request_headers = vec![
            Header::new("Cookie", "session=1"),
            Header::new("COOKIE", "session=2"),
            Header::new("cookie", "session=3"),
            Header::new("Accept", "*/*"),
        ];
        let curl = generate_curl(&rec);
        assert!(!curl.to_lowercase().contains("cookie"));
        assert!(curl.contains("-H 'Accept: */*'"));
    }

    #[test]
    fn oversized_header_values_are_skipped_and_count_capped() {
        let mut rec = record("GET", "https://example.com/", 200);
        rec.request_headers.push(Header::new("X-Huge", "a".repeat(1001)));
        rec.request_headers.push(Header::new("X-Edge", "b".repeat(1000)));
        for i in 0..30 {
            rec.request_headers.push(Header::new(format!("X-{i}"), "v"));
        }
        let curl = generate_curl(&rec);
        assert!(!curl.contains("X-Huge"));
        assert!(curl.contains("X-Edge"));
        assert_eq!(curl.matches(" -H '").count(), MAX_CURL_HEADERS);
    }

    #[test]
    fn single_quotes_are_escaped() {
        let mut rec = record("POST", "https://example.com/it's", 200);
        rec.request_headers = vec![Header::new("X-Note", "don't")];
        rec.request_body = Some("it's plain".into());
        let curl = generate_curl(&rec);
        assert!(curl.contains(r"'https://example.com/it'\''s'"));
        assert!(curl.contains(r"-H 'X-Note: don'\''t'"));
        assert!(curl.ends_with(r"-d 'it'\''s plain'"));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let mut rec = record("POST", "https://test.org/", 200);
        rec.request_body = Some("x".repeat(MAX_CURL_BODY_CHARS + 5));
        let curl = generate_curl(&rec);
        assert!(curl.ends_with(&format!("{}{}'", "x".repeat(10), TRUNCATED_MARKER)));
        assert_eq!(curl.matches('x').count(), MAX_CURL_BODY_CHARS);
    }

    #[test]
    fn minimal_form_and_script() {
        let rec = record("DELETE", "https://example.com/a", 204);
        assert_eq!(minimal_curl(&rec), "curl -X DELETE 'https://example.com/a'");
        let script = generate_curl_script(&[rec.clone(), rec]);
        assert!(script.starts_with("# DELETE https://example.com/a\ncurl -X DELETE"));
        assert_eq!(script.matches("# DELETE").count(), 2);
    }
}
