//! Postman Collection v2.1 export

use super::query::{parse_pairs, raw_query, KeyValue};
use crate::models::ExchangeRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const POSTMAN_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanCollection {
    pub info: PostmanInfo,
    pub item: Vec<PostmanItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanInfo {
    pub name: String,
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanItem {
    pub name: String,
    pub request: PostmanRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanRequest {
    pub method: String,
    pub header: Vec<KeyValue>,
    pub url: PostmanUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<PostmanBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostmanUrl {
    pub raw: String,
    pub protocol: String,
    pub host: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<KeyValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PostmanBody {
    Raw {
        raw: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        options: Option<RawOptions>,
    },
    Urlencoded {
        urlencoded: Vec<KeyValue>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOptions {
    pub raw: RawLanguage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLanguage {
    pub language: String,
}

/// Single-request collection for `record`, named with the current time
pub fn generate_postman_collection(record: &ExchangeRecord) -> PostmanCollection {
    generate_postman_collection_at(record, Utc::now())
}

pub fn generate_postman_collection_at(
    record: &ExchangeRecord,
    now: DateTime<Utc>,
) -> PostmanCollection {
    let header = record
        .request_headers
        .iter()
        .map(|h| KeyValue {
            key: h.name.clone(),
            value: h.value.clone(),
        })
        .collect();

    let body = record
        .request_body
        .as_deref()
        .filter(|b| !b.is_empty())
        .map(|b| body_for(b, record.request_content_type().unwrap_or_default()));

    PostmanCollection {
        info: PostmanInfo {
            name: format!(
                "Echo Capture - {}",
                now.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            schema: POSTMAN_SCHEMA.to_string(),
        },
        item: vec![PostmanItem {
            name: item_name(&record.url),
            request: PostmanRequest {
                method: record.method.clone(),
                header,
                url: decompose_url(&record.url),
                body,
            },
        }],
    }
}

fn body_for(body: &str, content_type: &str) -> PostmanBody {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("application/json") {
        PostmanBody::Raw {
            raw: body.to_string(),
            options: Some(RawOptions {
                raw: RawLanguage {
                    language: "json".to_string(),
                },
            }),
        }
    } else if content_type.contains("application/x-www-form-urlencoded") {
        PostmanBody::Urlencoded {
            urlencoded: parse_pairs(body),
        }
    } else {
        PostmanBody::Raw {
            raw: body.to_string(),
            options: None,
        }
    }
}

/// Last path segment without its query, or `Request`
fn item_name(url: &str) -> String {
    url.split('?')
        .next()
        .and_then(|base| base.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("Request")
        .to_string()
}

/// Split the URL text as captured. Host case, escapes and `..` segments are
/// kept exactly as the page sent them.
fn decompose_url(url: &str) -> PostmanUrl {
    let query = raw_query(url)
        .map(parse_pairs)
        .filter(|pairs| !pairs.is_empty());

    let (protocol, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme.to_string(), rest),
        None => (
            url.split(':').next().unwrap_or_default().to_string(),
            url,
        ),
    };
    let without_query = rest.split(['?', '#']).next().unwrap_or_default();
    let mut parts = without_query.split('/');
    let authority = parts.next().unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            (host, Some(port.to_string()))
        }
        _ => (authority, None),
    };

    PostmanUrl {
        raw: url.to_string(),
        protocol,
        host: host.split('.').map(str::to_string).collect(),
        port,
        path: parts
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::record;
    use crate::models::Header;
    use serde_json::json;

    #[test]
    fn decomposes_url_into_host_path_and_query() {
        let rec = record("GET", "https://api.example.com/v1/users?x=1", 200);
        let collection = generate_postman_collection(&rec);
        let url = &collection.item[0].request.url;
        assert_eq!(url.protocol, "https");
        assert_eq!(url.host, vec!["api", "example", "com"]);
        assert_eq!(url.path, vec!["v1", "users"]);
        assert_eq!(
            url.query.as_deref(),
            Some(&[KeyValue { key: "x".into(), value: "1".into() }][..])
        );
        assert_eq!(collection.item[0].name, "users");
        assert_eq!(collection.info.schema, POSTMAN_SCHEMA);
        assert!(collection.info.name.starts_with("Echo Capture - "));
    }

    #[test]
    fn url_parts_come_from_raw_text() {
        let rec = record("GET", "https://API.Example.com:8443/a/%7Euser/../b?q=a+b", 200);
        let url = &generate_postman_collection(&rec).item[0].request.url;
        assert_eq!(url.host, vec!["API", "Example", "com"]);
        assert_eq!(url.port.as_deref(), Some("8443"));
        assert_eq!(url.path, vec!["a", "%7Euser", "..", "b"]);
        assert_eq!(
            url.query.as_deref(),
            Some(&[KeyValue { key: "q".into(), value: "a+b".into() }][..])
        );
        assert_eq!(url.raw, "https://API.Example.com:8443/a/%7Euser/../b?q=a+b");
    }

    #[test]
    fn json_body_gets_language_hint() {
        let mut rec = record("POST", "https://api.example.com/items", 201);
        rec.request_headers = vec![Header::new("Content-Type", "application/json; charset=utf-8")];
        rec.request_body = Some(r#"{"a":1}"#.into());
        let value = serde_json::to_value(generate_postman_collection(&rec)).expect("serializes");
        assert_eq!(
            value["item"][0]["request"]["body"],
            json!({"mode": "raw", "raw": "{\"a\":1}", "options": {"raw": {"language": "json"}}})
        );
        assert_eq!(
            value["item"][0]["request"]["header"],
            json!([{"key": "Content-Type", "value": "application/json; charset=utf-8"}])
        );
    }

    #[test]
    fn form_body_is_decoded() {
        let mut rec = record("POST", "https://example.com/login", 200);
        rec.request_headers = vec![Header::new(
            "content-type",
            "application/x-www-form-urlencoded",
        )];
        rec.request_body = Some("user=a%40b.com&note=hi%21".into());
        let value = serde_json::to_value(generate_postman_collection(&rec)).expect("serializes");
        assert_eq!(
            value["item"][0]["request"]["body"],
            json!({"mode": "urlencoded", "urlencoded": [
                {"key": "user", "value": "a@b.com"},
                {"key": "note", "value": "hi!"}
            ]})
        );
    }

    #[test]
    fn other_bodies_are_raw_without_hint() {
        let mut rec = record("PUT", "http://localhost:8080/", 200);
        rec.request_body = Some("plain".into());
        let collection = generate_postman_collection(&rec);
        let request = &collection.item[0].request;
        assert_eq!(
            request.body,
            Some(PostmanBody::Raw { raw: "plain".into(), options: None })
        );
        assert_eq!(request.url.port.as_deref(), Some("8080"));
        assert!(request.url.path.is_empty());
        assert!(request.url.query.is_none());
        assert_eq!(collection.item[0].name, "Request");
    }

    #[test]
    fn unparseable_urls_still_decompose() {
        let rec = record("GET", "weird://[bad/host/path?k=v", 200);
        let url = generate_postman_collection(&rec).item[0].request.url.clone();
        assert_eq!(url.protocol, "weird");
        assert_eq!(url.path, vec!["host", "path"]);
        assert_eq!(url.query.map(|q| q.len()), Some(1));
    }
}
