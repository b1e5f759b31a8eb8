//! HTTP Archive (HAR 1.2) export
//!
//! The full-fidelity path: headers and bodies are passed through untouched.

use super::query::{parse_pairs, raw_query};
use crate::models::{ExchangeRecord, Header};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::path::{Path, PathBuf};

const HAR_VERSION: &str = "1.2";
const CREATOR_NAME: &str = "Echo DevTools Extension";
const CREATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
const HTTP_VERSION: &str = "HTTP/1.1";
const DEFAULT_MIME_TYPE: &str = "text/plain";

#[derive(Debug, Serialize)]
pub struct HarDocument {
    pub log: HarLog,
}

#[derive(Debug, Serialize)]
pub struct HarLog {
    pub version: &'static str,
    pub creator: HarCreator,
    pub entries: Vec<HarEntry>,
}

#[derive(Debug, Serialize)]
pub struct HarCreator {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarEntry {
    pub started_date_time: String,
    pub time: f64,
    pub request: HarRequest,
    pub response: HarResponse,
    pub cache: Map<String, Value>,
    pub timings: HarTimings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarRequest {
    pub method: String,
    pub url: String,
    pub http_version: &'static str,
    pub headers: Vec<Header>,
    pub query_string: Vec<HarNameValue>,
    pub cookies: Vec<Value>,
    pub headers_size: i64,
    pub body_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<HarPostData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarResponse {
    pub status: u16,
    pub status_text: String,
    pub http_version: &'static str,
    pub headers: Vec<Header>,
    pub cookies: Vec<Value>,
    pub content: HarContent,
    #[serde(rename = "redirectURL")]
    pub redirect_url: String,
    pub headers_size: i64,
    pub body_size: i64,
}

#[derive(Debug, Serialize)]
pub struct HarNameValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarPostData {
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarContent {
    pub size: u64,
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct HarTimings {
    pub send: f64,
    pub wait: f64,
    pub receive: f64,
}

/// Build a HAR document with one entry per record, in buffer order
pub fn generate_har<R: Borrow<ExchangeRecord>>(records: &[R]) -> HarDocument {
    HarDocument {
        log: HarLog {
            version: HAR_VERSION,
            creator: HarCreator {
                name: CREATOR_NAME,
                version: CREATOR_VERSION,
            },
            entries: records.iter().map(|r| HarEntry::from(r.borrow())).collect(),
        },
    }
}

/// `echo-har-<ISO8601>.har`
pub fn har_filename(now: DateTime<Utc>) -> String {
    format!(
        "echo-har-{}.har",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Write a HAR export for `records` into `dir`, returning the file path
pub async fn export_har_to_path<R: Borrow<ExchangeRecord>>(
    records: &[R],
    dir: impl AsRef<Path>,
) -> anyhow::Result<PathBuf> {
    let document = generate_har(records);
    let json = serde_json::to_string_pretty(&document).context("serializing HAR log")?;
    let path = dir.as_ref().join(har_filename(Utc::now()));
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("writing HAR file {:?}", path))?;
    tracing::info!(
        "Exported {} exchanges to {}",
        document.log.entries.len(),
        path.display()
    );
    Ok(path)
}

impl From<&ExchangeRecord> for HarEntry {
    fn from(record: &ExchangeRecord) -> Self {
        let started_date_time = Utc
            .timestamp_millis_opt(record.start_time)
            .single()
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            started_date_time,
            time: record.duration,
            request: HarRequest::from(record),
            response: HarResponse::from(record),
            cache: Map::new(),
            timings: HarTimings {
                send: 0.0,
                wait: record.duration,
                receive: 0.0,
            },
        }
    }
}

impl From<&ExchangeRecord> for HarRequest {
    fn from(record: &ExchangeRecord) -> Self {
        let query_string = raw_query(&record.url)
            .map(parse_pairs)
            .unwrap_or_default()
            .into_iter()
            .map(|kv| HarNameValue {
                name: kv.key,
                value: kv.value,
            })
            .collect();
        let post_data = record.request_body.as_ref().map(|text| HarPostData {
            mime_type: record
                .request_content_type()
                .unwrap_or(DEFAULT_MIME_TYPE)
                .to_string(),
            text: text.clone(),
        });
        Self {
            method: record.method.clone(),
            url: record.url.clone(),
            http_version: HTTP_VERSION,
            headers: record.request_headers.clone(),
            query_string,
            cookies: Vec::new(),
            headers_size: -1,
            body_size: record
                .request_body
                .as_ref()
                .map(|b| b.len() as i64)
                .unwrap_or(0),
            post_data,
        }
    }
}

impl From<&ExchangeRecord> for HarResponse {
    fn from(record: &ExchangeRecord) -> Self {
        Self {
            status: record.status,
            status_text: String::new(),
            http_version: HTTP_VERSION,
            headers: record.response_headers.clone(),
            cookies: Vec::new(),
            content: HarContent {
                size: record.size_bytes,
                mime_type: record
                    .response_content_type()
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_string(),
                text: record.response_body.clone().unwrap_or_default(),
            },
            redirect_url: String::new(),
            headers_size: -1,
            body_size: record.size_bytes as i64,
        }
    }
}
