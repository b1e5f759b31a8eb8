//! Size-bounded projection used by the dashboard viewer
//!
//! The projection travels inside a URL query string, so every string field
//! is capped. [`SerializationStrategy`] lists the projections the open
//! pipeline tries in order, from the full projection to the hard-capped one.

use super::{char_prefix, curl, is_json};
use crate::models::{ExchangeRecord, Header};
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};

/// Character thresholds for the full projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardLimits {
    pub max_field_chars: usize,
    /// JSON bodies may grow to `max_field_chars * json_multiplier`
    pub json_multiplier: usize,
    pub max_headers: usize,
    /// Longest base64 payload accepted for a viewer URL
    pub max_encoded_chars: usize,
}

impl Default for DashboardLimits {
    fn default() -> Self {
        Self {
            max_field_chars: 10_000_000,
            json_multiplier: 2,
            max_headers: 50,
            max_encoded_chars: 2_000_000,
        }
    }
}

/// Per-field caps applied when the full projection cannot be shipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackLimits {
    pub url: usize,
    pub header_value: usize,
    pub payload: usize,
    pub response_body: usize,
    pub curl: usize,
}

impl Default for FallbackLimits {
    fn default() -> Self {
        Self {
            url: 2000,
            header_value: 1000,
            payload: 100_000,
            response_body: 500_000,
            curl: 50_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub status: u16,
    pub headers: Vec<Header>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardProjection {
    pub request: DashboardRequest,
    pub payload: Option<String>,
    pub response: DashboardResponse,
    pub curl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DashboardProjection {
    /// Safe stand-in when the projection could not be built
    pub fn minimal(record: &ExchangeRecord, reason: &str) -> Self {
        Self {
            request: DashboardRequest {
                url: record.url.clone(),
                method: record.method.clone(),
                headers: Vec::new(),
            },
            payload: None,
            response: DashboardResponse {
                status: record.status,
                headers: Vec::new(),
                body: format!("Error generating dashboard format: {}", reason),
            },
            curl: curl::minimal_curl(record),
            error: Some(reason.to_string()),
        }
    }
}

/// Effective character limits for one projection. Capped stages take the
/// smaller of the full threshold and the fallback cap for each field.
struct FieldLimits<'a> {
    plain: usize,
    json: usize,
    caps: Option<&'a FallbackLimits>,
}

impl<'a> FieldLimits<'a> {
    fn new(limits: &DashboardLimits, caps: Option<&'a FallbackLimits>) -> Self {
        let plain = limits.max_field_chars;
        Self {
            plain,
            json: plain.saturating_mul(limits.json_multiplier.max(1)),
            caps,
        }
    }

    fn text(&self, text: &str) -> usize {
        if is_json(text) {
            self.json
        } else {
            self.plain
        }
    }

    fn capped(&self, full: usize, pick: impl Fn(&FallbackLimits) -> usize) -> usize {
        self.caps.map_or(full, |caps| full.min(pick(caps)))
    }
}

/// Project one record for the dashboard viewer. Never fails: internal errors
/// produce [`DashboardProjection::minimal`].
pub fn generate_dashboard_format(
    record: &ExchangeRecord,
    limits: &DashboardLimits,
) -> DashboardProjection {
    project_with(record, &FieldLimits::new(limits, None), limits.max_headers)
}

fn project_with(
    record: &ExchangeRecord,
    fields: &FieldLimits,
    max_headers: usize,
) -> DashboardProjection {
    match try_project(record, fields, max_headers) {
        Ok(projection) => projection,
        Err(err) => {
            tracing::warn!("Dashboard projection failed for {}: {}", record.url, err);
            DashboardProjection::minimal(record, &err.to_string())
        }
    }
}

fn try_project(
    record: &ExchangeRecord,
    fields: &FieldLimits,
    max_headers: usize,
) -> serde_json::Result<DashboardProjection> {
    let payload = match &record.query_params {
        Some(params) if record.method.eq_ignore_ascii_case("GET") && !params.is_empty() => {
            Some(serde_json::to_string(params)?)
        }
        _ => record.request_body.clone(),
    };
    let payload = payload.map(|p| {
        let limit = fields.capped(fields.text(&p), |c| c.payload);
        truncate_field(&p, limit).into_owned()
    });
    let body = record.response_body.as_deref().unwrap_or_default();
    let header_limit = fields.capped(fields.plain, |c| c.header_value);

    Ok(DashboardProjection {
        request: DashboardRequest {
            url: truncate_field(&record.url, fields.capped(fields.plain, |c| c.url)).into_owned(),
            method: record.method.clone(),
            headers: coerce_headers(&record.request_headers, max_headers, header_limit),
        },
        payload,
        response: DashboardResponse {
            status: record.status,
            headers: coerce_headers(&record.response_headers, max_headers, header_limit),
            body: truncate_field(body, fields.capped(fields.text(body), |c| c.response_body))
                .into_owned(),
        },
        curl: truncate_field(&curl::generate_curl(record), fields.capped(fields.plain, |c| c.curl))
            .into_owned(),
        error: None,
    })
}

fn coerce_headers(headers: &[Header], max_headers: usize, max_chars: usize) -> Vec<Header> {
    headers
        .iter()
        .take(max_headers)
        .map(|h| Header {
            name: h.name.clone(),
            value: truncate_field(&h.value, max_chars).into_owned(),
        })
        .collect()
}

/// Cut `value` to `max_chars` characters, appending a marker with the
/// original length. Values at or under the limit are borrowed unchanged.
pub fn truncate_field(value: &str, max_chars: usize) -> Cow<'_, str> {
    match char_prefix(value, max_chars) {
        (_, false) => Cow::Borrowed(value),
        (kept, true) => Cow::Owned(format!(
            "{}...[TRUNCATED - original length: {} chars]",
            kept,
            value.chars().count()
        )),
    }
}

/// One way of turning records into the viewer's JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationStrategy {
    Full,
    Capped(FallbackLimits),
}

impl SerializationStrategy {
    /// Strategies in the order the open pipeline attempts them
    pub fn fallback_chain() -> Vec<Self> {
        vec![Self::Full, Self::Capped(FallbackLimits::default())]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Capped(_) => "capped",
        }
    }

    pub fn project(&self, record: &ExchangeRecord, limits: &DashboardLimits) -> DashboardProjection {
        let caps = match self {
            Self::Full => None,
            Self::Capped(caps) => Some(caps),
        };
        project_with(record, &FieldLimits::new(limits, caps), limits.max_headers)
    }

    /// A single record serializes as an object, anything else as an array
    pub fn serialize<R: Borrow<ExchangeRecord>>(
        &self,
        records: &[R],
        limits: &DashboardLimits,
    ) -> serde_json::Result<String> {
        match records {
            [one] => serde_json::to_string(&self.project(one.borrow(), limits)),
            many => {
                let projections: Vec<_> = many
                    .iter()
                    .map(|r| self.project(r.borrow(), limits))
                    .collect();
                serde_json::to_string(&projections)
            }
        }
    }
}
