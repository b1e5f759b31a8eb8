//! Filtering of captured exchanges
//!
//! Pure functions over a buffer snapshot. The resource-type predicate runs
//! first, then the domain predicate, then free-text search; all three must
//! match. Relative order of the input is always preserved.

use crate::models::{ExchangeRecord, ResourceType};
use reqwest::Url;
use std::borrow::Borrow;
use std::collections::HashMap;

/// Number of domain chips shown above the list
pub const DEFAULT_DOMAIN_TAGS: usize = 5;

/// Type facet selected in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceFilter {
    #[default]
    All,
    Failed,
    Slow,
    Type(ResourceType),
}

impl ResourceFilter {
    /// Parse a toolbar filter name: `all`, `failed`, `slow` or a resource type
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "all" => Some(ResourceFilter::All),
            "failed" => Some(ResourceFilter::Failed),
            "slow" => Some(ResourceFilter::Slow),
            other => ResourceType::from_filter_name(other).map(ResourceFilter::Type),
        }
    }

    fn matches(&self, record: &ExchangeRecord) -> bool {
        match self {
            ResourceFilter::All => true,
            ResourceFilter::Failed => record.failed,
            ResourceFilter::Slow => record.slow,
            ResourceFilter::Type(kind) => record.resource_type == *kind,
        }
    }
}

/// Transient filter selection; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub resource_filter: ResourceFilter,
    /// Exact-match domain
    pub domain_filter: Option<String>,
    /// Lower-cased search needle
    search_text: Option<String>,
}

impl FilterState {
    pub fn new(
        resource_filter: ResourceFilter,
        domain_filter: Option<String>,
        search_text: Option<&str>,
    ) -> Self {
        let mut state = Self {
            resource_filter,
            domain_filter,
            search_text: None,
        };
        state.set_search_text(search_text);
        state
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    /// Blank input clears the search
    pub fn set_search_text(&mut self, text: Option<&str>) {
        self.search_text = text
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
    }

    /// Select a domain chip; selecting the active chip clears it
    pub fn toggle_domain(&mut self, domain: &str) {
        if self.domain_filter.as_deref() == Some(domain) {
            self.domain_filter = None;
        } else {
            self.domain_filter = Some(domain.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resource_filter == ResourceFilter::All
            && self.domain_filter.is_none()
            && self.search_text.is_none()
    }

    pub fn matches(&self, record: &ExchangeRecord) -> bool {
        if !self.resource_filter.matches(record) {
            return false;
        }
        if let Some(domain) = &self.domain_filter {
            if &record.domain != domain {
                return false;
            }
        }
        if let Some(needle) = &self.search_text {
            return record.url.to_lowercase().contains(needle.as_str())
                || record.method.to_lowercase().contains(needle.as_str())
                || record.status.to_string().contains(needle.as_str())
                || record.domain.to_lowercase().contains(needle.as_str());
        }
        true
    }
}

/// Ordered subsequence of `records` matching `state`
pub fn filter<R>(records: &[R], state: &FilterState) -> Vec<R>
where
    R: Borrow<ExchangeRecord> + Clone,
{
    records
        .iter()
        .filter(|r| state.matches((*r).borrow()))
        .cloned()
        .collect()
}

/// Most frequent domains with their counts, highest first. Ties keep the order
/// in which domains were first seen.
pub fn domain_tags<R>(records: &[R], limit: usize) -> Vec<(String, usize)>
where
    R: Borrow<ExchangeRecord>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        let domain = record.borrow().domain.as_str();
        let count = counts.entry(domain).or_insert(0);
        if *count == 0 {
            order.push(domain);
        }
        *count += 1;
    }
    let mut tags: Vec<(String, usize)> = order
        .into_iter()
        .map(|d| (d.to_string(), counts[d]))
        .collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1));
    tags.truncate(limit);
    tags
}

/// Classify an exchange. The protocol-reported type wins, then the URL
/// extension, then the response Content-Type.
pub fn classify_resource_type(
    protocol_type: Option<&str>,
    url: &str,
    content_type: Option<&str>,
) -> ResourceType {
    if let Some(kind) = protocol_type.and_then(from_protocol_type) {
        return kind;
    }
    if let Some(kind) = url_extension(url).and_then(|ext| from_extension(&ext)) {
        return kind;
    }
    content_type
        .and_then(from_content_type)
        .unwrap_or(ResourceType::Other)
}

fn from_protocol_type(kind: &str) -> Option<ResourceType> {
    match kind.to_ascii_lowercase().as_str() {
        "xhr" | "fetch" => Some(ResourceType::Xhr),
        "script" => Some(ResourceType::Js),
        "stylesheet" => Some(ResourceType::Css),
        "image" => Some(ResourceType::Img),
        "document" => Some(ResourceType::Doc),
        _ => None,
    }
}

fn from_extension(ext: &str) -> Option<ResourceType> {
    match ext {
        "js" | "mjs" => Some(ResourceType::Js),
        "css" => Some(ResourceType::Css),
        "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "ico" => Some(ResourceType::Img),
        "html" | "htm" => Some(ResourceType::Doc),
        _ => None,
    }
}

fn from_content_type(content_type: &str) -> Option<ResourceType> {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("javascript") {
        Some(ResourceType::Js)
    } else if ct.contains("css") {
        Some(ResourceType::Css)
    } else if ct.contains("image/") {
        Some(ResourceType::Img)
    } else if ct.contains("html") {
        Some(ResourceType::Doc)
    } else if ct.contains("json") || ct.contains("xml") {
        Some(ResourceType::Xhr)
    } else {
        None
    }
}

/// Lower-cased extension of the last path segment, ignoring query and fragment
fn url_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}
