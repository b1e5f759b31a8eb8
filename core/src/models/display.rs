//! URL rendering for the exchange list

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// How URLs are shown in the exchange list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlDisplayMode {
    /// Path and query, collapsing long paths to `host/.../last`
    #[default]
    Truncated,
    /// Host and path with the query reduced to `?…`
    Compact,
    /// Path with id-like segments replaced by `:id`
    SmartAbbreviated,
}

impl UrlDisplayMode {
    pub fn render(&self, url: &str) -> String {
        let Ok(parsed) = Url::parse(url) else {
            return url.to_string();
        };
        match self {
            UrlDisplayMode::Truncated => truncate_url(&parsed),
            UrlDisplayMode::Compact => compact_url(&parsed),
            UrlDisplayMode::SmartAbbreviated => smart_url(&parsed),
        }
    }
}

fn search_of(url: &Url) -> String {
    url.query().map(|q| format!("?{q}")).unwrap_or_default()
}

fn prefix_chars(value: &str, count: usize) -> &str {
    match value.char_indices().nth(count) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

fn truncate_url(url: &Url) -> String {
    let pathname = url.path();
    let search = search_of(url);
    let host = url.host_str().unwrap_or_default();

    if pathname.chars().count() + search.chars().count() < 50 {
        return format!("{pathname}{search}");
    }

    let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    let query = search.strip_prefix('?').unwrap_or_default();
    match segments.as_slice() {
        [] => {
            if search.is_empty() {
                "/".to_string()
            } else {
                format!("/?{}...", prefix_chars(query, 29))
            }
        }
        [only] => {
            if search.is_empty() {
                format!("/{only}")
            } else {
                format!("/{only}?{}...", prefix_chars(query, 19))
            }
        }
        [.., last] => {
            let truncated = format!("{host}/.../{last}");
            if search.chars().count() > 20 {
                format!("{truncated}{}...", prefix_chars(&search, 20))
            } else {
                format!("{truncated}{search}")
            }
        }
    }
}

fn compact_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let marker = if url.query().map(|q| !q.is_empty()).unwrap_or(false) {
        "?…"
    } else {
        ""
    };
    format!("{host}{}{marker}", url.path())
}

fn smart_url(url: &Url) -> String {
    let path = url
        .path()
        .split('/')
        .map(|segment| if looks_like_id(segment) { ":id" } else { segment })
        .collect::<Vec<_>>()
        .join("/");
    let search = search_of(url);
    if search.chars().count() > 20 {
        format!("{path}{}...", prefix_chars(&search, 20))
    } else {
        format!("{path}{search}")
    }
}

/// Numeric ids, UUIDs and long hex strings
fn looks_like_id(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    let is_uuid = segment.len() == 36
        && segment.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        });
    let is_long_hex = segment.len() >= 16 && segment.chars().all(|c| c.is_ascii_hexdigit());
    is_uuid || is_long_hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_urls_render_path_and_query() {
        assert_eq!(
            UrlDisplayMode::Truncated.render("https://example.com/api/users?x=1"),
            "/api/users?x=1"
        );
    }

    #[test]
    fn long_paths_collapse_to_last_segment() {
        let url = "https://example.com/api/v1/organisations/acme/projects/rocket/deployments/latest";
        assert_eq!(
            UrlDisplayMode::Truncated.render(url),
            "example.com/.../latest"
        );
        let with_query = format!("{url}?include=everything&expand=all");
        assert_eq!(
            UrlDisplayMode::Truncated.render(&with_query),
            "example.com/.../latest?include=everything&..."
        );
    }

    #[test]
    fn single_segment_keeps_short_query_preview() {
        let url = "https://example.com/search?query=a-very-long-search-term-that-goes-on-and-on";
        assert_eq!(
            UrlDisplayMode::Truncated.render(url),
            "/search?query=a-very-long-s..."
        );
    }

    #[test]
    fn compact_and_smart_modes() {
        let url = "https://example.com/users/42/orders/0f8fad5b-d9cb-469f-a165-70867728950e?full=1";
        assert_eq!(
            UrlDisplayMode::Compact.render(url),
            "example.com/users/42/orders/0f8fad5b-d9cb-469f-a165-70867728950e?…"
        );
        assert_eq!(
            UrlDisplayMode::SmartAbbreviated.render(url),
            "/users/:id/orders/:id?full=1"
        );
    }

    #[test]
    fn unparseable_urls_are_shown_verbatim() {
        assert_eq!(UrlDisplayMode::Compact.render("::nope"), "::nope");
    }
}
