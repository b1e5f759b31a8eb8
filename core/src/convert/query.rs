//! Query-string and form-body decoding

use serde::{Deserialize, Serialize};

/// Key/value pair in the shape Postman expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Split `a=1&b=2` into decoded pairs. Empty segments are skipped and a
/// missing `=` yields an empty value.
pub fn parse_pairs(query: &str) -> Vec<KeyValue> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            KeyValue {
                key: percent_decode(key),
                value: percent_decode(value),
            }
        })
        .collect()
}

/// Raw query string of `url` without the leading `?` or any fragment
pub fn raw_query(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once('?')?;
    let query = rest.split('#').next().unwrap_or_default();
    Some(query)
}

/// Decode `%XX` escapes. Invalid escapes are kept verbatim and `+` is left
/// alone; the decoded bytes are read as UTF-8, lossily.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                output.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&output).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
