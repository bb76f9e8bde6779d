//! Query string parsing
//!
//! Keys may appear without a value (`?json`) and more than once; lookups
//! return the first occurrence.

use percent_encoding::percent_decode_str;

/// Parsed query parameters in request order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a raw query string (without the leading `?`)
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .unwrap_or_default()
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// First value recorded for `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode one form-encoded component (`+` is a space)
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Percent-decode a request path, `None` when it is not valid UTF-8
pub fn decode_path(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_without_value() {
        let params = QueryParams::parse(Some("json"));
        assert!(params.contains("json"));
        assert_eq!(params.first("json"), Some(""));
        assert!(!params.contains("hash"));
    }

    #[test]
    fn test_first_value_wins() {
        let params = QueryParams::parse(Some("json&hash=sha1&hash=md5"));
        assert_eq!(params.first("hash"), Some("sha1"));
    }

    #[test]
    fn test_empty_and_missing() {
        assert_eq!(QueryParams::parse(None), QueryParams::default());
        assert!(!QueryParams::parse(Some("")).contains(""));
        let params = QueryParams::parse(Some("json&&hash="));
        assert_eq!(params.first("hash"), Some(""));
    }

    #[test]
    fn test_decoding() {
        let params = QueryParams::parse(Some("hash=SHA%32%35%36&name=a+b"));
        assert_eq!(params.first("hash"), Some("SHA256"));
        assert_eq!(params.first("name"), Some("a b"));
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(
            decode_path("/my%20report%281%29.pdf").as_deref(),
            Some("/my report(1).pdf")
        );
        assert_eq!(decode_path("/plain.txt").as_deref(), Some("/plain.txt"));
        assert_eq!(decode_path("/bad%FF"), None);
    }
}
