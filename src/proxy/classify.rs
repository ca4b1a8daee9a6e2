//! Direct-request classification

use super::upstream::DIRECT_PARAM;

/// A request is a direct resolution request when its query names a `direct`
/// parameter (value ignored) and its path ends with `.json`, case-insensitively.
pub fn is_direct_request(path: &str, query: Option<&str>) -> bool {
    let has_direct = query.is_some_and(|q| {
        url::form_urlencoded::parse(q.as_bytes()).any(|(key, _)| key == DIRECT_PARAM)
    });

    has_direct && path.to_ascii_lowercase().ends_with(".json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        assert!(is_direct_request("/java/metadata/ga/foo.json", Some("direct")));
        assert!(is_direct_request("/java/metadata/ga/foo.JSON", Some("direct")));
        assert!(is_direct_request("/metadata/foo.Json", Some("a=1&direct=0")));
        assert!(is_direct_request("/metadata/foo.json", Some("direct=")));
    }

    #[test]
    fn test_pass_through() {
        assert!(!is_direct_request("/metadata/foo.xml", Some("direct")));
        assert!(!is_direct_request("/metadata/foo.json", None));
        assert!(!is_direct_request("/metadata/foo.json", Some("")));
        assert!(!is_direct_request("/metadata/foo.json", Some("directly=1&indirect")));
        assert!(!is_direct_request("/metadata/foo.json.gz", Some("direct")));
    }
}
