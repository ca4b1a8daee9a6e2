//! Upstream URL mapping
//!
//! Everything up to and including the first `/metadata/` segment of the
//! inbound path is replaced by the configured upstream base.

use url::Url;

/// Path segment that splits the inbound path into an ignored prefix and the
/// part mapped onto the upstream
pub const METADATA_MARKER: &str = "/metadata/";

/// Query parameter requesting a redirect to the first archive in a document
pub const DIRECT_PARAM: &str = "direct";

/// Build the upstream URL for an inbound path, query and fragment.
///
/// Returns `None` when the path has no `/metadata/` segment. Only the first
/// occurrence of the marker is used as split point. Query and fragment are
/// carried over as given.
pub fn build_upstream_url(
    base: &Url,
    path: &str,
    query: Option<&str>,
    fragment: Option<&str>,
) -> Option<Url> {
    let idx = path.find(METADATA_MARKER)?;
    let rest = &path[idx + METADATA_MARKER.len()..];

    let mut url = base.clone();
    url.set_path(&format!("{}{rest}", base.path()));
    url.set_query(query);
    url.set_fragment(fragment);
    Some(url)
}

/// Remove every `direct` query parameter, keeping the remaining pairs in order
pub fn strip_direct_param(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != DIRECT_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://upstream.example/java-metadata/metadata/").unwrap()
    }

    #[test]
    fn test_missing_marker() {
        assert!(build_upstream_url(&base(), "/java/ga/linux.json", None, None).is_none());
        assert!(build_upstream_url(&base(), "/metadata", None, None).is_none());
        assert!(build_upstream_url(&base(), "/", Some("direct"), None).is_none());
    }

    #[test]
    fn test_rest_is_appended_to_base() {
        let url = build_upstream_url(&base(), "/java/metadata/ga/linux/x86_64/foo.json", None, None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://upstream.example/java-metadata/metadata/ga/linux/x86_64/foo.json"
        );
    }

    #[test]
    fn test_mount_at_root() {
        let url = build_upstream_url(&base(), "/metadata/all.json", None, None).unwrap();
        assert_eq!(url.as_str(), "https://upstream.example/java-metadata/metadata/all.json");
    }

    #[test]
    fn test_query_and_fragment_preserved() {
        let url = build_upstream_url(
            &base(),
            "/x/metadata/ga/foo.json",
            Some("a=1&direct&b=two"),
            Some("frag"),
        )
        .unwrap();
        assert_eq!(url.query(), Some("a=1&direct&b=two"));
        assert_eq!(url.fragment(), Some("frag"));
        assert_eq!(url.host_str(), Some("upstream.example"));
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_first_marker_wins() {
        let url = build_upstream_url(&base(), "/a/metadata/b/metadata/c.json", None, None).unwrap();
        assert_eq!(url.path(), "/java-metadata/metadata/b/metadata/c.json");
    }

    #[test]
    fn test_strip_direct_param() {
        let url = Url::parse("https://h/metadata/a.json?direct&x=1&direct=yes&y=2").unwrap();
        assert_eq!(strip_direct_param(&url).as_str(), "https://h/metadata/a.json?x=1&y=2");

        let only_direct = Url::parse("https://h/metadata/a.json?direct").unwrap();
        let stripped = strip_direct_param(&only_direct);
        assert_eq!(stripped.query(), None);
        assert_eq!(stripped.as_str(), "https://h/metadata/a.json");
    }
}
