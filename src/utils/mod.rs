//! Utility functions and helpers.

pub mod http;
pub mod log;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Canonical page identity: no query, no fragment, no trailing slash
/// (except for the root path).
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    let mut s = url.to_string();
    if url.path() != "/" && s.ends_with('/') {
        s.pop();
    }
    s
}

/// True for http(s) URLs sharing scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    matches!(a.scheme(), "http" | "https") && a.origin() == b.origin()
}

/// Last non-empty path segment, used as a fallback title.
pub fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.replace(['-', '_'], " "))
}
