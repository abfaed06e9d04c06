//! Request URL to registry name.

use percent_encoding::percent_decode_str;

/// Strip the query string, percent-decode and drop leading slashes.
///
/// An empty result means the listing page.
pub fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/"), "");
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("/?sort=name"), "");
        assert_eq!(normalize_url("/app.js"), "app.js");
        assert_eq!(normalize_url("/app.js?v=3"), "app.js");
        assert_eq!(normalize_url("/My%20Page.html"), "My Page.html");
        assert_eq!(normalize_url("/what%3F.txt"), "what?.txt");
    }
}
