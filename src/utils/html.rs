//! HTML utility functions.
//!
//! - `escape()`, `escape_attr()` - HTML entity escaping
//! - `is_raw_text_element()`, `find_close_tag()` - Raw-text element bodies
//! - `parse_attributes()`, `render_attributes()` - HTML attribute strings

use std::borrow::Cow;

// =============================================================================
// HTML Escaping
// =============================================================================

/// Characters that require HTML escaping.
const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

/// Get the HTML entity for a special character.
#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text content.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
pub fn escape(s: &str) -> Cow<'_, str> {
    escape_with(s, &ESCAPE_CHARS)
}

/// Escape HTML attribute values.
///
/// Identical to `escape()` but semantically indicates attribute context.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, &ESCAPE_CHARS)
}

#[inline]
fn escape_with<'a>(s: &'a str, chars: &[char]) -> Cow<'a, str> {
    if !s.contains(chars) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

// =============================================================================
// Element Classification
// =============================================================================

/// Check if a tag's body must be copied verbatim by text transforms.
///
/// `script` and `style` are raw text elements; `pre` and
/// `textarea` are whitespace-significant.
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "pre" | "textarea")
}

/// Position of `</name` (ASCII case-insensitive) at or after `from`, or the
/// end of input.
pub fn find_close_tag(bytes: &[u8], from: usize, name: &str) -> usize {
    let needle = format!("</{name}");
    let needle = needle.as_bytes();
    (from..bytes.len())
        .find(|&at| {
            bytes
                .get(at..at + needle.len())
                .is_some_and(|window| window.eq_ignore_ascii_case(needle))
        })
        .unwrap_or(bytes.len())
}

// =============================================================================
// Attribute Parsing
// =============================================================================

/// Parse HTML-style attributes from a string.
///
/// Input: `rel="stylesheet" href='a.css' defer`
/// Output: `vec![("rel", "stylesheet"), ("href", "a.css"), ("defer", "")]`
///
/// Attribute names are lowercased.
pub fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == '/' {
            continue;
        }

        // Read attribute name
        let mut name = String::new();
        name.push(c);
        while let Some(&next) = chars.peek() {
            if next == '=' || next.is_whitespace() {
                break;
            }
            name.push(next);
            chars.next();
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        if chars.peek() != Some(&'=') {
            // Boolean attribute (no value)
            attrs.push((name.to_ascii_lowercase(), String::new()));
            continue;
        }
        chars.next(); // consume '='

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                for c in chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    value.push(c);
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }

        attrs.push((name.to_ascii_lowercase(), value));
    }

    attrs
}

/// Find an attribute value by (lowercase) name.
pub fn attribute<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Render attributes back into tag syntax: ` name="value"`, or ` name` for
/// valueless ones.
pub fn render_attributes(attrs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape("hello world"), "hello world");
        assert!(matches!(escape("hello"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape("it's"), "it&#39;s");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("normal"), "normal");
        assert_eq!(escape_attr("a\"b&c"), "a&quot;b&amp;c");
    }

    #[test]
    fn test_raw_text_elements() {
        assert!(is_raw_text_element("script"));
        assert!(is_raw_text_element("style"));
        assert!(is_raw_text_element("pre"));
        assert!(!is_raw_text_element("div"));
    }

    #[test]
    fn test_find_close_tag() {
        let html = b"<script>a</b></SCRIPT>";
        assert_eq!(find_close_tag(html, 8, "script"), 13);
        assert_eq!(find_close_tag(html, 14, "script"), html.len());
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#"a="1" b='2' c=3 disabled"#);
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0], ("a".to_string(), "1".to_string()));
        assert_eq!(attrs[1], ("b".to_string(), "2".to_string()));
        assert_eq!(attrs[2], ("c".to_string(), "3".to_string()));
        assert_eq!(attrs[3], ("disabled".to_string(), "".to_string()));
    }

    #[test]
    fn test_parse_attributes_self_closing_and_case() {
        let attrs = parse_attributes(r#"REL="stylesheet" HREF = "a.css" /"#);
        assert_eq!(attribute(&attrs, "rel"), Some("stylesheet"));
        assert_eq!(attribute(&attrs, "href"), Some("a.css"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_render_attributes() {
        let attrs = parse_attributes(r#"type="module" defer data-x='a"b'"#);
        assert_eq!(
            render_attributes(&attrs),
            r#" type="module" defer data-x="a&quot;b""#
        );
        assert_eq!(render_attributes(&[]), "");
    }
}
