//! Splitting HTML items into head and body content.
//!
//! Full documents lose their `<!DOCTYPE>`, `<html>`, `<head>` and `<body>`
//! wrappers but keep everything inside them; fragments pass through
//! untouched. Tag searches run on a masked copy of the item in which
//! comments and raw-text element bodies are blanked, so markup-looking text
//! inside a script string or a comment is never taken for structure.

use std::ops::Range;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

use crate::registry::ContentKind;
use crate::utils::html::{attribute, find_close_tag, is_raw_text_element, parse_attributes};

static RE_DOCUMENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:!doctype|html|head|body)\b").unwrap());
static RE_HEAD_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head\s*>").unwrap());
static RE_BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body\b[^>]*>").unwrap());
static RE_BODY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").unwrap());
static RE_WRAPPER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<!doctype[^>]*>|</?html\b[^>]*>|</?head\b[^>]*>|</?body\b[^>]*>").unwrap()
});
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title\s*>").unwrap());
static RE_META: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<meta\b([^>]*)>").unwrap());
static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<link\b([^>]*)>").unwrap());
static RE_SCRIPT_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>\s*</script\s*>").unwrap());

/// Registry CSS/JS items an HTML item may reference, keyed by lowercased name.
pub type Targets = FxHashMap<String, ContentKind>;

/// Attributes of the first tag referencing each target, keyed like `Targets`.
pub type References = FxHashMap<String, Vec<(String, String)>>;

/// An HTML item after wrapper stripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlParts {
    /// Head content to hoist; `None` for fragments.
    pub head: Option<String>,
    pub body: String,
}

/// Split an HTML item into hoisted head content and body content.
pub fn split(html: &str) -> HtmlParts {
    let masked = mask_raw_text(html);
    if !RE_DOCUMENT_MARKER.is_match(&masked) {
        return HtmlParts {
            head: None,
            body: html.to_string(),
        };
    }

    let Some(open) = RE_BODY_OPEN.find(&masked) else {
        return split_without_body(html, &masked);
    };

    // Last close tag; anything after it is still body content.
    let close = RE_BODY_CLOSE
        .find_iter(&masked[open.end()..])
        .last()
        .map_or(html.len(), |m| open.end() + m.start());

    // Everything before `<body>` is head content: an omitted `<head>` tag or
    // elements between `</head>` and `<body>` still end up in the head.
    let head = without_wrappers(html, &masked, 0..open.start());
    let mut body = html[open.end()..close].to_string();
    let tail = without_wrappers(html, &masked, close..html.len());
    body.push_str(tail.trim());

    HtmlParts {
        head: Some(clean_head(&head)),
        body,
    }
}

/// A document with no `<body>` tag: the `<head>` element is hoisted and the
/// rest, minus wrappers, is body.
fn split_without_body(html: &str, masked: &str) -> HtmlParts {
    let mut cuts = Vec::new();
    let head = RE_HEAD_ELEMENT.captures(masked).and_then(|caps| {
        let (whole, inner) = (caps.get(0)?, caps.get(1)?);
        cuts.push(whole.range());
        Some(clean_head(&html[inner.range()]))
    });
    cuts.extend(RE_WRAPPER_TAG.find_iter(masked).map(|m| m.range()));
    cuts.sort_by_key(|cut| cut.start);

    HtmlParts {
        head,
        body: copy_except(html, 0..html.len(), cuts),
    }
}

/// `html[range]` with the wrapper tags found in `masked[range]` removed.
fn without_wrappers(html: &str, masked: &str, range: Range<usize>) -> String {
    let offset = range.start;
    let cuts = RE_WRAPPER_TAG
        .find_iter(&masked[range.clone()])
        .map(|m| m.start() + offset..m.end() + offset)
        .collect::<Vec<_>>();
    copy_except(html, range, cuts)
}

/// Copy `html[range]` minus `cuts`, which are sorted by start and may overlap.
fn copy_except(html: &str, range: Range<usize>, cuts: Vec<Range<usize>>) -> String {
    let mut out = String::with_capacity(range.len());
    let mut cursor = range.start;
    for cut in cuts {
        if cut.end <= cursor {
            continue;
        }
        out.push_str(&html[cursor..cut.start.max(cursor)]);
        cursor = cut.end;
    }
    if cursor < range.end {
        out.push_str(&html[cursor..range.end]);
    }
    out
}

/// Copy of `html` with comments and raw-text element bodies blanked to
/// spaces. Byte offsets match the input.
fn mask_raw_text(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut masked = bytes.to_vec();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if bytes[i..].starts_with(b"<!--") {
            let end = html[i + 4..]
                .find("-->")
                .map_or(bytes.len(), |pos| i + 4 + pos + 3);
            masked[i..end].fill(b' ');
            i = end;
            continue;
        }

        let name_end = (i + 1..bytes.len())
            .find(|&at| !bytes[at].is_ascii_alphanumeric())
            .unwrap_or(bytes.len());
        let name = html[i + 1..name_end].to_ascii_lowercase();
        if !is_raw_text_element(&name) {
            i += 1;
            continue;
        }
        let Some(open_end) = bytes[name_end..]
            .iter()
            .position(|&b| b == b'>')
            .map(|pos| name_end + pos + 1)
        else {
            break;
        };
        let close = find_close_tag(bytes, open_end, &name);
        masked[open_end..close].fill(b' ');
        i = close;
    }

    // Blanked ranges start and end on ASCII bytes, so this never replaces.
    String::from_utf8_lossy(&masked).into_owned()
}

/// Drop what the combined skeleton already provides.
fn clean_head(head: &str) -> String {
    let head = RE_TITLE.replace_all(head, "");
    RE_META
        .replace_all(&head, |caps: &Captures| {
            let attrs = parse_attributes(&caps[1]);
            let is_charset = attribute(&attrs, "charset").is_some()
                || attribute(&attrs, "http-equiv")
                    .is_some_and(|v| v.eq_ignore_ascii_case("content-type"));
            let is_viewport =
                attribute(&attrs, "name").is_some_and(|v| v.eq_ignore_ascii_case("viewport"));
            if is_charset || is_viewport {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Remove `<link rel=stylesheet>` and `<script src>` tags pointing at
/// `targets`, recording each target's first tag attributes in `found`.
pub fn strip_references(html: &str, targets: &Targets, found: &mut References) -> String {
    rewrite_references(html, targets, found, true)
}

/// Record the tags pointing at `targets` without touching them.
pub fn find_references(html: &str, targets: &Targets, found: &mut References) {
    rewrite_references(html, targets, found, false);
}

fn rewrite_references(
    html: &str,
    targets: &Targets,
    found: &mut References,
    remove: bool,
) -> String {
    if targets.is_empty() {
        return html.to_string();
    }

    let mut visit = |tag: &str, attrs: Vec<(String, String)>, key: Option<String>| match key {
        Some(key) => {
            found.entry(key).or_insert(attrs);
            if remove { String::new() } else { tag.to_string() }
        }
        None => tag.to_string(),
    };

    let html = RE_LINK.replace_all(html, |caps: &Captures| {
        let attrs = parse_attributes(&caps[1]);
        let is_stylesheet = attribute(&attrs, "rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        });
        let key = attribute(&attrs, "href")
            .filter(|_| is_stylesheet)
            .map(normalize_reference)
            .filter(|key| targets.get(key) == Some(&ContentKind::Css));
        visit(&caps[0], attrs, key)
    });

    RE_SCRIPT_SRC
        .replace_all(&html, |caps: &Captures| {
            let attrs = parse_attributes(&caps[1]);
            let key = attribute(&attrs, "src")
                .map(normalize_reference)
                .filter(|key| targets.get(key) == Some(&ContentKind::Js));
            visit(&caps[0], attrs, key)
        })
        .into_owned()
}

/// Attributes of a stylesheet `<link>` that keep their meaning on `<style>`.
pub fn style_attributes(attrs: &[(String, String)]) -> Vec<(String, String)> {
    attrs
        .iter()
        .filter(|(name, _)| {
            matches!(
                name.as_str(),
                "media" | "title" | "nonce" | "blocking" | "id" | "class"
            )
        })
        .cloned()
        .collect()
}

/// Attributes of a `<script src>` kept once its body is inlined.
pub fn script_attributes(attrs: &[(String, String)]) -> Vec<(String, String)> {
    attrs
        .iter()
        .filter(|(name, _)| {
            !matches!(
                name.as_str(),
                "src" | "integrity" | "crossorigin" | "referrerpolicy" | "fetchpriority"
            )
        })
        .cloned()
        .collect()
}

/// Whether a script's `type` makes its body JavaScript (classic or module).
pub fn is_javascript(attrs: &[(String, String)]) -> bool {
    match attribute(attrs, "type").map(str::trim) {
        None | Some("") => true,
        Some(kind) => {
            let kind = kind.to_ascii_lowercase();
            kind == "module" || kind.contains("javascript") || kind.contains("ecmascript")
        }
    }
}

/// `type="module"`
pub fn is_module(attrs: &[(String, String)]) -> bool {
    attribute(attrs, "type").is_some_and(|kind| kind.trim().eq_ignore_ascii_case("module"))
}

/// `./Style.css?v=2` -> `style.css`
fn normalize_reference(value: &str) -> String {
    let value = value.trim();
    let value = value.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(value).decode_utf8_lossy();
    decoded
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_lowercase()
}

/// Rewrite `</tag` as `<\/tag` (ASCII case-insensitive) so an inline body
/// cannot close its own element.
pub fn neutralize_close_tag(body: &str, tag: &str) -> String {
    let needle = format!("</{tag}");
    let needle = needle.as_bytes();
    let bytes = body.as_bytes();

    let mut out = String::with_capacity(body.len());
    let mut copied = 0;
    let mut i = 0;
    while i + needle.len() <= bytes.len() {
        if bytes[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            out.push_str(&body[copied..=i]);
            out.push('\\');
            copied = i + 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    out.push_str(&body[copied..]);
    out
}
