//! Minification for the combined document.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Both print without
//! renaming anything; a parse failure leaves the caller's text untouched.
//! The final document goes through a whitespace pass that never edits the
//! bodies of raw-text elements or comments.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::utils::html::{find_close_tag, is_raw_text_element};

/// Strip whitespace and comments from a classic script or an ES module.
pub fn minify_js(source: &str, module: bool) -> Option<String> {
    let allocator = Allocator::default();
    let source_type = if module {
        SourceType::mjs()
    } else {
        SourceType::cjs()
    };
    let ret = Parser::new(&allocator, source, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .build(&ret.program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Collapse insignificant whitespace in an HTML document.
///
/// - whitespace-only runs between tags that contain a line break are dropped
/// - other whitespace runs outside tags become one space
/// - whitespace inside a tag collapses to one space, except in quoted values
/// - comments and `script`/`style`/`pre`/`textarea` bodies are copied as-is
pub fn minify_html(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'<' && html[i..].starts_with("<!--") {
            let end = html[i + 4..]
                .find("-->")
                .map_or(bytes.len(), |pos| i + 4 + pos + 3);
            out.push_str(&html[i..end]);
            i = end;
        } else if b == b'<' && is_tag_start(bytes, i) {
            let (end, name) = copy_tag(html, i, &mut out);
            i = end;
            if let Some(name) = name.filter(|name| is_raw_text_element(name)) {
                let close = find_close_tag(bytes, i, &name);
                out.push_str(&html[i..close]);
                i = close;
            }
        } else if b.is_ascii_whitespace() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let after_tag = start == 0 || bytes[start - 1] == b'>';
            let before_tag = i == bytes.len() || bytes[i] == b'<';
            let has_newline = bytes[start..i].contains(&b'\n');
            if !(after_tag && before_tag && has_newline) {
                out.push(' ');
            }
        } else {
            // Text up to the next tag or whitespace. Always advance past the
            // first byte so a stray `<` cannot stall the loop.
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] != b'<' && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            out.push_str(&html[start..i]);
        }
    }

    out
}

/// `<a`, `</a`, `<!doctype`
fn is_tag_start(bytes: &[u8], at: usize) -> bool {
    bytes
        .get(at + 1)
        .is_some_and(|&next| next.is_ascii_alphabetic() || next == b'/' || next == b'!')
}

/// Copy one tag starting at `start`, collapsing whitespace outside quotes.
///
/// Returns the index after the tag and, for opening tags, the lowercased name.
fn copy_tag(html: &str, start: usize, out: &mut String) -> (usize, Option<String>) {
    let bytes = html.as_bytes();
    let mut i = start + 1;

    let opening = bytes[i].is_ascii_alphabetic();
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    let name = opening.then(|| html[start + 1..i].to_ascii_lowercase());

    let mut copied = start;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                out.push_str(&html[copied..=i]);
                return (i + 1, name);
            }
            None if b.is_ascii_whitespace() => {
                out.push_str(&html[copied..i]);
                out.push(' ');
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                copied = i;
                continue;
            }
            None => {}
        }
        i += 1;
    }

    out.push_str(&html[copied..]);
    (bytes.len(), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_css() {
        assert_eq!(minify_css("a {\n  color: red;\n}\n").unwrap(), "a{color:red}");
    }

    #[test]
    fn test_minify_js_strips_comments_keeps_literals() {
        let out = minify_js(
            "// note\nvar greeting = \"a  b\";\n\nfunction f() {\n  return 1;\n}\n",
            false,
        )
        .unwrap();
        assert!(!out.contains("note"));
        assert!(out.contains("a  b"));
        assert!(out.contains("greeting"));
        assert!(!out.contains("  return"));
    }

    #[test]
    fn test_minify_js_rejects_invalid() {
        assert!(minify_js("function {", false).is_none());
    }

    #[test]
    fn test_minify_js_module_syntax() {
        let src = "import { run } from './run.js';\nexport const x = 1;\nrun(x);\n";
        let out = minify_js(src, true).unwrap();
        assert!(out.contains("import"));
        assert!(out.contains("./run.js"));
    }

    #[test]
    fn test_html_drops_newline_runs_between_tags() {
        assert_eq!(
            minify_html("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_html_collapses_text_whitespace() {
        assert_eq!(minify_html("<p>one   two\n\tthree</p>"), "<p>one two three</p>");
        assert_eq!(minify_html("<b>a</b> <i>b</i>"), "<b>a</b> <i>b</i>");
    }

    #[test]
    fn test_html_tag_whitespace_outside_quotes() {
        assert_eq!(
            minify_html("<div   class=\"a   b\"\n   id='x  y'  >t</div>"),
            "<div class=\"a   b\" id='x  y' >t</div>"
        );
    }

    #[test]
    fn test_html_raw_text_is_verbatim() {
        let html = "<pre>  keep\n   this </pre>\n<script>\nvar s = \"  \";\n</script>\n\
                    <textarea>  x  </textarea><style> a  { } </style>";
        let out = minify_html(html);
        assert!(out.contains("<pre>  keep\n   this </pre>"));
        assert!(out.contains("<script>\nvar s = \"  \";\n</script>"));
        assert!(out.contains("<textarea>  x  </textarea>"));
        assert!(out.contains("<style> a  { } </style>"));
    }

    #[test]
    fn test_html_comments_are_verbatim() {
        assert_eq!(
            minify_html("<!--  a\n  b  -->\n<p>x</p>"),
            "<!--  a\n  b  --><p>x</p>"
        );
    }

    #[test]
    fn test_html_stray_angle_bracket() {
        assert_eq!(minify_html("<p>1 < 2</p>"), "<p>1 < 2</p>");
        assert_eq!(minify_html("a <"), "a <");
    }

    #[test]
    fn test_html_unclosed_tag_and_script() {
        assert_eq!(minify_html("<div  class=\"x"), "<div class=\"x");
        assert_eq!(minify_html("<script>  a  "), "<script>  a  ");
    }
}
