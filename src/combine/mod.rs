//! Merge the registry's enabled items into one HTML document.
//!
//! # Pipeline
//!
//! 1. Snapshot `enabled_items_in_order()` once.
//! 2. Read every item to the end; HTML, CSS and JS are also decoded as UTF-8.
//!    The first unreadable item in order aborts the whole combine.
//! 3. Split HTML items into hoisted head content and body content, noting the
//!    `<link>`/`<script src>` tags that point at enabled CSS/JS items.
//! 4. Emit CSS/JS: inline blocks carry the referencing tag's attributes;
//!    linked items already loaded by a kept tag are not linked twice.
//! 5. Assemble the skeleton: title, head extras, styles, bodies, scripts.
//! 6. Optionally minify.

mod document;
mod minify;

use std::fmt::Write as _;
use std::io;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{ContentItem, ContentKind, ContentRegistry};
use crate::source::ContentSource;
use crate::utils::html::{escape, escape_attr, render_attributes};
use document::{HtmlParts, References, Targets};

/// Title used when the caller supplies a blank one.
pub const DEFAULT_TITLE: &str = "Combined App";

/// Characters escaped when a registry name becomes an `href`/`src`.
const NAME_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'/');

/// How CSS and JS items end up in the document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Embed bodies into `<style>`/`<script>` blocks.
    #[default]
    Inline,
    /// Reference files by name; needs the local server to resolve them.
    Linked,
}

/// Caller-supplied combine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineOptions {
    pub title: String,
    pub mode: CombineMode,
    pub minify: bool,
}

impl CombineOptions {
    /// The title to emit, falling back to `DEFAULT_TITLE` when blank.
    pub fn effective_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() { DEFAULT_TITLE } else { title }
    }
}

/// Combine failures.
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("no enabled files to combine")]
    EmptyInput,

    #[error("failed to read `{name}`")]
    ReadFailure {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// A combined document and the number of items that went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combined {
    pub html: String,
    pub item_count: usize,
}

/// Produce one standalone HTML document from the registry's enabled items.
///
/// Never mutates the registry; the same inputs and bytes always give the
/// same output.
pub fn combine(
    registry: &ContentRegistry,
    source: &dyn ContentSource,
    options: &CombineOptions,
) -> Result<Combined, CombineError> {
    let snapshot = registry.enabled_items_in_order();
    if snapshot.is_empty() {
        return Err(CombineError::EmptyInput);
    }
    let items: Vec<&ContentItem> = snapshot.iter().collect();

    let texts = read_contributions(&items, source)?;
    let parts = Contributions::collect(&items, &texts, options);
    let document = assemble(&parts, options);

    Ok(Combined {
        html: if options.minify {
            minify::minify_html(&document)
        } else {
            document
        },
        item_count: items.len(),
    })
}

/// Read every item in parallel, reporting the first failure in order.
///
/// OTHER items are read to the end but not decoded; they may be binary.
fn read_contributions(
    items: &[&ContentItem],
    source: &dyn ContentSource,
) -> Result<Vec<Option<String>>, CombineError> {
    let results: Vec<Result<Option<String>, CombineError>> = items
        .par_iter()
        .map(|item| {
            let read = match item.kind {
                ContentKind::Other => source.drain(&item.handle).map(|_| None),
                _ => source.read_to_string(&item.handle).map(Some),
            };
            read.map_err(|source| CombineError::ReadFailure {
                name: item.name.clone(),
                source,
            })
        })
        .collect();

    results.into_iter().collect()
}

/// Document pieces grouped by slot, each in file order.
#[derive(Debug, Default)]
struct Contributions {
    head: Vec<String>,
    styles: Vec<String>,
    bodies: Vec<String>,
    scripts: Vec<String>,
}

impl Contributions {
    fn collect(items: &[&ContentItem], texts: &[Option<String>], options: &CombineOptions) -> Self {
        let targets: Targets = items
            .iter()
            .filter(|item| matches!(item.kind, ContentKind::Css | ContentKind::Js))
            .map(|item| (item.key(), item.kind))
            .collect();
        let mut references = References::default();
        let mut parts = Self::default();

        // HTML first: its tags decide how CSS and JS are emitted.
        for (item, text) in items.iter().zip(texts) {
            let (ContentKind::Html, Some(text)) = (item.kind, text) else {
                continue;
            };
            let HtmlParts { head, body } = document::split(text);
            if let Some(head) = head {
                let head = handle_references(&head, &targets, &mut references, options.mode);
                if !head.trim().is_empty() {
                    parts.head.push(head.trim().to_string());
                }
            }
            let body = handle_references(&body, &targets, &mut references, options.mode);
            parts.bodies.push(body.trim().to_string());
        }

        for (item, text) in items.iter().zip(texts) {
            let carried = references.get(&item.key()).map(Vec::as_slice);
            match (item.kind, options.mode, text) {
                (ContentKind::Css, CombineMode::Inline, Some(text)) => {
                    parts.styles.push(inline_style(&item.name, text, carried, options.minify));
                }
                (ContentKind::Js, CombineMode::Inline, Some(text)) => {
                    parts.scripts.push(inline_script(&item.name, text, carried, options.minify));
                }
                // A kept tag in an HTML item already loads it.
                (ContentKind::Css | ContentKind::Js, CombineMode::Linked, _)
                    if carried.is_some() => {}
                (ContentKind::Css, CombineMode::Linked, _) => {
                    parts.styles.push(format!(
                        "<link rel=\"stylesheet\" href=\"{}\">",
                        link_target(&item.name)
                    ));
                }
                (ContentKind::Js, CombineMode::Linked, _) => {
                    parts.scripts.push(format!(
                        "<script src=\"{}\"></script>",
                        link_target(&item.name)
                    ));
                }
                _ => {}
            }
        }
        parts
    }
}

/// Inline mode drops reference tags; linked mode keeps them as written.
fn handle_references(
    html: &str,
    targets: &Targets,
    references: &mut References,
    mode: CombineMode,
) -> String {
    match mode {
        CombineMode::Inline => document::strip_references(html, targets, references),
        CombineMode::Linked => {
            document::find_references(html, targets, references);
            html.to_string()
        }
    }
}

fn inline_style(
    name: &str,
    css: &str,
    carried: Option<&[(String, String)]>,
    minify: bool,
) -> String {
    let attrs = carried.map(document::style_attributes).unwrap_or_default();
    let body = if minify {
        minify::minify_css(css).unwrap_or_else(|| css.trim().to_string())
    } else {
        format!("/* {} */\n{}", comment_safe(name), css.trim())
    };
    format!(
        "<style{}>\n{}\n</style>",
        render_attributes(&attrs),
        document::neutralize_close_tag(&body, "style")
    )
}

fn inline_script(
    name: &str,
    js: &str,
    carried: Option<&[(String, String)]>,
    minify: bool,
) -> String {
    let attrs = carried.map(document::script_attributes).unwrap_or_default();
    let body = match (minify, document::is_javascript(&attrs)) {
        (true, true) => minify::minify_js(js, document::is_module(&attrs))
            .unwrap_or_else(|| js.trim().to_string()),
        (false, true) => format!("// {}\n{}", name.replace(['\r', '\n'], " "), js.trim()),
        (_, false) => js.trim().to_string(),
    };
    format!(
        "<script{}>\n{}\n</script>",
        render_attributes(&attrs),
        document::neutralize_close_tag(&body, "script")
    )
}

/// Keep a file name from terminating a CSS comment.
fn comment_safe(name: &str) -> String {
    name.replace("*/", "* /")
}

/// `href`/`src` value for a registry name.
fn link_target(name: &str) -> String {
    let encoded = utf8_percent_encode(name, NAME_ENCODE_SET).to_string();
    escape_attr(&encoded).into_owned()
}

fn assemble(parts: &Contributions, options: &CombineOptions) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape(options.effective_title()));
    for block in parts.head.iter().chain(&parts.styles) {
        out.push_str(block);
        out.push('\n');
    }
    out.push_str("</head>\n<body>\n");
    for block in parts.bodies.iter().chain(&parts.scripts) {
        out.push_str(block);
        out.push('\n');
    }
    out.push_str("</body>\n</html>\n");
    out
}
