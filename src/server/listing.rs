//! Directory listing served at `/`.

use std::fmt::Write as _;
use std::net::SocketAddr;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::embed::serve::{LISTING_HTML, ListingVars};
use crate::registry::{ContentKind, ContentRegistry};
use crate::utils::html::{escape, escape_attr};
use crate::utils::plural_count;

/// Characters escaped in listing links.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'/');

/// Render the listing for the registry as it is right now.
pub fn render(registry: &ContentRegistry, addr: SocketAddr) -> String {
    let snapshot = registry.enabled_items_in_order();

    let mut items = String::new();
    for item in &snapshot {
        let href = utf8_percent_encode(&item.name, PATH_ENCODE_SET).to_string();
        let _ = writeln!(
            items,
            "<li><span class=\"badge {}\">{}</span><a href=\"/{}\">{}</a></li>",
            badge_class(item.kind),
            item.kind,
            escape_attr(&href),
            escape(&item.name),
        );
    }
    if items.is_empty() {
        items.push_str("<li class=\"empty\">No enabled files</li>");
    }

    LISTING_HTML.render(&ListingVars {
        addr: escape(&addr.to_string()).into_owned(),
        badge_styles: badge_styles(),
        items,
        count: plural_count(snapshot.len(), "file"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn badge_class(kind: ContentKind) -> String {
    format!("badge-{}", kind.as_str().to_ascii_lowercase())
}

fn badge_styles() -> String {
    ContentKind::ALL
        .iter()
        .map(|kind| format!(".{}{{background:{}}}", badge_class(*kind), kind.badge_color()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ContentHandle, ContentItem};

    fn addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    #[test]
    fn test_listing_entries_in_order() {
        let registry = ContentRegistry::new();
        for name in ["index.html", "My Style.css", "<b>.js"] {
            registry
                .add(ContentItem::new(name, ContentHandle::new(name)))
                .unwrap();
        }
        let html = render(&registry, addr());

        assert!(html.contains("127.0.0.1:8080"));
        assert!(html.contains("<a href=\"/My%20Style.css\">My Style.css</a>"));
        assert!(html.contains("&lt;b&gt;.js"));
        assert!(html.contains("href=\"/%3Cb%3E.js\""));
        assert!(html.contains("3 files"));
        assert!(html.find("index.html").unwrap() < html.find("My Style.css").unwrap());
    }

    #[test]
    fn test_listing_badges() {
        let registry = ContentRegistry::new();
        registry
            .add(ContentItem::new("a.css", ContentHandle::new("a")))
            .unwrap();
        let html = render(&registry, addr());

        assert!(html.contains("<span class=\"badge badge-css\">CSS</span>"));
        assert!(html.contains(".badge-css{background:#2196F3}"));
        assert!(html.contains(".badge-html{background:#E91E63}"));
        assert!(html.contains(".badge-js{background:#FF9800}"));
        assert!(html.contains(".badge-other{background:#607D8B}"));
    }

    #[test]
    fn test_listing_hides_disabled_and_handles_empty() {
        let registry = ContentRegistry::new();
        registry
            .add(ContentItem::new("gone.js", ContentHandle::new("g")))
            .unwrap();
        registry.set_enabled(0, false).unwrap();
        let html = render(&registry, addr());

        assert!(!html.contains("gone.js"));
        assert!(html.contains("No enabled files"));
        assert!(html.contains("0 files"));
    }
}
