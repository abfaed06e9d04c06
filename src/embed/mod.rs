//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Local server pages (listing.html)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{LISTING_HTML, ListingVars};
//!
//! let html = LISTING_HTML.render(&ListingVars { addr: "127.0.0.1:8080".into(), .. });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for listing.html.
    ///
    /// Every field is inserted as-is; callers escape.
    pub struct ListingVars {
        pub addr: String,
        pub badge_styles: String,
        pub items: String,
        pub count: String,
        pub version: &'static str,
    }

    impl TemplateVars for ListingVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__BADGE_STYLES__", &self.badge_styles)
                .replace("__ADDR__", &self.addr)
                .replace("__COUNT__", &self.count)
                .replace("__VERSION__", self.version)
                .replace("__ITEMS__", &self.items)
        }
    }

    /// Directory listing served at `/`.
    pub const LISTING_HTML: Template<ListingVars> =
        Template::new(include_str!("serve/listing.html"));
}
