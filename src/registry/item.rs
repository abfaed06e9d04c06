//! Content items and their kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::mime;

/// Opaque reference to an item's bytes.
///
/// Only the `ContentSource` that issued a handle knows how to open it.
/// Two items are the same entity iff their handles are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation and combine grouping of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentKind {
    Html,
    Css,
    Js,
    Other,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [Self::Html, Self::Css, Self::Js, Self::Other];

    /// Classify a name by extension (case-insensitive), using the same
    /// extension rule as MIME guessing.
    pub fn infer(name: &str) -> Self {
        match mime::extension(name).as_deref() {
            Some("html" | "htm") => Self::Html,
            Some("css") => Self::Css,
            Some("js") => Self::Js,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Css => "CSS",
            Self::Js => "JS",
            Self::Other => "OTHER",
        }
    }

    /// Badge background on the listing page.
    pub const fn badge_color(self) -> &'static str {
        match self {
            Self::Html => "#E91E63",
            Self::Css => "#2196F3",
            Self::Js => "#FF9800",
            Self::Other => "#607D8B",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(Self::Html),
            "css" => Ok(Self::Css),
            "js" | "javascript" => Ok(Self::Js),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown kind `{s}` (expected html, css, js or other)")),
        }
    }
}

/// One logical file added by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    /// Route name, used verbatim as the URL path segment.
    pub name: String,
    pub handle: ContentHandle,
    pub kind: ContentKind,
    pub enabled: bool,
}

impl ContentItem {
    /// New enabled item with its kind inferred from `name`.
    pub fn new(name: impl Into<String>, handle: ContentHandle) -> Self {
        let name = name.into();
        let kind = ContentKind::infer(&name);
        Self {
            name,
            handle,
            kind,
            enabled: true,
        }
    }

    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Lookup key for the name index.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}
