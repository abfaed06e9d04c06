//! `[combine]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [combine]
//! title = "My App"            # Empty means "Combined App"
//! mode = "inline"             # "inline" or "linked"
//! minify = false
//! output = "combined.html"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::combine::{CombineMode, CombineOptions};

/// Combine defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Document title; blank falls back to the default title.
    pub title: String,

    /// Embed bodies (`inline`) or reference files (`linked`).
    pub mode: CombineMode,

    /// Compact whitespace in the output.
    pub minify: bool,

    /// Where `combine` writes the document (`-` for stdout).
    pub output: PathBuf,
}

impl CombineConfig {
    pub fn options(&self) -> CombineOptions {
        CombineOptions {
            title: self.title.clone(),
            mode: self.mode,
            minify: self.minify,
        }
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            mode: CombineMode::Inline,
            minify: false,
            output: PathBuf::from("combined.html"),
        }
    }
}
