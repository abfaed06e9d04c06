//! `htmlcomb combine`: write one standalone document.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::args::KindArgs;
use super::common::load_files;
use crate::combine::{CombineError, CombineOptions, combine};
use crate::config::CombineConfig;
use crate::logger::status_success;
use crate::registry::ContentRegistry;
use crate::source::{ContentSource, FsSource};
use crate::utils::{format_size, plural_count};

/// Output path meaning "write to stdout".
const STDOUT_MARKER: &str = "-";

/// Build the registry from `files` and combine it.
pub fn run_combine(files: &[PathBuf], kinds: &KindArgs, config: &CombineConfig) -> Result<()> {
    let registry = ContentRegistry::new();
    load_files(&registry, files, kinds)?;
    save_combined(&registry, &FsSource, &config.options(), &config.output)?;
    Ok(())
}

/// Combine the registry and write it to `output` (or stdout for `-`).
///
/// Returns how many items went into the document.
pub fn save_combined(
    registry: &ContentRegistry,
    source: &dyn ContentSource,
    options: &CombineOptions,
    output: &Path,
) -> Result<usize> {
    let combined = match combine(registry, source, options) {
        Err(CombineError::EmptyInput) => bail!("no enabled files to combine"),
        result => result.context("combine failed")?,
    };
    let target = write_output(&combined.html, output)?;

    status_success(&format!(
        "combined {} → {} ({}, {})",
        plural_count(combined.item_count, "file"),
        target,
        format_size(combined.html.len()),
        if options.minify { "minified" } else { "pretty" },
    ));
    Ok(combined.item_count)
}

/// Write the document; returns a display name for the destination.
fn write_output(document: &str, output: &Path) -> Result<String> {
    if output.as_os_str() == STDOUT_MARKER {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(document.as_bytes())
            .and_then(|()| stdout.flush())
            .context("failed to write to stdout")?;
        return Ok("stdout".to_string());
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(output, document).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(output.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::CombineMode;
    use tempfile::TempDir;

    #[test]
    fn test_run_combine_writes_document() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("site.css");
        let html = dir.path().join("index.html");
        fs::write(&css, "h1 { color: red; }").unwrap();
        fs::write(&html, "<h1>Hi</h1>").unwrap();

        let config = CombineConfig {
            title: "Demo".into(),
            mode: CombineMode::Inline,
            minify: false,
            output: dir.path().join("out/combined.html"),
        };
        run_combine(&[html, css], &KindArgs::default(), &config).unwrap();

        let written = fs::read_to_string(dir.path().join("out/combined.html")).unwrap();
        assert!(written.contains("<title>Demo</title>"));
        assert!(written.contains("h1 { color: red; }"));
        assert!(written.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_save_combined_rejects_empty_registry() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("never.html");
        let err = save_combined(
            &ContentRegistry::new(),
            &FsSource,
            &CombineOptions::default(),
            &output,
        )
        .unwrap_err();

        assert!(err.to_string().contains("no enabled files"));
        assert!(!output.exists());
    }

    #[test]
    fn test_save_combined_counts_enabled_items() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for (name, body) in [("a.css", "a{}"), ("b.css", "b{}"), ("c.html", "<p>c</p>")] {
            let path = dir.path().join(name);
            fs::write(&path, body).unwrap();
            files.push(path);
        }
        let registry = ContentRegistry::new();
        load_files(&registry, &files, &KindArgs::default()).unwrap();
        registry.set_enabled(1, false).unwrap();

        let output = dir.path().join("out.html");
        let count = save_combined(&registry, &FsSource, &CombineOptions::default(), &output)
            .unwrap();
        assert_eq!(count, 2);

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("a{}"));
        assert!(!written.contains("b{}"));
    }

    #[test]
    fn test_read_failure_names_the_file() {
        let dir = TempDir::new().unwrap();
        let js = dir.path().join("app.js");
        fs::write(&js, "go()").unwrap();
        let registry = ContentRegistry::new();
        load_files(&registry, &[js.clone()], &KindArgs::default()).unwrap();
        fs::remove_file(&js).unwrap();

        let err = save_combined(
            &registry,
            &FsSource,
            &CombineOptions::default(),
            &dir.path().join("out.html"),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("app.js"));
    }
}
