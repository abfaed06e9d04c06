//! Common utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::args::KindArgs;
use crate::log;
use crate::logger::status_warning;
use crate::registry::{ContentRegistry, RegistryError};
use crate::source::FsSource;

/// Result of adding one file to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Added {
    /// New item at this position.
    At(usize),
    /// The same file is already registered under this name.
    Duplicate(String),
}

/// Register one file, applying any kind override for its name.
pub fn add_file(registry: &ContentRegistry, path: &Path, kinds: &KindArgs) -> Result<Added> {
    let mut item = FsSource::item_for_path(path)
        .with_context(|| format!("cannot add {}", path.display()))?;
    if let Some(kind) = kinds.lookup(&item.name) {
        item = item.with_kind(kind);
    }

    match registry.add(item) {
        Ok(index) => Ok(Added::At(index)),
        Err(RegistryError::DuplicateHandle { name, .. }) => Ok(Added::Duplicate(name)),
        Err(e) => Err(e.into()),
    }
}

/// Register every file in order. Unreadable paths abort; duplicates are skipped.
pub fn load_files(registry: &ContentRegistry, files: &[PathBuf], kinds: &KindArgs) -> Result<()> {
    for path in files {
        if let Added::Duplicate(name) = add_file(registry, path, kinds)? {
            log!("warning"; "{} already added, skipping", name);
        }
    }
    for (name, _) in &kinds.kinds {
        if !registry.items().iter().any(|item| item.name.eq_ignore_ascii_case(name)) {
            log!("warning"; "kind override for unknown file `{}`", name);
        }
    }
    warn_collisions(registry);
    Ok(())
}

/// Report enabled items that share a name; only the last one is served.
pub fn warn_collisions(registry: &ContentRegistry) {
    for name in registry.collisions() {
        status_warning(&format!(
            "several enabled files are named `{name}`; the last one is served"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ContentKind;
    use std::fs;
    use tempfile::TempDir;

    fn kinds(pairs: &[(&str, ContentKind)]) -> KindArgs {
        KindArgs {
            kinds: pairs.iter().map(|(n, k)| (n.to_string(), *k)).collect(),
        }
    }

    #[test]
    fn test_add_file_applies_override_and_detects_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.txt");
        fs::write(&path, "<p>x</p>").unwrap();
        let registry = ContentRegistry::new();
        let overrides = kinds(&[("PAGE.TXT", ContentKind::Html)]);

        assert_eq!(add_file(&registry, &path, &overrides).unwrap(), Added::At(0));
        assert_eq!(registry.get(0).unwrap().kind, ContentKind::Html);

        let again = add_file(&registry, &path, &KindArgs::default()).unwrap();
        assert_eq!(again, Added::Duplicate("page.txt".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_files_keeps_order_and_fails_on_missing() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.css");
        let b = dir.path().join("b.js");
        fs::write(&a, "a{}").unwrap();
        fs::write(&b, "b()").unwrap();

        let registry = ContentRegistry::new();
        load_files(&registry, &[b.clone(), a.clone(), b.clone()], &KindArgs::default()).unwrap();
        let names: Vec<_> = registry.items().into_iter().map(|i| i.name).collect();
        assert_eq!(names, ["b.js", "a.css"]);

        let missing = dir.path().join("nope.html");
        let err = load_files(&registry, &[missing], &KindArgs::default()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.html"));
    }
}
