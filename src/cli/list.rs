//! `htmlcomb list`: print the registry as JSON.

use std::path::PathBuf;

use anyhow::Result;

use super::args::KindArgs;
use super::common::load_files;
use crate::registry::ContentRegistry;

pub fn run_list(files: &[PathBuf], kinds: &KindArgs, pretty: bool) -> Result<()> {
    let registry = ContentRegistry::new();
    load_files(&registry, files, kinds)?;
    println!("{}", to_json(&registry, pretty)?);
    Ok(())
}

fn to_json(registry: &ContentRegistry, pretty: bool) -> Result<String> {
    let items = registry.items();
    let json = if pretty {
        serde_json::to_string_pretty(&items)?
    } else {
        serde_json::to_string(&items)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ContentHandle, ContentItem, ContentKind};
    use serde_json::Value;

    #[test]
    fn test_to_json_fields_and_order() {
        let registry = ContentRegistry::new();
        registry
            .add(ContentItem::new("b.js", ContentHandle::new("/tmp/b.js")))
            .unwrap();
        registry
            .add(ContentItem::new("notes.txt", ContentHandle::new("/tmp/notes.txt")).with_kind(ContentKind::Html))
            .unwrap();
        registry.set_enabled(0, false).unwrap();

        let value: Value = serde_json::from_str(&to_json(&registry, false).unwrap()).unwrap();
        assert_eq!(value[0]["name"], "b.js");
        assert_eq!(value[0]["kind"], "JS");
        assert_eq!(value[0]["enabled"], false);
        assert_eq!(value[0]["handle"], "/tmp/b.js");
        assert_eq!(value[1]["kind"], "HTML");

        assert!(to_json(&registry, true).unwrap().contains("\n  "));
    }
}
