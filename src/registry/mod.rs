//! Ordered, mutable collection of content items.
//!
//! Readers (server requests, the combiner) load an immutable snapshot through
//! `arc-swap`, so they never block and never see a half-applied mutation.
//! Writers serialize on a mutex, copy the current item list, mutate it,
//! rebuild the name index and publish the result in one atomic store.

mod item;

pub use item::{ContentHandle, ContentItem, ContentKind};

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Registry mutation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("already added: {name} ({handle})")]
    DuplicateHandle { name: String, handle: ContentHandle },

    #[error("no item at position {index} (registry has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One published registry state: items plus the derived name index.
#[derive(Debug, Default)]
struct RegistryState {
    items: Vec<ContentItem>,
    /// Lowercased name -> position in `items`, enabled items only.
    index: FxHashMap<String, usize>,
    /// Lowercased names shared by more than one enabled item.
    collisions: Vec<String>,
}

impl RegistryState {
    fn from_items(items: Vec<ContentItem>) -> Self {
        let mut index = FxHashMap::default();
        let mut collisions = Vec::new();

        for (pos, item) in items.iter().enumerate().filter(|(_, item)| item.enabled) {
            let key = item.key();
            // Later items win.
            if index.insert(key.clone(), pos).is_some() && !collisions.contains(&key) {
                collisions.push(key);
            }
        }

        Self {
            items,
            index,
            collisions,
        }
    }
}

/// Ordered collection of content items with a case-insensitive name index.
#[derive(Debug, Default)]
pub struct ContentRegistry {
    state: ArcSwap<RegistryState>,
    writer: Mutex<()>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // mutations
    // ========================================================================

    /// Append an item. Fails if an item with the same handle exists.
    ///
    /// Returns the new item's position.
    pub fn add(&self, item: ContentItem) -> Result<usize, RegistryError> {
        self.update(|items| {
            if items.iter().any(|existing| existing.handle == item.handle) {
                return Err(RegistryError::DuplicateHandle {
                    name: item.name,
                    handle: item.handle,
                });
            }
            items.push(item);
            Ok(items.len() - 1)
        })
    }

    /// Remove the item at `index`, shifting later items left.
    pub fn remove(&self, index: usize) -> Result<ContentItem, RegistryError> {
        self.update(|items| {
            check_index(index, items.len())?;
            Ok(items.remove(index))
        })
    }

    /// Move one item from `from` to `to`, keeping the relative order of the others.
    pub fn move_item(&self, from: usize, to: usize) -> Result<(), RegistryError> {
        self.update(|items| {
            check_index(from, items.len())?;
            check_index(to, items.len())?;
            let item = items.remove(from);
            items.insert(to, item);
            Ok(())
        })
    }

    pub fn set_enabled(&self, index: usize, enabled: bool) -> Result<(), RegistryError> {
        self.update(|items| {
            check_index(index, items.len())?;
            items[index].enabled = enabled;
            Ok(())
        })
    }

    pub fn set_kind(&self, index: usize, kind: ContentKind) -> Result<(), RegistryError> {
        self.update(|items| {
            check_index(index, items.len())?;
            items[index].kind = kind;
            Ok(())
        })
    }

    /// Remove every item.
    pub fn clear(&self) {
        let _guard = self.writer.lock();
        self.state.store(Arc::new(RegistryState::default()));
    }

    /// Apply a mutation to a copy of the items and publish the result.
    ///
    /// Nothing is published when `f` fails.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut Vec<ContentItem>) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let _guard = self.writer.lock();
        let mut items = self.state.load().items.clone();
        let out = f(&mut items)?;
        self.state.store(Arc::new(RegistryState::from_items(items)));
        Ok(out)
    }

    // ========================================================================
    // reads
    // ========================================================================

    /// Snapshot of the enabled items in current order.
    ///
    /// The returned value can be iterated any number of times and always
    /// yields the same sequence, whatever happens to the registry meanwhile.
    pub fn enabled_items_in_order(&self) -> EnabledItems {
        EnabledItems {
            state: self.state.load_full(),
        }
    }

    /// Case-insensitive lookup among enabled items.
    pub fn lookup_by_name(&self, name: &str) -> Option<ContentItem> {
        let state = self.state.load();
        let pos = *state.index.get(&name.to_lowercase())?;
        state.items.get(pos).cloned()
    }

    /// First enabled HTML item, the natural preview target.
    pub fn first_enabled_html(&self) -> Option<ContentItem> {
        self.enabled_items_in_order()
            .iter()
            .find(|item| item.kind == ContentKind::Html)
            .cloned()
    }

    /// All items (enabled or not) in current order.
    pub fn items(&self) -> Vec<ContentItem> {
        self.state.load().items.clone()
    }

    pub fn get(&self, index: usize) -> Option<ContentItem> {
        self.state.load().items.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.load().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.load().items.is_empty()
    }

    /// Lowercased names shared by several enabled items (the last one is served).
    pub fn collisions(&self) -> Vec<String> {
        self.state.load().collisions.clone()
    }
}

fn check_index(index: usize, len: usize) -> Result<(), RegistryError> {
    if index < len {
        Ok(())
    } else {
        Err(RegistryError::IndexOutOfRange { index, len })
    }
}

/// Immutable, restartable view of the enabled items at one point in time.
#[derive(Debug, Clone)]
pub struct EnabledItems {
    state: Arc<RegistryState>,
}

impl EnabledItems {
    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> + '_ {
        self.state.items.iter().filter(|item| item.enabled)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for &'a EnabledItems {
    type Item = &'a ContentItem;
    type IntoIter = Box<dyn Iterator<Item = &'a ContentItem> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
