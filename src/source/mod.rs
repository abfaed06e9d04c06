//! Content sources: turning opaque handles into byte streams.
//!
//! The server and the combiner never touch the filesystem directly; they ask
//! a `ContentSource` to open an item's handle. `FsSource` backs the CLI,
//! `MemorySource` backs the tests.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::registry::{ContentHandle, ContentItem};

/// Readable byte stream for one item.
pub type ContentStream = Box<dyn Read + Send>;

/// Resolves handles to byte streams.
pub trait ContentSource: Send + Sync {
    /// Open the bytes behind `handle`.
    ///
    /// `Ok(None)` means the source resolved the handle but produced no stream.
    fn open(&self, handle: &ContentHandle) -> io::Result<Option<ContentStream>>;

    /// Read an item's full content as UTF-8 text.
    fn read_to_string(&self, handle: &ContentHandle) -> io::Result<String> {
        let mut stream = open_stream(self, handle)?;
        let mut text = String::new();
        stream.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Read an item to the end without keeping its bytes. Returns the length.
    fn drain(&self, handle: &ContentHandle) -> io::Result<u64> {
        let mut stream = open_stream(self, handle)?;
        io::copy(&mut stream, &mut io::sink())
    }
}

fn open_stream<S: ContentSource + ?Sized>(
    source: &S,
    handle: &ContentHandle,
) -> io::Result<ContentStream> {
    source.open(handle)?.ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("cannot open {handle}"))
    })
}

// ============================================================================
// Filesystem
// ============================================================================

/// Handles are canonical filesystem paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl FsSource {
    /// Canonical handle for a path, so one file always maps to one handle.
    pub fn handle_for(path: &Path) -> io::Result<ContentHandle> {
        let canonical = path.canonicalize()?;
        if !canonical.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a file: {}", path.display()),
            ));
        }
        Ok(ContentHandle::new(canonical.to_string_lossy()))
    }

    /// Build an item named after the file, with its kind inferred.
    pub fn item_for_path(path: &Path) -> io::Result<ContentItem> {
        let handle = Self::handle_for(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ContentItem::new(name, handle))
    }
}

impl ContentSource for FsSource {
    fn open(&self, handle: &ContentHandle) -> io::Result<Option<ContentStream>> {
        let file = File::open(PathBuf::from(handle.as_str()))?;
        Ok(Some(Box::new(BufReader::new(file))))
    }
}

// ============================================================================
// In-memory (tests)
// ============================================================================

#[cfg(test)]
pub use memory::MemorySource;

#[cfg(test)]
mod memory {
    use super::*;
    use parking_lot::RwLock;
    use rustc_hash::{FxHashMap, FxHashSet};

    /// Handle -> bytes map with switches for failure modes.
    #[derive(Debug, Default)]
    pub struct MemorySource {
        blobs: RwLock<FxHashMap<ContentHandle, Vec<u8>>>,
        failing: RwLock<FxHashSet<ContentHandle>>,
        empty: RwLock<FxHashSet<ContentHandle>>,
    }

    impl MemorySource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store bytes and return an enabled item for them named `name`.
        pub fn insert(&self, name: &str, bytes: impl Into<Vec<u8>>) -> ContentItem {
            let handle = ContentHandle::new(format!("mem:{name}"));
            self.blobs.write().insert(handle.clone(), bytes.into());
            ContentItem::new(name, handle)
        }

        /// Make `open` fail with an I/O error for this handle.
        pub fn fail(&self, handle: &ContentHandle) {
            self.failing.write().insert(handle.clone());
        }

        /// Make `open` succeed without a stream for this handle.
        pub fn no_stream(&self, handle: &ContentHandle) {
            self.empty.write().insert(handle.clone());
        }
    }

    impl ContentSource for MemorySource {
        fn open(&self, handle: &ContentHandle) -> io::Result<Option<ContentStream>> {
            if self.failing.read().contains(handle) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("permission revoked for {handle}"),
                ));
            }
            if self.empty.read().contains(handle) {
                return Ok(None);
            }
            match self.blobs.read().get(handle) {
                Some(bytes) => Ok(Some(Box::new(io::Cursor::new(bytes.clone())))),
                None => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such blob: {handle}"),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ContentKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fs_item_for_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Style.CSS");
        fs::write(&path, "body{}").unwrap();

        let item = FsSource::item_for_path(&path).unwrap();
        assert_eq!(item.name, "Style.CSS");
        assert_eq!(item.kind, ContentKind::Css);
        assert!(item.enabled);

        let text = FsSource.read_to_string(&item.handle).unwrap();
        assert_eq!(text, "body{}");
    }

    #[test]
    fn test_fs_handle_is_canonical() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let path = dir.path().join("a.js");
        fs::write(&path, "1").unwrap();

        let direct = FsSource::handle_for(&path).unwrap();
        let roundabout = FsSource::handle_for(&dir.path().join("sub/../a.js")).unwrap();
        assert_eq!(direct, roundabout);
    }

    #[test]
    fn test_fs_rejects_missing_and_directories() {
        let dir = TempDir::new().unwrap();
        assert!(FsSource::item_for_path(&dir.path().join("nope.html")).is_err());
        assert!(FsSource::item_for_path(dir.path()).is_err());
    }

    #[test]
    fn test_fs_open_after_delete_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.js");
        fs::write(&path, "x").unwrap();
        let item = FsSource::item_for_path(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(FsSource.open(&item.handle).is_err());
    }

    #[test]
    fn test_memory_source_modes() {
        let source = MemorySource::new();
        let ok = source.insert("a.css", "a{}");
        let broken = source.insert("b.css", "b{}");
        let empty = source.insert("c.css", "c{}");
        source.fail(&broken.handle);
        source.no_stream(&empty.handle);

        assert_eq!(source.read_to_string(&ok.handle).unwrap(), "a{}");
        assert!(source.open(&broken.handle).is_err());
        assert!(source.open(&empty.handle).unwrap().is_none());
        assert!(source.read_to_string(&empty.handle).is_err());
    }

    #[test]
    fn test_read_to_string_rejects_invalid_utf8() {
        let source = MemorySource::new();
        let item = source.insert("bin.dat", vec![0xff, 0xfe, 0x00]);
        let err = source.read_to_string(&item.handle).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_drain_reads_binary_to_the_end() {
        let source = MemorySource::new();
        let item = source.insert("logo.png", vec![0x89, 0x50, 0xff, 0x00]);
        assert_eq!(source.drain(&item.handle).unwrap(), 4);

        source.no_stream(&item.handle);
        assert_eq!(
            source.drain(&item.handle).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
