//! Output persistence.
//!
//! Writers take paths relative to their own root. [`FsWriter`] creates
//! missing parent directories; [`MemoryWriter`] keeps everything in memory
//! and can be told to fail specific paths.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

/// Persists one file.
pub trait Writer: Send + Sync {
    /// Write `bytes` to `relative_path`, returning the full path written.
    fn write(&self, relative_path: &Path, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes below a root directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsWriter {
    root: PathBuf,
}

impl FsWriter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Writer for FsWriter {
    fn write(&self, relative_path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(relative_path);
        let wrap = |source: io::Error| Error::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(wrap)?;
        }
        std::fs::write(&path, bytes).map_err(wrap)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
        Ok(path)
    }
}

/// In-memory writer for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    failing: HashSet<PathBuf>,
}

impl MemoryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `relative_path` fail with a permission error.
    #[must_use]
    pub fn failing_on(mut self, relative_path: impl Into<PathBuf>) -> Self {
        self.failing.insert(relative_path.into());
        self
    }

    /// Contents written to `relative_path`, if any.
    #[must_use]
    pub fn get(&self, relative_path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(relative_path.as_ref())
            .cloned()
    }

    /// Every written path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl Writer for MemoryWriter {
    fn write(&self, relative_path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        if self.failing.contains(relative_path) {
            return Err(Error::Write {
                path: relative_path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "write refused"),
            });
        }
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(relative_path.to_path_buf(), bytes.to_vec());
        Ok(relative_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_writer_creates_parent_directories() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("tempdir: {e}"),
        };
        let writer = FsWriter::new(dir.path());
        let written = writer.write(Path::new("post/assets/a.png"), b"png");

        let written = match written {
            Ok(p) => p,
            Err(err) => panic!("expected Ok(_), got Err({err:?})"),
        };
        assert_eq!(written, dir.path().join("post/assets/a.png"));
        assert_eq!(std::fs::read(&written).ok().as_deref(), Some(&b"png"[..]));
    }

    #[test]
    fn fs_writer_reports_path_on_failure() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("tempdir: {e}"),
        };
        // a file where a directory is needed
        if let Err(e) = std::fs::write(dir.path().join("post"), b"") {
            panic!("setup: {e}");
        }
        let writer = FsWriter::new(dir.path());
        let result = writer.write(Path::new("post/post.md"), b"# x");

        match result {
            Err(Error::Write { path, .. }) => assert!(path.ends_with("post/post.md")),
            other => panic!("expected Err(Write), got {other:?}"),
        }
    }

    #[test]
    fn memory_writer_records_and_fails_on_demand() {
        let writer = MemoryWriter::new().failing_on("a/a.html");

        assert!(writer.write(Path::new("a/a.md"), b"md").is_ok());
        assert!(matches!(writer.write(Path::new("a/a.html"), b"html"), Err(Error::Write { .. })));
        assert_eq!(writer.get("a/a.md"), Some(b"md".to_vec()));
        assert_eq!(writer.paths(), vec![PathBuf::from("a/a.md")]);
    }
}
