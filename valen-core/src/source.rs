//! Where snapshots and notices are read from.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A blocking, whole-content read of an external resource.
///
/// Each call re-reads the resource from scratch; nothing is cached between
/// reads.
pub trait SnapshotSource {
    /// Human-readable location, for logs and diagnostics
    fn describe(&self) -> String;

    fn read(&self) -> io::Result<Vec<u8>>;
}

/// A file on disk, typically written atomically by the monitor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Bytes already in memory (useful for testing and for piped input)
#[derive(Clone, PartialEq, Eq)]
pub struct MemorySource {
    label: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("label", &self.label)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl From<&str> for MemorySource {
    fn from(text: &str) -> Self {
        Self::new("<memory>", text)
    }
}

impl SnapshotSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
