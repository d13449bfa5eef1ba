//! Storage Module
//!
//! Resolves snapshot paths and moves payloads to and from the filesystem.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::error::PersistError;
use crate::persistence::Payload;

/// Suffix marker appended after the timestamp of timestamped file names.
const TIMESTAMP_MARKER: &str = "srr";

// == Storage Trait ==
/// Where snapshots live.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Turns optional user input into a concrete path with the given extension.
    ///
    /// `None` means the default location; a directory keeps the default file
    /// name; anything else keeps its directory and file stem. Parent
    /// directories are created.
    fn resolve_path(
        &self,
        path: Option<&Path>,
        extension: &str,
        use_timestamp: bool,
    ) -> Result<PathBuf, PersistError>;

    fn write(&self, path: &Path, payload: &Payload) -> Result<(), PersistError>;

    /// Reads a payload; `binary` selects the payload representation.
    fn read(&self, path: &Path, binary: bool) -> Result<Payload, PersistError>;
}

// == File Storage ==
/// Local filesystem storage with a default directory and file name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    default_dir: PathBuf,
    default_filename: String,
}

impl FileStorage {
    pub fn new(default_dir: impl Into<PathBuf>, default_filename: impl Into<String>) -> Self {
        Self {
            default_dir: default_dir.into(),
            default_filename: default_filename.into(),
        }
    }

    fn split_input(&self, path: Option<&Path>) -> (PathBuf, String) {
        let Some(path) = path else {
            return (self.default_dir.clone(), self.default_filename.clone());
        };

        if path.is_dir() {
            return (path.to_path_buf(), self.default_filename.clone());
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.default_dir.clone(),
        };
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.default_filename.clone());
        (dir, stem)
    }
}

impl Storage for FileStorage {
    fn resolve_path(
        &self,
        path: Option<&Path>,
        extension: &str,
        use_timestamp: bool,
    ) -> Result<PathBuf, PersistError> {
        let (dir, stem) = self.split_input(path);

        let name = if use_timestamp {
            format!(
                "{}_{}_{}",
                stem,
                Local::now().format("%Y%m%d_%H%M%S"),
                TIMESTAMP_MARKER
            )
        } else {
            stem
        };

        fs::create_dir_all(&dir)?;
        Ok(dir.join(format!("{}.{}", name, extension)))
    }

    fn write(&self, path: &Path, payload: &Payload) -> Result<(), PersistError> {
        fs::write(path, payload.as_bytes())?;
        debug!("Wrote {} bytes to {:?}", payload.len(), path);
        Ok(())
    }

    fn read(&self, path: &Path, binary: bool) -> Result<Payload, PersistError> {
        let payload = if binary {
            Payload::Binary(fs::read(path)?)
        } else {
            Payload::Text(fs::read_to_string(path)?)
        };
        debug!("Read {} bytes from {:?}", payload.len(), path);
        Ok(payload)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> FileStorage {
        FileStorage::new(dir.path().join("default"), "cache_data")
    }

    #[test]
    fn test_resolve_default_location() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let path = storage.resolve_path(None, "json", false).unwrap();

        assert_eq!(path, dir.path().join("default").join("cache_data.json"));
        assert!(dir.path().join("default").is_dir());
    }

    #[test]
    fn test_resolve_directory_input_keeps_default_name() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let path = storage.resolve_path(Some(dir.path()), "bin", false).unwrap();

        assert_eq!(path, dir.path().join("cache_data.bin"));
    }

    #[test]
    fn test_resolve_forces_extension() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let input = dir.path().join("nested").join("snapshot.txt");

        let path = storage.resolve_path(Some(&input), "json", false).unwrap();

        assert_eq!(path, dir.path().join("nested").join("snapshot.json"));
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_resolve_bare_name_uses_default_dir() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let path = storage
            .resolve_path(Some(Path::new("custom")), "json", false)
            .unwrap();

        assert_eq!(path, dir.path().join("default").join("custom.json"));
    }

    #[test]
    fn test_resolve_with_timestamp() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let path = storage.resolve_path(None, "json", true).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(name.starts_with("cache_data_"));
        assert!(name.ends_with("_srr.json"));
        // cache_data_YYYYMMDD_HHMMSS_srr.json
        assert_eq!(name.len(), "cache_data_".len() + 15 + "_srr.json".len());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let path = dir.path().join("data.json");

        storage
            .write(&path, &Payload::Text("{\"a\":1}".to_string()))
            .unwrap();

        let payload = storage.read(&path, false).unwrap();
        assert_eq!(payload, Payload::Text("{\"a\":1}".to_string()));

        let raw = storage.read(&path, true).unwrap();
        assert_eq!(raw.as_bytes(), b"{\"a\":1}");
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let result = storage.read(&dir.path().join("missing.bin"), true);
        assert!(matches!(result, Err(PersistError::Io(_))));
    }
}
