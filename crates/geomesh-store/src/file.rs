//! File-backed store: one file per key under a root directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Result, StoreError};
use crate::Store;

/// Key/value store mapping each key to `<root>/<key>.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/geomesh/`
    /// - macOS:   `~/Library/Application Support/geomesh/`
    /// - Windows: `{FOLDERID_RoamingAppData}\geomesh\data\`
    pub fn open_default() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("", "", "geomesh").ok_or(StoreError::NoDataDir)?;
        Self::open(project_dirs.data_dir())
    }

    /// Store rooted at an explicit directory. Useful for tests and custom
    /// layouts.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys become file names, so restrict them to a safe alphabet.
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl Store for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        Ok(fs::write(self.path_for(key)?, value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
