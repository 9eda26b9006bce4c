//! Run-scoped artifact store
//!
//! A directory with one sub-directory per [`ArtifactKey`]. Creating that
//! sub-directory is the atomic "claim" of the key, which makes `put`
//! write-once even when builders run concurrently or in separate processes
//! sharing the same store directory.
//!
//! ```text
//! <store>/
//!   program-linux/program-linux
//!   program-windows/program-windows.exe
//!   program-macos/program-macos
//! ```

use crate::core::error::{FanoutResult, ResultExt, StoreError};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name a blob is copied under before it is renamed into place
const PARTIAL_NAME: &str = ".partial";

/// Address of one artifact, `<program>-<os_id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactKey(String);

impl ArtifactKey {
  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ArtifactKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// An artifact that has been put into the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredArtifact {
  pub key: ArtifactKey,
  pub path: PathBuf,
  pub size: u64,
}

impl StoredArtifact {
  /// File name of the stored blob
  pub fn file_name(&self) -> Option<&str> {
    self.path.file_name().and_then(|n| n.to_str())
  }

  /// Copy into `<dir>/<key>/<file>` and return the destination path
  pub fn retrieve_into(&self, dir: &Path) -> Result<PathBuf, StoreError> {
    let file_name = self.path.file_name().ok_or_else(|| StoreError::Io {
      key: self.key.to_string(),
      source: io::Error::new(io::ErrorKind::InvalidData, "stored artifact has no file name"),
    })?;
    let dest_dir = dir.join(self.key.as_str());
    let dest = dest_dir.join(file_name);
    let io_err = |source| StoreError::Io {
      key: self.key.to_string(),
      source,
    };
    fs::create_dir_all(&dest_dir).map_err(io_err)?;
    fs::copy(&self.path, &dest).map_err(io_err)?;
    Ok(dest)
  }
}

/// Write-once, read-many blob store
#[derive(Debug, Clone)]
pub struct ArtifactStore {
  root: PathBuf,
}

impl ArtifactStore {
  /// Create the store directory (builder side)
  pub fn create(root: &Path) -> FanoutResult<Self> {
    fs::create_dir_all(root).with_context(|| format!("Failed to create artifact store at {}", root.display()))?;
    let store = Self {
      root: root.to_path_buf(),
    };
    log::debug!("created artifact store at {}", root.display());
    Ok(store)
  }

  /// Open an existing store (publisher side)
  pub fn open(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Store `file` under `key`. Fails if the key already has a value.
  pub fn put(&self, key: &ArtifactKey, file: &Path) -> Result<StoredArtifact, StoreError> {
    let io_err = |source| StoreError::Io {
      key: key.to_string(),
      source,
    };

    fs::create_dir_all(&self.root).map_err(io_err)?;
    let slot = self.root.join(key.as_str());
    match fs::create_dir(&slot) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
        return Err(StoreError::KeyExists { key: key.to_string() });
      }
      Err(e) => return Err(io_err(e)),
    }

    let file_name = file.file_name().ok_or_else(|| {
      io_err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} has no file name", file.display()),
      ))
    })?;
    let dest = slot.join(file_name);
    // Readers ignore dot files, so the blob only appears once it is complete
    let partial = slot.join(PARTIAL_NAME);
    let size = fs::copy(file, &partial).map_err(io_err)?;
    fs::rename(&partial, &dest).map_err(io_err)?;
    log::debug!("stored {} ({} bytes) as {}", file.display(), size, key);

    Ok(StoredArtifact {
      key: key.clone(),
      path: dest,
      size,
    })
  }

  /// Look up one key
  pub fn get(&self, key: &ArtifactKey) -> Result<Option<StoredArtifact>, StoreError> {
    let slot = self.root.join(key.as_str());
    if !slot.is_dir() {
      return Ok(None);
    }

    let io_err = |source| StoreError::Io {
      key: key.to_string(),
      source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(&slot).map_err(io_err)? {
      let entry = entry.map_err(io_err)?;
      let hidden = entry.file_name().to_string_lossy().starts_with('.');
      if !hidden && entry.file_type().map_err(io_err)?.is_file() {
        files.push(entry.path());
      }
    }

    // A claimed slot without a complete file is a put still copying, or one
    // that died mid-copy
    let Some(path) = files.into_iter().next() else {
      return Ok(None);
    };
    let size = fs::metadata(&path).map_err(io_err)?.len();
    Ok(Some(StoredArtifact {
      key: key.clone(),
      path,
      size,
    }))
  }

  /// All-or-nothing retrieval: every key must be present and non-empty
  pub fn get_all(&self, keys: &[ArtifactKey]) -> Result<Vec<StoredArtifact>, StoreError> {
    let mut found = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();

    for key in keys {
      match self.get(key)? {
        Some(artifact) => found.push(artifact),
        None => missing.push(key.to_string()),
      }
    }

    if !missing.is_empty() {
      return Err(StoreError::Missing { keys: missing });
    }
    if let Some(empty) = found.iter().find(|a| a.size == 0) {
      return Err(StoreError::EmptyArtifact {
        key: empty.key.to_string(),
      });
    }

    Ok(found)
  }

  /// Remove the store; its lifetime ends with the run
  pub fn discard(self) -> FanoutResult<()> {
    if self.root.exists() {
      fs::remove_dir_all(&self.root)
        .with_context(|| format!("Failed to remove artifact store {}", self.root.display()))?;
    }
    Ok(())
  }
}
