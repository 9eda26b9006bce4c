//! Release Publisher: the fan-in consumer
//!
//! Runs only for a matching tag push and only once every platform key is in
//! the store. Artifacts are copied into one directory per platform, the
//! bundle is assembled from the fixed file list and the API is called once.
//!
//! A successful publish consumes the store, so the same blobs can never go
//! out under a second tag.

use crate::core::error::{FanoutResult, ResultExt};
use crate::platform::all_keys;
use crate::release::bundle::ReleaseBundle;
use crate::release::github::{PublishedRelease, ReleaseApi};
use crate::release::notes::ReleaseNotes;
use crate::release::trigger::{TagPattern, TriggerEvent, release_tag};
use crate::store::{ArtifactStore, StoredArtifact};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Publisher<'a> {
  api: &'a dyn ReleaseApi,
  program: String,
  pattern: TagPattern,
  release_dir: PathBuf,
  notes: ReleaseNotes,
}

impl<'a> Publisher<'a> {
  pub fn new(
    api: &'a dyn ReleaseApi,
    program: impl Into<String>,
    pattern: TagPattern,
    release_dir: &Path,
    notes: ReleaseNotes,
  ) -> Self {
    Self {
      api,
      program: program.into(),
      pattern,
      release_dir: release_dir.to_path_buf(),
      notes,
    }
  }

  /// Trigger guard, then join, then release. The store is discarded once
  /// the release exists and kept on failure so the publish can be retried.
  pub fn publish(&self, event: &TriggerEvent, store: ArtifactStore) -> FanoutResult<PublishedRelease> {
    let tag = release_tag(event, &self.pattern)?;
    let artifacts = self.collect(&store)?;
    let release = self.release(tag, &artifacts)?;
    store.discard()?;
    Ok(release)
  }

  /// The join: every platform key must be present and non-empty
  pub fn collect(&self, store: &ArtifactStore) -> FanoutResult<Vec<StoredArtifact>> {
    let keys = all_keys(&self.program);
    let artifacts = store.get_all(&keys)?;
    log::debug!("collected {} artifacts from {}", artifacts.len(), store.root().display());
    Ok(artifacts)
  }

  /// Retrieve into per-platform directories and create the release
  pub fn release(&self, tag: &str, artifacts: &[StoredArtifact]) -> FanoutResult<PublishedRelease> {
    // Only the per-key directories are ours; the rest of release_dir is left alone
    for key in all_keys(&self.program) {
      let dir = self.release_dir.join(key.as_str());
      if dir.exists() {
        fs::remove_dir_all(&dir).with_context(|| format!("Failed to clear {}", dir.display()))?;
      }
    }
    for artifact in artifacts {
      let dest = artifact.retrieve_into(&self.release_dir)?;
      log::debug!("retrieved {} to {}", artifact.key, dest.display());
    }

    let bundle = ReleaseBundle::assemble(tag, &self.program, &self.release_dir, self.notes.clone())?;
    println!("🚀 Creating draft release {} with {} files", bundle.tag, bundle.files.len());
    let release = self.api.create_release(&bundle)?;
    Ok(release)
  }

  /// The bundle a publish for `tag` would send, for dry runs
  pub fn planned_bundle(&self, tag: &str) -> ReleaseBundle {
    ReleaseBundle::planned(tag, &self.program, &self.release_dir, self.notes.clone())
  }
}
