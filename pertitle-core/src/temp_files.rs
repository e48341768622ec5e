//! Temporary file management utilities.
//!
//! Every encode produces an artifact that only lives for the duration of one
//! measurement. This module names those artifacts, creates work directories
//! for them and provides [`TempArtifact`], a guard that removes the file when
//! it goes out of scope, on the success path and on every error path.

use crate::config::CoreConfig;
use crate::error::CoreResult;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// Creates a temporary directory with prefix. Auto-cleaned when dropped.
///
/// The directory is created under `config.temp_dir` when set, otherwise under
/// the system temporary directory.
pub fn create_temp_dir(config: &CoreConfig, prefix: &str) -> CoreResult<TempDir> {
    match config.temp_dir.as_ref() {
        Some(base) => {
            std::fs::create_dir_all(base)?;
            Ok(TempFileBuilder::new().prefix(prefix).tempdir_in(base)?)
        }
        None => Ok(TempFileBuilder::new().prefix(prefix).tempdir()?),
    }
}

/// Returns a temporary file path with random suffix. Does not create the file.
pub fn create_temp_file_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    use rand::distributions::Alphanumeric;
    use rand::{Rng, thread_rng};

    let random_suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    let filename = format!("{prefix}_{random_suffix}.{extension}");
    dir.join(filename)
}

/// Owns a measurement artifact and deletes it on drop.
///
/// A missing file is not an error: the encoder may have failed before
/// creating it. Dropping the guard ignores removal failures; call
/// [`TempArtifact::remove`] to observe them.
#[derive(Debug)]
pub struct TempArtifact {
    path: Option<PathBuf>,
}

impl TempArtifact {
    /// Takes ownership of the file at `path`.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Releases ownership without deleting the file.
    pub fn into_path(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }

    /// Deletes the artifact now and reports whether that worked.
    pub fn remove(mut self) -> std::io::Result<()> {
        match self.path.take() {
            Some(path) => remove_artifact(&path),
            None => Ok(()),
        }
    }
}

fn remove_artifact(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = remove_artifact(&path);
        }
    }
}
