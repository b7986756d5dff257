//! Temp-file naming and cleanup helpers.
//!
//! The work directory is shared across concurrent renders on the same
//! host with no locking, so every local artifact name carries a per-run
//! token in addition to the chunk index.

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Unique token identifying one render run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunToken(String);

impl RunToken {
    /// Generate a fresh token.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local download path for one chunk artifact.
pub fn chunk_download_path(work_dir: &Path, token: &RunToken, chunk_index: usize) -> PathBuf {
    work_dir.join(format!("chunk_{}_{:03}.mp4", token, chunk_index))
}

/// Assembled output path for one run.
pub fn assembled_output_path(work_dir: &Path, token: &RunToken) -> PathBuf {
    work_dir.join(format!("assembled_{}.mp4", token))
}

/// Remove files, logging failures instead of propagating them.
///
/// Cleanup must never mask the error that ended a render, so a file that
/// cannot be removed is only worth a warning.
pub async fn remove_files_best_effort(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => tracing::debug!("Removed temp file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove temp file {}: {}", path.display(), e),
        }
    }
}
