//! Chunk artifact assembly.
//!
//! Downloads rendered chunk artifacts, concatenates them losslessly into
//! one continuous file, and uploads the result to durable storage.
//! No retry happens at this layer; retry policy belongs to the
//! dispatcher and orchestrator above it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use vidforge_media::temp::{chunk_download_path, RunToken};
use vidforge_storage::{fetch_url_to_file, render_output_key, ObjectStore, StorageError};

use crate::error::RenderResult;

/// Durable artifact storage as the assembler sees it.
///
/// A seam around the object store so pipeline tests can substitute a
/// local-filesystem double.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fetch a remote artifact into a local file.
    async fn fetch_artifact(&self, url: &str, dest: &Path) -> Result<(), StorageError>;

    /// Persist an assembled render; returns its public URL.
    async fn store_render(&self, path: &Path, project_id: &str) -> Result<String, StorageError>;
}

/// R2-backed artifact store.
///
/// URLs under our public base take the structured S3 path; anything else
/// falls back to a streaming HTTP GET.
pub struct R2ArtifactStore {
    store: ObjectStore,
}

impl R2ArtifactStore {
    pub fn new(store: ObjectStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ArtifactStore for R2ArtifactStore {
    async fn fetch_artifact(&self, url: &str, dest: &Path) -> Result<(), StorageError> {
        match self.store.key_for_url(url) {
            Some(key) => {
                debug!(key = %key, "Fetching artifact via object store");
                self.store.download_file(&key, dest).await
            }
            None => {
                debug!(url = %url, "Fetching artifact via direct HTTP");
                fetch_url_to_file(url, dest).await
            }
        }
    }

    async fn store_render(&self, path: &Path, project_id: &str) -> Result<String, StorageError> {
        let key = render_output_key(project_id, Utc::now().timestamp_millis());
        self.store.upload_file(path, &key, "video/mp4").await?;
        Ok(self.store.public_url(&key))
    }
}

/// Downloads, concatenates, and uploads one render's chunk artifacts.
pub struct ChunkAssembler<'a> {
    store: &'a dyn ArtifactStore,
    work_dir: PathBuf,
    token: RunToken,
}

impl<'a> ChunkAssembler<'a> {
    pub fn new(store: &'a dyn ArtifactStore, work_dir: impl Into<PathBuf>, token: RunToken) -> Self {
        Self {
            store,
            work_dir: work_dir.into(),
            token,
        }
    }

    /// Download one chunk artifact to its run-scoped local path.
    pub async fn download(&self, remote_url: &str, chunk_index: usize) -> RenderResult<PathBuf> {
        let dest = chunk_download_path(&self.work_dir, &self.token, chunk_index);
        self.store.fetch_artifact(remote_url, &dest).await?;
        info!(
            chunk_index,
            path = %dest.display(),
            "Downloaded chunk artifact"
        );
        Ok(dest)
    }

    /// Concatenate downloaded chunks, in order, without re-encoding.
    ///
    /// All-or-nothing: any failure propagates and no partial output is
    /// kept alive by this layer.
    pub async fn concatenate(&self, local_paths: &[PathBuf], output: &Path) -> RenderResult<()> {
        vidforge_media::concat_copy(local_paths, output).await?;
        Ok(())
    }

    /// Upload the assembled file; returns its public URL.
    pub async fn upload(&self, local_path: &Path, project_id: &str) -> RenderResult<String> {
        let url = self.store.store_render(local_path, project_id).await?;
        info!(project_id, url = %url, "Uploaded assembled render");
        Ok(url)
    }
}
