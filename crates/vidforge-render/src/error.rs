//! Render pipeline error types.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Nothing to render: scene timeline is empty")]
    EmptyTimeline,

    #[error("Chunk {index} failed: {reason}")]
    ChunkFailed { index: usize, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] vidforge_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] vidforge_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn chunk_failed(index: usize, reason: impl Into<String>) -> Self {
        Self::ChunkFailed {
            index,
            reason: reason.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
