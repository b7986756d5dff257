//! Render pipeline configuration.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum declared scene duration per chunk, in seconds
    pub max_chunk_seconds: f64,
    /// Timelines longer than this render chunked; at or under it they
    /// render as a single unit
    pub long_video_threshold_seconds: f64,
    /// Work directory for temporary files
    pub work_dir: String,
    /// Fixed interval between remote progress polls
    pub poll_interval: Duration,
    /// Overall deadline for one remote render job
    pub poll_timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_chunk_seconds: 120.0,
            // A video that fits in one chunk renders as a single unit
            long_video_threshold_seconds: 120.0,
            work_dir: "/tmp/vidforge".to_string(),
            poll_interval: Duration::from_secs(2),
            poll_timeout: Duration::from_secs(900),
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let max_chunk_seconds = std::env::var("VIDFORGE_MAX_CHUNK_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120.0);

        Self {
            max_chunk_seconds,
            long_video_threshold_seconds: std::env::var("VIDFORGE_LONG_VIDEO_THRESHOLD_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(max_chunk_seconds),
            work_dir: std::env::var("VIDFORGE_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/vidforge".to_string()),
            poll_interval: Duration::from_secs(
                std::env::var("VIDFORGE_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            poll_timeout: Duration::from_secs(
                std::env::var("VIDFORGE_POLL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
        }
    }
}
