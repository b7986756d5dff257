//! Chunk plan models.
//!
//! A chunk is a contiguous, time-bounded sub-sequence of scenes rendered
//! as one independent unit of remote work. Chunk plans are derived by the
//! planner and never persisted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Scene;

/// A scene placed inside a chunk, with chunk-relative timing.
///
/// A renderer processing one chunk in isolation restarts its internal
/// clock at zero, so the scene's global frame position is rebased here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkScene {
    /// The scene itself, unchanged
    pub scene: Scene,

    /// Start frame relative to the chunk (first scene starts at 0)
    pub start_frame: u64,

    /// Scene length in frames at the plan's frame rate
    pub duration_frames: u64,
}

/// A renderable partition of the scene timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkPlan {
    /// Zero-based chunk index
    pub index: usize,

    /// First frame of the chunk on the global timeline
    pub start_frame: u64,

    /// Last frame of the chunk on the global timeline (inclusive)
    pub end_frame: u64,

    /// Chunk start time in seconds on the global timeline
    pub start_seconds: f64,

    /// Chunk end time in seconds on the global timeline
    pub end_seconds: f64,

    /// Ordered scenes assigned to this chunk, with rebased offsets
    pub scenes: Vec<ChunkScene>,
}

impl ChunkPlan {
    /// Total declared scene duration of this chunk, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.scenes.iter().map(|cs| cs.scene.duration_seconds).sum()
    }

    /// Chunk length in frames.
    pub fn duration_frames(&self) -> u64 {
        self.end_frame - self.start_frame + 1
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }
}
