//! Render request, result, and progress models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ChunkPlan, Scene};

/// Default composition frame rate.
pub const DEFAULT_FPS: u32 = 30;
/// Default output width.
pub const DEFAULT_WIDTH: u32 = 1080;
/// Default output height.
pub const DEFAULT_HEIGHT: u32 = 1920;

/// Marker placing a render request inside a chunked render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkContext {
    /// Zero-based index of this chunk
    pub index: usize,
    /// Total number of chunks in the render
    pub total: usize,
}

/// Strongly-typed payload submitted to the remote rendering service.
///
/// Optional feature layers are explicit fields, and every retry mutation
/// is a named transformation rather than an ad hoc patch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderRequest {
    /// Remote composition to render
    pub composition_id: String,

    /// Ordered scene timeline
    pub scenes: Vec<Scene>,

    /// Composition frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Whether the ambient background-audio layer is rendered
    #[serde(default = "default_true")]
    pub ambient_audio: bool,

    /// Present when this request renders one chunk of a larger timeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkContext>,
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_true() -> bool {
    true
}

impl RenderRequest {
    /// Create a request with default composition parameters.
    pub fn new(composition_id: impl Into<String>, scenes: Vec<Scene>) -> Self {
        Self {
            composition_id: composition_id.into(),
            scenes,
            fps: DEFAULT_FPS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            ambient_audio: true,
            chunk: None,
        }
    }

    /// Total declared duration of the timeline, in seconds.
    pub fn total_duration_seconds(&self) -> f64 {
        crate::scene::total_duration_seconds(&self.scenes)
    }

    /// Derive the request for one chunk: shared composition parameters,
    /// scene list overridden with the chunk's own scenes, chunk marker set.
    pub fn for_chunk(&self, plan: &ChunkPlan, total_chunks: usize) -> Self {
        Self {
            composition_id: self.composition_id.clone(),
            scenes: plan.scenes.iter().map(|cs| cs.scene.clone()).collect(),
            fps: self.fps,
            width: self.width,
            height: self.height,
            ambient_audio: self.ambient_audio,
            chunk: Some(ChunkContext {
                index: plan.index,
                total: total_chunks,
            }),
        }
    }

    /// Named retry transformation: the same request with the ambient audio
    /// layer disabled. Used after the renderer reports an audio playback
    /// failure, where resubmitting the identical payload would reproduce
    /// the same failure.
    pub fn without_ambient_audio(&self) -> Self {
        Self {
            ambient_audio: false,
            ..self.clone()
        }
    }
}

/// Outcome of rendering one chunk.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChunkRenderResult {
    /// Which chunk this result belongs to
    pub chunk_index: usize,

    /// Whether the chunk rendered successfully
    pub success: bool,

    /// Remote artifact location when successful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,

    /// Local path once the artifact has been downloaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,

    /// Wall-clock render duration in seconds
    pub render_seconds: f64,

    /// Last error when the chunk failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChunkRenderResult {
    pub fn succeeded(chunk_index: usize, artifact_url: String, render_seconds: f64) -> Self {
        Self {
            chunk_index,
            success: true,
            artifact_url: Some(artifact_url),
            local_path: None,
            render_seconds,
            error: None,
        }
    }

    pub fn failed(chunk_index: usize, error: impl Into<String>, render_seconds: f64) -> Self {
        Self {
            chunk_index,
            success: false,
            artifact_url: None,
            local_path: None,
            render_seconds,
            error: Some(error.into()),
        }
    }
}

/// Discrete phase of a long-video render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    Preparing,
    Rendering,
    Downloading,
    Concatenating,
    Uploading,
    Complete,
    Error,
}

impl RenderPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderPhase::Preparing => "preparing",
            RenderPhase::Rendering => "rendering",
            RenderPhase::Downloading => "downloading",
            RenderPhase::Concatenating => "concatenating",
            RenderPhase::Uploading => "uploading",
            RenderPhase::Complete => "complete",
            RenderPhase::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderPhase::Complete | RenderPhase::Error)
    }
}

impl std::fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transient status snapshot emitted to a progress sink.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderProgress {
    /// Current phase
    pub phase: RenderPhase,

    /// Total chunks in this render
    pub total_chunks: u32,

    /// Chunks fully rendered so far
    pub completed_chunks: u32,

    /// Chunk currently in flight, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_chunk: Option<u32>,

    /// Overall completion in [0,100]
    pub percent: u8,

    /// Human-readable status line
    pub message: String,

    /// Root-cause message when `phase` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneArchetype;

    fn scene(id: &str, duration: f64) -> Scene {
        Scene {
            id: id.to_string(),
            duration_seconds: duration,
            archetype: SceneArchetype::Broll,
            visual_direction: "test".to_string(),
            media_url: None,
        }
    }

    #[test]
    fn test_without_ambient_audio_only_touches_audio() {
        let req = RenderRequest::new("promo", vec![scene("a", 5.0)]);
        assert!(req.ambient_audio);

        let muted = req.without_ambient_audio();
        assert!(!muted.ambient_audio);
        assert_eq!(muted.composition_id, req.composition_id);
        assert_eq!(muted.fps, req.fps);
        assert_eq!(muted.scenes.len(), 1);
    }

    #[test]
    fn test_for_chunk_overrides_scenes_and_sets_marker() {
        let req = RenderRequest::new("promo", vec![scene("a", 5.0), scene("b", 5.0)]);
        let plan = ChunkPlan {
            index: 1,
            start_frame: 150,
            end_frame: 299,
            start_seconds: 5.0,
            end_seconds: 10.0,
            scenes: vec![crate::ChunkScene {
                scene: scene("b", 5.0),
                start_frame: 0,
                duration_frames: 150,
            }],
        };

        let chunk_req = req.for_chunk(&plan, 2);
        assert_eq!(chunk_req.scenes.len(), 1);
        assert_eq!(chunk_req.scenes[0].id, "b");
        let ctx = chunk_req.chunk.unwrap();
        assert_eq!(ctx.index, 1);
        assert_eq!(ctx.total, 2);
        // Shared parameters carry over untouched
        assert_eq!(chunk_req.width, req.width);
    }

    #[test]
    fn test_request_wire_format_omits_absent_chunk_marker() {
        let req = RenderRequest::new("promo", vec![scene("a", 5.0)]);
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("chunk").is_none());
        assert_eq!(value["ambient_audio"], serde_json::Value::Bool(true));

        // Defaults fill in when the wire omits optional fields
        let parsed: RenderRequest = serde_json::from_str(
            r#"{"composition_id":"promo","scenes":[]}"#,
        )
        .unwrap();
        assert_eq!(parsed.fps, DEFAULT_FPS);
        assert!(parsed.ambient_audio);
    }

    #[test]
    fn test_chunk_result_constructors() {
        let ok = ChunkRenderResult::succeeded(0, "https://x/0.mp4".to_string(), 12.0);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let bad = ChunkRenderResult::failed(3, "rate exceeded", 80.0);
        assert!(!bad.success);
        assert_eq!(bad.chunk_index, 3);
        assert!(bad.artifact_url.is_none());
    }
}
