//! Scene definitions.
//!
//! A scene is one narrative unit of a marketing video. Scenes are
//! immutable inputs to the pipeline; the chunk planner only reads
//! duration and order.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declared narrative role of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SceneArchetype {
    /// Attention-grabbing opener
    Hook,
    /// Pain point the product addresses
    Problem,
    /// How the product solves it
    Solution,
    /// Product feature showcase
    Feature,
    /// Customer testimonial
    Testimonial,
    /// Logos, ratings, press mentions
    SocialProof,
    /// Call to action
    Cta,
    /// Generic supporting footage
    #[default]
    Broll,
}

impl SceneArchetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneArchetype::Hook => "hook",
            SceneArchetype::Problem => "problem",
            SceneArchetype::Solution => "solution",
            SceneArchetype::Feature => "feature",
            SceneArchetype::Testimonial => "testimonial",
            SceneArchetype::SocialProof => "social_proof",
            SceneArchetype::Cta => "cta",
            SceneArchetype::Broll => "broll",
        }
    }

    /// Whether this archetype usually shows people talking to camera.
    ///
    /// Talking-head content is the hardest class for generative backends
    /// and biases routing toward high-consistency providers.
    pub fn is_talking_head(&self) -> bool {
        matches!(self, SceneArchetype::Testimonial | SceneArchetype::Hook)
    }
}

impl std::fmt::Display for SceneArchetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One narrative unit of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Stable scene identifier
    pub id: String,

    /// Declared duration in seconds
    pub duration_seconds: f64,

    /// Narrative role of the scene
    #[serde(default)]
    pub archetype: SceneArchetype,

    /// Free-text visual direction for the generation backend
    pub visual_direction: String,

    /// Previously generated media for this scene, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl Scene {
    /// Scene duration expressed in whole frames at the given frame rate.
    pub fn duration_frames(&self, fps: u32) -> u64 {
        (self.duration_seconds * fps as f64).round() as u64
    }
}

/// Total duration of an ordered scene list, in seconds.
pub fn total_duration_seconds(scenes: &[Scene]) -> f64 {
    scenes.iter().map(|s| s.duration_seconds).sum()
}
