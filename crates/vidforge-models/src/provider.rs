//! Generation provider capability table.
//!
//! Each external generation backend is described by a static capability
//! profile. The catalog is an immutable structure handed to the router at
//! construction time, so tests can inject synthetic backends.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Declared motion quality tier of a backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MotionQuality {
    Basic,
    Good,
    Excellent,
    Cinematic,
}

impl MotionQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionQuality::Basic => "basic",
            MotionQuality::Good => "good",
            MotionQuality::Excellent => "excellent",
            MotionQuality::Cinematic => "cinematic",
        }
    }

    /// Whether this tier is trusted with content flagged as near-impossible.
    pub fn is_high_tier(&self) -> bool {
        matches!(self, MotionQuality::Excellent | MotionQuality::Cinematic)
    }
}

/// Declared temporal consistency tier of a backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyTier {
    Low,
    Medium,
    High,
}

impl ConsistencyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyTier::Low => "low",
            ConsistencyTier::Medium => "medium",
            ConsistencyTier::High => "high",
        }
    }
}

/// Capability profile of one generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderProfile {
    /// Backend identifier
    pub id: ProviderId,

    /// Human-readable name
    pub display_name: String,

    /// Content classes this backend renders well (lowercase keywords)
    pub strengths: Vec<String>,

    /// Content classes this backend renders poorly (lowercase keywords)
    pub weaknesses: Vec<String>,

    /// Maximum duration of a single generation call, in seconds
    pub max_clip_seconds: f64,

    /// Motion quality tier
    pub motion: MotionQuality,

    /// Temporal consistency tier
    pub consistency: ConsistencyTier,

    /// Price per second of generated output, in credits
    pub price_per_second: f64,

    /// Whether the backend can generate synchronized audio
    pub supports_audio: bool,

    /// Whether the backend accepts an image as a visual reference
    pub supports_image_reference: bool,
}

/// Immutable collection of provider profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderCatalog {
    providers: Vec<ProviderProfile>,
}

impl ProviderCatalog {
    /// Create a catalog from explicit profiles.
    pub fn new(providers: Vec<ProviderProfile>) -> Self {
        Self { providers }
    }

    /// The default production catalog.
    pub fn builtin() -> Self {
        Self::new(vec![
            ProviderProfile {
                id: ProviderId::new("runway_gen3"),
                display_name: "Runway Gen-3".to_string(),
                strengths: vec![
                    "cinematic".into(),
                    "camera movement".into(),
                    "people".into(),
                    "urban".into(),
                    "dramatic lighting".into(),
                ],
                weaknesses: vec!["text".into(), "logo".into()],
                max_clip_seconds: 10.0,
                motion: MotionQuality::Cinematic,
                consistency: ConsistencyTier::High,
                price_per_second: 0.50,
                supports_audio: false,
                supports_image_reference: true,
            },
            ProviderProfile {
                id: ProviderId::new("kling"),
                display_name: "Kling".to_string(),
                strengths: vec![
                    "people".into(),
                    "faces".into(),
                    "food".into(),
                    "nature".into(),
                ],
                weaknesses: vec!["fast motion".into(), "text".into()],
                max_clip_seconds: 10.0,
                motion: MotionQuality::Excellent,
                consistency: ConsistencyTier::High,
                price_per_second: 0.35,
                supports_audio: false,
                supports_image_reference: true,
            },
            ProviderProfile {
                id: ProviderId::new("luma_dream_machine"),
                display_name: "Luma Dream Machine".to_string(),
                strengths: vec![
                    "product".into(),
                    "objects".into(),
                    "smooth motion".into(),
                    "interior".into(),
                ],
                weaknesses: vec!["crowds".into(), "hands".into()],
                max_clip_seconds: 9.0,
                motion: MotionQuality::Excellent,
                consistency: ConsistencyTier::Medium,
                price_per_second: 0.30,
                supports_audio: false,
                supports_image_reference: true,
            },
            ProviderProfile {
                id: ProviderId::new("pika"),
                display_name: "Pika".to_string(),
                strengths: vec![
                    "animation".into(),
                    "stylized".into(),
                    "abstract".into(),
                ],
                weaknesses: vec!["photorealism".into(), "faces".into()],
                max_clip_seconds: 6.0,
                motion: MotionQuality::Good,
                consistency: ConsistencyTier::Medium,
                price_per_second: 0.15,
                supports_audio: false,
                supports_image_reference: true,
            },
            ProviderProfile {
                id: ProviderId::new("hailuo"),
                display_name: "Hailuo MiniMax".to_string(),
                strengths: vec![
                    "people".into(),
                    "gestures".into(),
                    "dialogue".into(),
                ],
                weaknesses: vec!["landscapes".into(), "water".into()],
                max_clip_seconds: 6.0,
                motion: MotionQuality::Good,
                consistency: ConsistencyTier::Medium,
                price_per_second: 0.12,
                supports_audio: true,
                supports_image_reference: false,
            },
            ProviderProfile {
                id: ProviderId::new("stable_video"),
                display_name: "Stable Video Diffusion".to_string(),
                strengths: vec!["textures".into(), "static scenes".into()],
                weaknesses: vec!["people".into(), "complex motion".into()],
                max_clip_seconds: 4.0,
                motion: MotionQuality::Basic,
                consistency: ConsistencyTier::Low,
                price_per_second: 0.05,
                supports_audio: false,
                supports_image_reference: true,
            },
        ])
    }

    pub fn get(&self, id: &ProviderId) -> Option<&ProviderProfile> {
        self.providers.iter().find(|p| &p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderProfile> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers that accept an image as a visual reference.
    pub fn image_reference_capable(&self) -> impl Iterator<Item = &ProviderProfile> {
        self.providers.iter().filter(|p| p.supports_image_reference)
    }

    /// The most temporally stable provider (ties broken by lower price).
    pub fn most_stable(&self) -> Option<&ProviderProfile> {
        self.providers.iter().max_by(|a, b| {
            a.consistency
                .cmp(&b.consistency)
                .then(b.price_per_second.total_cmp(&a.price_per_second))
        })
    }

    /// The provider with the best motion quality (ties broken by consistency).
    pub fn premium(&self) -> Option<&ProviderProfile> {
        self.providers
            .iter()
            .max_by(|a, b| a.motion.cmp(&b.motion).then(a.consistency.cmp(&b.consistency)))
    }
}
