//! Regeneration attempt history and strategy models.
//!
//! One scene's regeneration loop accumulates `RegenerationAttempt`
//! records in memory; the strategy engine turns that history into a
//! `RegenerationStrategy` for the next try. Neither outlives the
//! request.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ProviderId;

/// Outcome classification of one generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Output accepted
    Success,
    /// Output unusable
    Failure,
    /// Output flawed but usable as a visual reference
    Partial,
}

/// One historical generation try for a scene.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegenerationAttempt {
    /// Zero-based attempt number
    pub attempt: u32,

    /// When the attempt finished
    pub timestamp: DateTime<Utc>,

    /// Backend used
    pub provider: ProviderId,

    /// Prompt text submitted
    pub prompt: String,

    /// Outcome classification
    pub outcome: AttemptOutcome,

    /// Artifact produced, if the backend returned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,

    /// Quality score in [0,1], when a review scored the output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,

    /// Detected issues, optionally prefixed with a severity tag
    /// (e.g. "critical: warped hands")
    #[serde(default)]
    pub issues: Vec<String>,
}

impl RegenerationAttempt {
    /// Whether this attempt left behind an artifact good enough to anchor
    /// a reference-based refinement.
    pub fn has_usable_artifact(&self) -> bool {
        self.output_url.is_some()
            && matches!(self.outcome, AttemptOutcome::Partial | AttemptOutcome::Success)
    }
}

/// The approach a regeneration strategy commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationApproach {
    /// Submit again without changes
    Retry,
    /// Submit a simplified prompt
    SimplifyPrompt,
    /// Refine using a prior output as a visual anchor
    UseReference,
    /// Move to a different backend
    SwitchProvider,
    /// Stop generating; source licensed footage instead
    SourceFootage,
}

impl RegenerationApproach {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerationApproach::Retry => "retry",
            RegenerationApproach::SimplifyPrompt => "simplify_prompt",
            RegenerationApproach::UseReference => "use_reference",
            RegenerationApproach::SwitchProvider => "switch_provider",
            RegenerationApproach::SourceFootage => "source_footage",
        }
    }
}

/// Requested motion intensity for a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MotionIntensity {
    Minimal,
    Subtle,
    Moderate,
    Dynamic,
}

/// Concrete parameter changes a strategy asks for.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StrategyAdjustments {
    /// Replacement prompt, when the strategy rewrites it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Backend to use for the next attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,

    /// Whether to anchor on a prior output
    #[serde(default)]
    pub use_reference: bool,

    /// The anchoring artifact, when `use_reference` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,

    /// Motion intensity override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_intensity: Option<MotionIntensity>,
}

/// The strategy engine's decision for the next attempt.
///
/// Recomputed fresh on every attempt from the full history; never stored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegenerationStrategy {
    /// Chosen approach
    pub approach: RegenerationApproach,

    /// Parameter changes to apply
    pub adjustments: StrategyAdjustments,

    /// Human-readable justification
    pub reasoning: String,

    /// Confidence in [0,1] that this attempt will produce usable output
    pub confidence: f32,

    /// User-facing caveat, when expectations should be lowered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_artifact_requires_output() {
        let mut attempt = RegenerationAttempt {
            attempt: 0,
            timestamp: Utc::now(),
            provider: ProviderId::new("kling"),
            prompt: "a cup of coffee".to_string(),
            outcome: AttemptOutcome::Partial,
            output_url: None,
            quality_score: None,
            issues: vec![],
        };
        assert!(!attempt.has_usable_artifact());

        attempt.output_url = Some("https://cdn.example.com/out.mp4".to_string());
        assert!(attempt.has_usable_artifact());

        attempt.outcome = AttemptOutcome::Failure;
        assert!(!attempt.has_usable_artifact());
    }
}
