//! Complexity analysis results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ProviderId;

/// How hard a visual direction is for a generative backend to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityClass {
    /// Well within every backend's capability
    Simple,
    /// Renders, but quality varies strongly by backend
    Complex,
    /// Likely to fail or look wrong on any backend
    Impossible,
}

impl ComplexityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityClass::Simple => "simple",
            ComplexityClass::Complex => "complex",
            ComplexityClass::Impossible => "impossible",
        }
    }
}

impl std::fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of the complexity analyzer for one visual direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComplexityAnalysis {
    /// Overall classification
    pub class: ComplexityClass,

    /// Difficulty score in [0,1] backing the classification
    pub score: f32,

    /// A simplified variant of the direction that is safer to generate
    pub simplified_prompt: String,

    /// Backends expected to handle this content well
    pub recommended: Vec<ProviderId>,

    /// Backends expected to handle this content poorly
    pub avoid: Vec<ProviderId>,

    /// Which difficulty signals fired (for reasoning output)
    pub signals: Vec<String>,
}

impl ComplexityAnalysis {
    pub fn is_impossible(&self) -> bool {
        self.class == ComplexityClass::Impossible
    }

    pub fn is_simple(&self) -> bool {
        self.class == ComplexityClass::Simple
    }
}
