//! Shared data models for the vidforge rendering pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and chunk plans
//! - Render requests and per-chunk results
//! - Render progress snapshots
//! - Generation provider capabilities
//! - Regeneration attempts and strategies

pub mod chunk;
pub mod complexity;
pub mod provider;
pub mod regen;
pub mod render;
pub mod scene;

// Re-export common types
pub use chunk::{ChunkPlan, ChunkScene};
pub use complexity::{ComplexityAnalysis, ComplexityClass};
pub use provider::{
    ConsistencyTier, MotionQuality, ProviderCatalog, ProviderId, ProviderProfile,
};
pub use regen::{
    AttemptOutcome, MotionIntensity, RegenerationApproach, RegenerationAttempt,
    RegenerationStrategy, StrategyAdjustments,
};
pub use render::{ChunkContext, ChunkRenderResult, RenderPhase, RenderProgress, RenderRequest};
pub use scene::{Scene, SceneArchetype};
