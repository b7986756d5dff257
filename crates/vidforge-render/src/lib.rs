//! Long-video chunked rendering pipeline.
//!
//! Splits a scene timeline into renderable chunks bounded by the remote
//! renderer's limits, dispatches each chunk with rate-limit-aware retry,
//! reassembles the artifacts losslessly, and uploads the result. Data
//! flows downstream only; no chunk depends on another chunk's output.

pub mod assembler;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod remote;

pub use assembler::{ArtifactStore, ChunkAssembler, R2ArtifactStore};
pub use config::RenderConfig;
pub use dispatcher::{ChunkRenderDispatcher, RetryPolicy};
pub use error::{RenderError, RenderResult};
pub use orchestrator::{ProgressCallback, RenderOrchestrator};
pub use planner::{needs_chunking, plan_chunks};
pub use remote::{HttpRenderClient, RemoteRenderError, RemoteRenderer, RenderOutput};
