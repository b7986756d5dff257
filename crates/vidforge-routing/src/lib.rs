//! Generation-provider routing and regeneration strategy.
//!
//! Everything in this crate is a pure, deterministic decision function
//! over an injected provider capability catalog: no I/O, no persistence,
//! no hidden state. The orchestration loop that actually calls backends
//! lives elsewhere; it records each outcome as a `RegenerationAttempt`
//! and asks again.

pub mod complexity;
pub mod router;
pub mod strategy;

pub use complexity::ComplexityAnalyzer;
pub use router::{ProviderRouter, RankedAlternative, RoutingDecision};
pub use strategy::{analyze_failure_patterns, FailurePatterns, RegenerationStrategyEngine};
