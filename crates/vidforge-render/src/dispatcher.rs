//! Chunk render dispatch with rate-limit-aware retry.
//!
//! Each chunk is an independent unit of remote work. Within one chunk,
//! attempts are strictly sequential: a retry never starts before the
//! previous attempt's failure has been observed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use vidforge_models::{ChunkPlan, ChunkRenderResult, RenderRequest};

use crate::remote::{RemoteRenderError, RemoteRenderer};

/// Retry behavior for one chunk.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt ceiling, including the first attempt
    pub max_attempts: u32,
    /// Base delay for rate-limit backoff (doubles each attempt)
    pub base_delay: Duration,
    /// Cap on the rate-limit backoff delay
    pub max_delay: Duration,
    /// Fixed delay for transient, non-rate-limit failures
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            // High enough to ride out provider-side throttling
            max_delay: Duration::from_secs(60),
            transient_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the given retry (1-based), capped.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        delay.min(self.max_delay)
    }
}

/// Submits chunks to the remote renderer, retrying per failure class.
pub struct ChunkRenderDispatcher {
    renderer: Arc<dyn RemoteRenderer>,
    policy: RetryPolicy,
}

impl ChunkRenderDispatcher {
    pub fn new(renderer: Arc<dyn RemoteRenderer>, policy: RetryPolicy) -> Self {
        Self { renderer, policy }
    }

    /// Render one chunk to a terminal result.
    ///
    /// Never raises past its own boundary: after the retry budget is
    /// exhausted (or a fatal error), the failure is reported through the
    /// result's fields so the orchestrator decides what it means for the
    /// whole render.
    pub async fn render_chunk(
        &self,
        chunk: &ChunkPlan,
        shared: &RenderRequest,
        total_chunks: usize,
    ) -> ChunkRenderResult {
        let mut request = shared.for_chunk(chunk, total_chunks);
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.renderer.render(&request).await {
                Ok(output) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    info!(
                        chunk_index = chunk.index,
                        attempts = attempt,
                        render_seconds = elapsed,
                        "Chunk rendered"
                    );
                    return ChunkRenderResult::succeeded(chunk.index, output.artifact_url, elapsed);
                }
                Err(error) => {
                    if attempt >= self.policy.max_attempts || !error.is_retriable() {
                        let elapsed = started.elapsed().as_secs_f64();
                        warn!(
                            chunk_index = chunk.index,
                            attempts = attempt,
                            error = %error,
                            "Chunk render failed terminally"
                        );
                        return ChunkRenderResult::failed(chunk.index, error.to_string(), elapsed);
                    }

                    match error {
                        RemoteRenderError::RateLimited(ref message) => {
                            let delay = self.policy.delay_for_attempt(attempt);
                            warn!(
                                chunk_index = chunk.index,
                                attempt,
                                delay_secs = delay.as_secs_f64(),
                                "Rate limited: {}",
                                message
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RemoteRenderError::AudioPlayback(ref message) => {
                            // Resubmitting the identical payload would hit
                            // the same failure; drop the ambient layer.
                            warn!(
                                chunk_index = chunk.index,
                                attempt,
                                "Audio playback failure, disabling ambient audio: {}",
                                message
                            );
                            request = request.without_ambient_audio();
                        }
                        RemoteRenderError::Transient(ref message) => {
                            warn!(
                                chunk_index = chunk.index,
                                attempt,
                                delay_secs = self.policy.transient_delay.as_secs_f64(),
                                "Transient failure: {}",
                                message
                            );
                            tokio::time::sleep(self.policy.transient_delay).await;
                        }
                        RemoteRenderError::Fatal(_) => unreachable!("fatal handled above"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MockRemoteRenderer, RenderOutput};
    use std::sync::atomic::{AtomicU32, Ordering};
    use vidforge_models::{ChunkScene, Scene, SceneArchetype};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            transient_delay: Duration::from_millis(1),
        }
    }

    fn test_scene(id: &str) -> Scene {
        Scene {
            id: id.to_string(),
            duration_seconds: 5.0,
            archetype: SceneArchetype::Broll,
            visual_direction: "test".to_string(),
            media_url: None,
        }
    }

    fn test_chunk(index: usize) -> ChunkPlan {
        ChunkPlan {
            index,
            start_frame: 0,
            end_frame: 149,
            start_seconds: 0.0,
            end_seconds: 5.0,
            scenes: vec![ChunkScene {
                scene: test_scene("s0"),
                start_frame: 0,
                duration_frames: 150,
            }],
        }
    }

    fn shared_request() -> RenderRequest {
        RenderRequest::new("promo", vec![test_scene("s0"), test_scene("s1")])
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(6),
            transient_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(6));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_stops_at_attempt_ceiling() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let mut renderer = MockRemoteRenderer::new();
        renderer.expect_render().returning(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err(RemoteRenderError::RateLimited("rate exceeded".to_string()))
        });

        let dispatcher = ChunkRenderDispatcher::new(Arc::new(renderer), fast_policy());
        let result = dispatcher
            .render_chunk(&test_chunk(0), &shared_request(), 2)
            .await;

        assert!(!result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(result.error.unwrap().contains("rate exceeded"));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let mut renderer = MockRemoteRenderer::new();
        renderer.expect_render().returning(move |_| {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(RemoteRenderError::RateLimited("too many requests".to_string()))
            } else {
                Ok(RenderOutput {
                    artifact_url: "https://cdn.example.com/chunk_0.mp4".to_string(),
                })
            }
        });

        let dispatcher = ChunkRenderDispatcher::new(Arc::new(renderer), fast_policy());
        let result = dispatcher
            .render_chunk(&test_chunk(0), &shared_request(), 2)
            .await;

        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            result.artifact_url.as_deref(),
            Some("https://cdn.example.com/chunk_0.mp4")
        );
    }

    #[tokio::test]
    async fn test_audio_failure_disables_ambient_audio_on_retry() {
        let mut renderer = MockRemoteRenderer::new();
        renderer.expect_render().returning(|request| {
            if request.ambient_audio {
                Err(RemoteRenderError::AudioPlayback(
                    "cannot play audio".to_string(),
                ))
            } else {
                Ok(RenderOutput {
                    artifact_url: "https://cdn.example.com/muted.mp4".to_string(),
                })
            }
        });

        let dispatcher = ChunkRenderDispatcher::new(Arc::new(renderer), fast_policy());
        let result = dispatcher
            .render_chunk(&test_chunk(0), &shared_request(), 2)
            .await;

        assert!(result.success);
    }

    #[tokio::test]
    async fn test_fatal_error_fails_without_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let mut renderer = MockRemoteRenderer::new();
        renderer.expect_render().returning(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err(RemoteRenderError::Fatal("composition not found".to_string()))
        });

        let dispatcher = ChunkRenderDispatcher::new(Arc::new(renderer), fast_policy());
        let result = dispatcher
            .render_chunk(&test_chunk(0), &shared_request(), 2)
            .await;

        assert!(!result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chunk_request_carries_chunk_scenes() {
        let mut renderer = MockRemoteRenderer::new();
        renderer.expect_render().returning(|request| {
            // The chunk override replaces the full timeline
            assert_eq!(request.scenes.len(), 1);
            assert!(request.chunk.is_some());
            Ok(RenderOutput {
                artifact_url: "https://cdn.example.com/ok.mp4".to_string(),
            })
        });

        let dispatcher = ChunkRenderDispatcher::new(Arc::new(renderer), fast_policy());
        let result = dispatcher
            .render_chunk(&test_chunk(0), &shared_request(), 2)
            .await;
        assert!(result.success);
    }
}
