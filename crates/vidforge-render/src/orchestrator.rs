//! Long-video render orchestration.
//!
//! Linear phase machine: preparing, rendering, downloading,
//! concatenating, uploading, complete, with error reachable from any
//! point. Every local temp file produced during a run is deleted on
//! every exit path, success or failure, to bound disk usage across
//! repeated renders on the same host.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tracing::{error, info};

use vidforge_media::temp::{assembled_output_path, remove_files_best_effort, RunToken};
use vidforge_models::{RenderPhase, RenderProgress, RenderRequest};

use crate::assembler::{ArtifactStore, ChunkAssembler};
use crate::config::RenderConfig;
use crate::dispatcher::ChunkRenderDispatcher;
use crate::error::{RenderError, RenderResult};
use crate::planner::{needs_chunking, plan_chunks};

/// Optional progress sink. Its absence changes nothing about the
/// pipeline's behavior.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send + Sync>;

/// Fixed percent allocation across phases.
const PERCENT_PREPARING: u8 = 5;
const PERCENT_RENDER_START: u8 = 10;
const PERCENT_RENDER_SPAN: u8 = 50;
const PERCENT_DOWNLOAD_START: u8 = 60;
const PERCENT_DOWNLOAD_SPAN: u8 = 15;
const PERCENT_CONCATENATING: u8 = 80;
const PERCENT_UPLOADING: u8 = 90;
const PERCENT_COMPLETE: u8 = 100;

/// Mutable progress counters threaded through the pipeline so a final
/// error snapshot can report how far the render got.
#[derive(Debug, Default)]
struct ProgressState {
    total_chunks: u32,
    completed_chunks: u32,
}

/// Sequences planning, dispatch, and assembly into one long-video render.
pub struct RenderOrchestrator {
    dispatcher: ChunkRenderDispatcher,
    store: Arc<dyn ArtifactStore>,
    config: RenderConfig,
}

impl RenderOrchestrator {
    pub fn new(
        dispatcher: ChunkRenderDispatcher,
        store: Arc<dyn ArtifactStore>,
        config: RenderConfig,
    ) -> Self {
        Self {
            dispatcher,
            store,
            config,
        }
    }

    /// Render the full timeline; returns the assembled video's public URL.
    pub async fn render_long_video(
        &self,
        project_id: &str,
        request: &RenderRequest,
        on_progress: Option<&ProgressCallback>,
    ) -> RenderResult<String> {
        let token = RunToken::new();
        let work_dir = PathBuf::from(&self.config.work_dir);
        fs::create_dir_all(&work_dir).await?;

        let mut temp_files: Vec<PathBuf> = Vec::new();
        let mut state = ProgressState::default();

        let result = self
            .run_pipeline(
                project_id,
                request,
                on_progress,
                &token,
                &work_dir,
                &mut temp_files,
                &mut state,
            )
            .await;

        // Cleanup is unconditional: downloaded chunks and the assembled
        // output never outlive the run, however it ended.
        remove_files_best_effort(&temp_files).await;

        match &result {
            Ok(url) => {
                info!(project_id, url = %url, "Long-video render complete");
            }
            Err(e) => {
                error!(project_id, error = %e, "Long-video render failed");
                emit(
                    on_progress,
                    RenderPhase::Error,
                    &state,
                    None,
                    PERCENT_COMPLETE,
                    format!("Render failed: {}", e),
                    Some(e.to_string()),
                );
            }
        }

        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_pipeline(
        &self,
        project_id: &str,
        request: &RenderRequest,
        on_progress: Option<&ProgressCallback>,
        token: &RunToken,
        work_dir: &std::path::Path,
        temp_files: &mut Vec<PathBuf>,
        state: &mut ProgressState,
    ) -> RenderResult<String> {
        if request.scenes.is_empty() {
            return Err(RenderError::EmptyTimeline);
        }

        emit(
            on_progress,
            RenderPhase::Preparing,
            state,
            None,
            PERCENT_PREPARING,
            "Planning render".to_string(),
            None,
        );

        let total_seconds = request.total_duration_seconds();
        let chunked = needs_chunking(total_seconds, self.config.long_video_threshold_seconds);

        // Short timelines render as a single unit: one remote job, no
        // concatenation overhead.
        let plans = if chunked {
            plan_chunks(&request.scenes, request.fps, self.config.max_chunk_seconds)
        } else {
            plan_chunks(&request.scenes, request.fps, f64::INFINITY)
        };
        state.total_chunks = plans.len() as u32;

        info!(
            project_id,
            total_seconds,
            chunk_count = plans.len(),
            chunked,
            "Planned long-video render"
        );

        let assembler = ChunkAssembler::new(self.store.as_ref(), work_dir, token.clone());

        // Rendering: chunks are independent, submitted sequentially, and
        // one irrecoverable chunk failure aborts the entire render.
        let mut results = Vec::with_capacity(plans.len());
        for plan in &plans {
            emit(
                on_progress,
                RenderPhase::Rendering,
                state,
                Some(plan.index as u32),
                rendering_percent(state.completed_chunks, state.total_chunks),
                format!("Rendering chunk {} of {}", plan.index + 1, plans.len()),
                None,
            );

            let result = self.dispatcher.render_chunk(plan, request, plans.len()).await;
            if !result.success {
                let reason = result
                    .error
                    .unwrap_or_else(|| "unknown render failure".to_string());
                return Err(RenderError::chunk_failed(plan.index, reason));
            }

            state.completed_chunks += 1;
            emit(
                on_progress,
                RenderPhase::Rendering,
                state,
                Some(plan.index as u32),
                rendering_percent(state.completed_chunks, state.total_chunks),
                format!("Rendered chunk {} of {}", plan.index + 1, plans.len()),
                None,
            );
            results.push(result);
        }

        // Downloading: artifacts come down only after every chunk has
        // rendered successfully.
        let mut local_paths = Vec::with_capacity(results.len());
        for (done, result) in results.iter().enumerate() {
            emit(
                on_progress,
                RenderPhase::Downloading,
                state,
                Some(result.chunk_index as u32),
                downloading_percent(done as u32, state.total_chunks),
                format!("Downloading chunk {} of {}", done + 1, results.len()),
                None,
            );

            let url = result
                .artifact_url
                .as_deref()
                .ok_or_else(|| {
                    RenderError::chunk_failed(result.chunk_index, "missing artifact URL")
                })?;

            // Track the destination before fetching so a partial download
            // still gets cleaned up.
            let dest =
                vidforge_media::temp::chunk_download_path(work_dir, token, result.chunk_index);
            temp_files.push(dest.clone());
            let local = assembler.download(url, result.chunk_index).await?;
            debug_assert_eq!(local, dest);
            local_paths.push(local);
        }

        // Single-unit renders skip concatenation entirely.
        let final_local = if local_paths.len() == 1 {
            local_paths[0].clone()
        } else {
            emit(
                on_progress,
                RenderPhase::Concatenating,
                state,
                None,
                PERCENT_CONCATENATING,
                format!("Concatenating {} chunks", local_paths.len()),
                None,
            );

            let output = assembled_output_path(work_dir, token);
            temp_files.push(output.clone());
            assembler.concatenate(&local_paths, &output).await?;
            output
        };

        emit(
            on_progress,
            RenderPhase::Uploading,
            state,
            None,
            PERCENT_UPLOADING,
            "Uploading assembled video".to_string(),
            None,
        );
        let url = assembler.upload(&final_local, project_id).await?;

        emit(
            on_progress,
            RenderPhase::Complete,
            state,
            None,
            PERCENT_COMPLETE,
            "Render complete".to_string(),
            None,
        );

        Ok(url)
    }
}

/// Rendering progress scales with the completed chunk fraction.
fn rendering_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return PERCENT_RENDER_START;
    }
    PERCENT_RENDER_START + (PERCENT_RENDER_SPAN as u32 * completed / total) as u8
}

/// Download progress scales across its own band.
fn downloading_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return PERCENT_DOWNLOAD_START;
    }
    PERCENT_DOWNLOAD_START + (PERCENT_DOWNLOAD_SPAN as u32 * completed / total) as u8
}

fn emit(
    on_progress: Option<&ProgressCallback>,
    phase: RenderPhase,
    state: &ProgressState,
    current_chunk: Option<u32>,
    percent: u8,
    message: String,
    error_message: Option<String>,
) {
    if let Some(callback) = on_progress {
        callback(RenderProgress {
            phase,
            total_chunks: state.total_chunks,
            completed_chunks: state.completed_chunks,
            current_chunk,
            percent,
            message,
            error: error_message,
        });
    }
}
