//! Chunk planning.
//!
//! Partitions an ordered scene list into time-bounded chunks. Chunk
//! boundaries only ever fall between scenes; a single scene longer than
//! the budget becomes its own oversized chunk rather than being split.

use tracing::debug;

use vidforge_models::{ChunkPlan, ChunkScene, Scene};

/// Whether a timeline is long enough to warrant chunking at all.
///
/// Short videos render as one unit, skipping chunk/reassembly overhead.
pub fn needs_chunking(total_seconds: f64, threshold_seconds: f64) -> bool {
    total_seconds > threshold_seconds
}

/// Partition scenes into chunks of at most `max_chunk_seconds` declared
/// duration.
///
/// The threshold is exclusive: a scene is appended while the accumulated
/// duration stays at or under the budget, and the chunk closes only when
/// appending would push it strictly over while already holding at least
/// one scene. Deterministic; an empty scene list yields an empty plan.
pub fn plan_chunks(scenes: &[Scene], fps: u32, max_chunk_seconds: f64) -> Vec<ChunkPlan> {
    let mut chunks: Vec<ChunkPlan> = Vec::new();

    let mut current: Vec<ChunkScene> = Vec::new();
    let mut current_seconds = 0.0f64;
    let mut current_frames = 0u64;

    // Global counters keep chunk ranges continuous across the timeline
    let mut global_frame = 0u64;

    for scene in scenes {
        if !current.is_empty() && current_seconds + scene.duration_seconds > max_chunk_seconds {
            global_frame = close_chunk(
                &mut chunks,
                std::mem::take(&mut current),
                global_frame,
                current_frames,
                fps,
            );
            current_seconds = 0.0;
            current_frames = 0;
        }

        let duration_frames = scene.duration_frames(fps);
        current.push(ChunkScene {
            scene: scene.clone(),
            start_frame: current_frames,
            duration_frames,
        });
        current_frames += duration_frames;
        current_seconds += scene.duration_seconds;
    }

    if !current.is_empty() {
        close_chunk(&mut chunks, current, global_frame, current_frames, fps);
    }

    debug!(
        scene_count = scenes.len(),
        chunk_count = chunks.len(),
        max_chunk_seconds,
        "Planned chunks"
    );

    chunks
}

/// Seal the accumulated scenes into a chunk; returns the next global frame.
fn close_chunk(
    chunks: &mut Vec<ChunkPlan>,
    scenes: Vec<ChunkScene>,
    global_frame: u64,
    chunk_frames: u64,
    fps: u32,
) -> u64 {
    let end_frame = global_frame + chunk_frames - 1;
    chunks.push(ChunkPlan {
        index: chunks.len(),
        start_frame: global_frame,
        end_frame,
        start_seconds: global_frame as f64 / fps as f64,
        end_seconds: (end_frame + 1) as f64 / fps as f64,
        scenes,
    });
    global_frame + chunk_frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidforge_models::SceneArchetype;

    fn scene(id: &str, duration: f64) -> Scene {
        Scene {
            id: id.to_string(),
            duration_seconds: duration,
            archetype: SceneArchetype::Broll,
            visual_direction: "test".to_string(),
            media_url: None,
        }
    }

    fn scenes(durations: &[f64]) -> Vec<Scene> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| scene(&format!("s{}", i), *d))
            .collect()
    }

    /// Flatten a plan back to the scene ids it covers, in order.
    fn covered_ids(chunks: &[ChunkPlan]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| c.scenes.iter().map(|cs| cs.scene.id.clone()))
            .collect()
    }

    #[test]
    fn test_empty_scene_list_yields_empty_plan() {
        assert!(plan_chunks(&[], 30, 90.0).is_empty());
    }

    #[test]
    fn test_short_timeline_is_one_chunk() {
        let chunks = plan_chunks(&scenes(&[20.0, 30.0, 15.0]), 30, 90.0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].scene_count(), 3);
        assert_eq!(chunks[0].start_frame, 0);
    }

    #[test]
    fn test_coverage_reproduces_scene_list_exactly() {
        let input = scenes(&[40.0, 35.0, 50.0, 10.0, 80.0, 5.0]);
        let chunks = plan_chunks(&input, 30, 90.0);
        let expected: Vec<String> = input.iter().map(|s| s.id.clone()).collect();
        assert_eq!(covered_ids(&chunks), expected);
    }

    #[test]
    fn test_duration_bound_holds_except_oversized_singletons() {
        let input = scenes(&[40.0, 35.0, 50.0, 10.0, 200.0, 5.0]);
        let chunks = plan_chunks(&input, 30, 90.0);
        for chunk in &chunks {
            let duration = chunk.duration_seconds();
            if duration > 90.0 {
                // Only a lone over-long scene may exceed the budget
                assert_eq!(chunk.scene_count(), 1);
                assert!(chunk.scenes[0].scene.duration_seconds > 90.0);
            }
        }
    }

    #[test]
    fn test_frame_contiguity_across_chunks() {
        let chunks = plan_chunks(&scenes(&[40.0, 35.0, 50.0, 10.0, 80.0]), 30, 90.0);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_frame, 0);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_frame + 1, pair[1].start_frame);
        }
        // Index order matches position
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_planning_is_idempotent() {
        let input = scenes(&[40.0, 35.0, 50.0, 10.0, 80.0, 5.0]);
        let a = plan_chunks(&input, 30, 90.0);
        let b = plan_chunks(&input, 30, 90.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fifty_fifty_fifty_at_ninety_splits_before_overflow() {
        // The break happens before appending the scene that would push a
        // non-empty chunk over the budget, so each 50s scene lands alone.
        let chunks = plan_chunks(&scenes(&[50.0, 50.0, 50.0]), 30, 90.0);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert_eq!(chunk.scene_count(), 1);
            assert!(chunk.duration_seconds() <= 90.0);
        }
    }

    #[test]
    fn test_exactly_at_threshold_stays_in_chunk() {
        // 45 + 45 == 90: the threshold is exclusive, so both scenes share
        // one chunk.
        let chunks = plan_chunks(&scenes(&[45.0, 45.0]), 30, 90.0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].scene_count(), 2);

        // One more second forces a split.
        let chunks = plan_chunks(&scenes(&[45.0, 46.0]), 30, 90.0);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_oversized_scene_is_never_split() {
        let chunks = plan_chunks(&scenes(&[200.0]), 30, 90.0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].scene_count(), 1);
        assert_eq!(chunks[0].end_frame, 200 * 30 - 1);
    }

    #[test]
    fn test_chunk_relative_offsets_restart_at_zero() {
        let chunks = plan_chunks(&scenes(&[40.0, 35.0, 50.0, 10.0]), 30, 90.0);
        for chunk in &chunks {
            assert_eq!(chunk.scenes[0].start_frame, 0);
            let mut expected = 0u64;
            for cs in &chunk.scenes {
                assert_eq!(cs.start_frame, expected);
                expected += cs.duration_frames;
            }
            // Relative frames sum to the chunk's global span
            assert_eq!(expected, chunk.duration_frames());
        }
    }

    #[test]
    fn test_needs_chunking_threshold() {
        assert!(!needs_chunking(90.0, 120.0));
        assert!(!needs_chunking(120.0, 120.0));
        assert!(needs_chunking(120.1, 120.0));
    }
}
