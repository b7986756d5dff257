//! Per-scene regeneration strategy engine.
//!
//! A state machine keyed by attempt count for a single scene. The engine
//! never performs generation or I/O itself: the orchestration loop calls
//! the chosen backend, records the outcome as a `RegenerationAttempt`,
//! and asks again with the full history.

use std::collections::HashSet;

use vidforge_models::{
    MotionIntensity, ProviderCatalog, ProviderId, RegenerationApproach, RegenerationAttempt,
    RegenerationStrategy, Scene, StrategyAdjustments,
};

use crate::router::ProviderRouter;

/// Confidence for a first attempt at simple content.
const FIRST_SIMPLE_CONFIDENCE: f32 = 0.8;
/// Confidence for a first attempt at complex content.
const FIRST_COMPLEX_CONFIDENCE: f32 = 0.6;
/// Confidence when content is classified near-impossible up front.
const IMPOSSIBLE_CONFIDENCE: f32 = 0.4;
/// Confidence for a reference-based refinement after one failure.
const REFERENCE_CONFIDENCE: f32 = 0.65;
/// Confidence for a backend switch after one failure.
const SWITCH_CONFIDENCE: f32 = 0.6;
/// Confidence for a stabilized reference attempt after two failures.
const STABLE_REFERENCE_CONFIDENCE: f32 = 0.5;
/// Confidence for a drastic prompt simplification after two failures.
const DRASTIC_SIMPLIFY_CONFIDENCE: f32 = 0.4;
/// Confidence for the final premium reference attempt.
const FINAL_REFERENCE_CONFIDENCE: f32 = 0.35;
/// Confidence that sourcing licensed footage is the right call.
const SOURCE_FOOTAGE_CONFIDENCE: f32 = 0.8;

/// An issue is "recurring" once it shows up this many times.
const RECURRING_THRESHOLD: usize = 2;

/// Repeating-issue summary across an attempt history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailurePatterns {
    /// Normalized issues seen at least twice
    pub recurring: Vec<String>,
    /// Attempts whose output was flawed but usable
    pub partial_count: usize,
}

/// Strip a leading severity tag and normalize for counting.
fn normalize_issue(issue: &str) -> String {
    let trimmed = issue.trim().to_lowercase();
    for tag in ["critical:", "major:", "minor:", "warning:"] {
        if let Some(rest) = trimmed.strip_prefix(tag) {
            return rest.trim().to_string();
        }
    }
    trimmed
}

/// Count normalized issues across all attempts; anything seen twice or
/// more is recurring and biases the next strategy away from a verbatim
/// retry.
pub fn analyze_failure_patterns(history: &[RegenerationAttempt]) -> FailurePatterns {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for attempt in history {
        for issue in &attempt.issues {
            let normalized = normalize_issue(issue);
            if normalized.is_empty() {
                continue;
            }
            match counts.iter_mut().find(|(k, _)| *k == normalized) {
                Some((_, n)) => *n += 1,
                None => counts.push((normalized, 1)),
            }
        }
    }

    FailurePatterns {
        recurring: counts
            .into_iter()
            .filter(|(_, n)| *n >= RECURRING_THRESHOLD)
            .map(|(k, _)| k)
            .collect(),
        partial_count: history.iter().filter(|a| a.has_usable_artifact()).count(),
    }
}

/// Decides what to try next for a scene that keeps failing to generate.
#[derive(Debug, Clone)]
pub struct RegenerationStrategyEngine {
    router: ProviderRouter,
}

impl RegenerationStrategyEngine {
    pub fn new(catalog: ProviderCatalog) -> Self {
        Self {
            router: ProviderRouter::new(catalog),
        }
    }

    /// Compute the strategy for the next attempt.
    ///
    /// Pure function of (history, complexity analysis, current prompt,
    /// last output reference); recomputed fresh every call.
    pub fn next_strategy(
        &self,
        scene: &Scene,
        current_prompt: &str,
        history: &[RegenerationAttempt],
    ) -> RegenerationStrategy {
        let analysis = self.router.analyzer().analyze(current_prompt);

        match history.len() {
            0 => self.first_attempt(scene, current_prompt, &analysis),
            1 => self.after_first_failure(scene, current_prompt, history, &analysis),
            2 => self.after_second_failure(history, &analysis),
            n => self.final_attempts(n, history),
        }
    }

    fn first_attempt(
        &self,
        scene: &Scene,
        current_prompt: &str,
        analysis: &vidforge_models::ComplexityAnalysis,
    ) -> RegenerationStrategy {
        if analysis.is_impossible() {
            let decision = self.router.route_with_analysis(
                &analysis.simplified_prompt,
                scene.archetype,
                None,
                analysis,
            );
            return RegenerationStrategy {
                approach: RegenerationApproach::SimplifyPrompt,
                adjustments: StrategyAdjustments {
                    prompt: Some(analysis.simplified_prompt.clone()),
                    provider: Some(decision.provider),
                    ..Default::default()
                },
                reasoning: format!(
                    "Direction hits known-unreliable content ({}); starting from a simplified prompt",
                    analysis.signals.join(", ")
                ),
                confidence: IMPOSSIBLE_CONFIDENCE,
                warning: Some(
                    "This content may exceed what any generation backend can render faithfully; \
                     licensed stock footage is a safer fallback"
                        .to_string(),
                ),
            };
        }

        let decision =
            self.router
                .route_with_analysis(current_prompt, scene.archetype, None, analysis);
        let confidence = if analysis.is_simple() {
            FIRST_SIMPLE_CONFIDENCE
        } else {
            FIRST_COMPLEX_CONFIDENCE
        };

        RegenerationStrategy {
            approach: RegenerationApproach::Retry,
            adjustments: StrategyAdjustments {
                provider: Some(decision.provider.clone()),
                ..Default::default()
            },
            reasoning: format!(
                "First attempt on {} ({})",
                decision.provider,
                decision.reasoning.join("; ")
            ),
            confidence,
            warning: None,
        }
    }

    fn after_first_failure(
        &self,
        scene: &Scene,
        current_prompt: &str,
        history: &[RegenerationAttempt],
        analysis: &vidforge_models::ComplexityAnalysis,
    ) -> RegenerationStrategy {
        let patterns = analyze_failure_patterns(history);
        let tried: HashSet<&ProviderId> = history.iter().map(|a| &a.provider).collect();

        if let Some(anchor) = last_usable_artifact(history) {
            let provider = self
                .pick_reference_provider(current_prompt, scene, analysis, &tried)
                .unwrap_or_else(|| anchor.provider.clone());
            return RegenerationStrategy {
                approach: RegenerationApproach::UseReference,
                adjustments: StrategyAdjustments {
                    provider: Some(provider),
                    use_reference: true,
                    reference_url: anchor.output_url.clone(),
                    ..Default::default()
                },
                reasoning: "Previous output is usable as a visual anchor; refining instead of regenerating from scratch"
                    .to_string(),
                confidence: REFERENCE_CONFIDENCE,
                warning: None,
            };
        }

        let decision =
            self.router
                .route_with_analysis(current_prompt, scene.archetype, None, analysis);
        let provider = std::iter::once(&decision.provider)
            .chain(decision.alternatives.iter().map(|a| &a.provider))
            .find(|p| !tried.contains(p))
            .cloned()
            .or_else(|| self.router.catalog().most_stable().map(|p| p.id.clone()))
            .unwrap_or_else(|| decision.provider.clone());

        let (prompt, reasoning) = if patterns.recurring.is_empty() {
            (
                None,
                format!("Switching to {} after a failed attempt", provider),
            )
        } else {
            // A recurring issue means the prompt itself is the problem
            (
                Some(analysis.simplified_prompt.clone()),
                format!(
                    "Issue keeps recurring ({}); switching to {} with a simplified prompt",
                    patterns.recurring.join(", "),
                    provider
                ),
            )
        };

        RegenerationStrategy {
            approach: RegenerationApproach::SwitchProvider,
            adjustments: StrategyAdjustments {
                prompt,
                provider: Some(provider),
                ..Default::default()
            },
            reasoning,
            confidence: SWITCH_CONFIDENCE,
            warning: None,
        }
    }

    fn after_second_failure(
        &self,
        history: &[RegenerationAttempt],
        analysis: &vidforge_models::ComplexityAnalysis,
    ) -> RegenerationStrategy {
        let stable = self.router.catalog().most_stable().map(|p| p.id.clone());

        if let Some(anchor) = last_usable_artifact(history) {
            return RegenerationStrategy {
                approach: RegenerationApproach::UseReference,
                adjustments: StrategyAdjustments {
                    provider: stable,
                    use_reference: true,
                    reference_url: anchor.output_url.clone(),
                    motion_intensity: Some(MotionIntensity::Minimal),
                    ..Default::default()
                },
                reasoning:
                    "Two failures; anchoring on the best prior output with minimal motion on a stable backend"
                        .to_string(),
                confidence: STABLE_REFERENCE_CONFIDENCE,
                warning: None,
            };
        }

        RegenerationStrategy {
            approach: RegenerationApproach::SimplifyPrompt,
            adjustments: StrategyAdjustments {
                prompt: Some(analysis.simplified_prompt.clone()),
                provider: stable,
                ..Default::default()
            },
            reasoning: "Two failures with nothing usable; retrying a drastically simplified prompt on a stable backend"
                .to_string(),
            confidence: DRASTIC_SIMPLIFY_CONFIDENCE,
            warning: Some(
                "The simplified result may diverge from the original creative intent".to_string(),
            ),
        }
    }

    fn final_attempts(
        &self,
        attempts_so_far: usize,
        history: &[RegenerationAttempt],
    ) -> RegenerationStrategy {
        let anchor = last_usable_artifact(history);

        // One last automated try, only on the fourth attempt and only
        // with something to anchor on.
        if attempts_so_far == 3 {
            if let Some(anchor) = anchor {
                let premium = self.router.catalog().premium().map(|p| p.id.clone());
                return RegenerationStrategy {
                    approach: RegenerationApproach::UseReference,
                    adjustments: StrategyAdjustments {
                        provider: premium,
                        use_reference: true,
                        reference_url: anchor.output_url.clone(),
                        motion_intensity: Some(MotionIntensity::Subtle),
                        ..Default::default()
                    },
                    reasoning: "Final automated attempt: premium backend, subtle motion, anchored on the best prior output"
                        .to_string(),
                    confidence: FINAL_REFERENCE_CONFIDENCE,
                    warning: Some(
                        "This is the last automated attempt for this scene".to_string(),
                    ),
                };
            }
        }

        RegenerationStrategy {
            approach: RegenerationApproach::SourceFootage,
            adjustments: StrategyAdjustments::default(),
            reasoning: format!(
                "Generation abandoned after {} attempts; externally licensed footage will look better than another retry",
                attempts_so_far
            ),
            confidence: SOURCE_FOOTAGE_CONFIDENCE,
            warning: None,
        }
    }

    /// Best not-yet-tried backend that accepts an image reference.
    fn pick_reference_provider(
        &self,
        current_prompt: &str,
        scene: &Scene,
        analysis: &vidforge_models::ComplexityAnalysis,
        tried: &HashSet<&ProviderId>,
    ) -> Option<ProviderId> {
        let decision =
            self.router
                .route_with_analysis(current_prompt, scene.archetype, None, analysis);

        std::iter::once(&decision.provider)
            .chain(decision.alternatives.iter().map(|a| &a.provider))
            .find(|id| {
                !tried.contains(id)
                    && self
                        .router
                        .catalog()
                        .get(id)
                        .is_some_and(|p| p.supports_image_reference)
            })
            .cloned()
            .or_else(|| {
                self.router
                    .catalog()
                    .image_reference_capable()
                    .map(|p| p.id.clone())
                    .find(|id| !tried.contains(id))
            })
    }
}

/// Most recent attempt that left a usable artifact behind.
fn last_usable_artifact(history: &[RegenerationAttempt]) -> Option<&RegenerationAttempt> {
    history.iter().rev().find(|a| a.has_usable_artifact())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vidforge_models::{AttemptOutcome, ProviderCatalog, Scene, SceneArchetype};

    fn engine() -> RegenerationStrategyEngine {
        RegenerationStrategyEngine::new(ProviderCatalog::builtin())
    }

    fn scene(direction: &str) -> Scene {
        Scene {
            id: "scene-1".to_string(),
            duration_seconds: 6.0,
            archetype: SceneArchetype::Feature,
            visual_direction: direction.to_string(),
            media_url: None,
        }
    }

    fn failed_attempt(n: u32, provider: &str, issues: &[&str]) -> RegenerationAttempt {
        RegenerationAttempt {
            attempt: n,
            timestamp: Utc::now(),
            provider: provider.into(),
            prompt: "a cup of coffee".to_string(),
            outcome: AttemptOutcome::Failure,
            output_url: None,
            quality_score: None,
            issues: issues.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn partial_attempt(n: u32, provider: &str) -> RegenerationAttempt {
        RegenerationAttempt {
            attempt: n,
            timestamp: Utc::now(),
            provider: provider.into(),
            prompt: "a cup of coffee".to_string(),
            outcome: AttemptOutcome::Partial,
            output_url: Some(format!("https://cdn.example.com/attempt_{}.mp4", n)),
            quality_score: Some(0.5),
            issues: vec!["minor: slight flicker".to_string()],
        }
    }

    #[test]
    fn test_first_attempt_simple_content() {
        let s = scene("A cup of coffee on a wooden table");
        let strategy = engine().next_strategy(&s, &s.visual_direction, &[]);
        assert_eq!(strategy.approach, RegenerationApproach::Retry);
        assert!((strategy.confidence - 0.8).abs() < f32::EPSILON);
        assert!(strategy.adjustments.provider.is_some());
        assert!(strategy.warning.is_none());
    }

    #[test]
    fn test_first_attempt_complex_content_lowers_confidence() {
        let s = scene("Tracking shot of a runner sprinting through rain at night");
        let strategy = engine().next_strategy(&s, &s.visual_direction, &[]);
        assert_eq!(strategy.approach, RegenerationApproach::Retry);
        assert!((strategy.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_first_attempt_impossible_content_simplifies() {
        let s = scene("A morphing logo over a crowd waving banners with readable text");
        let strategy = engine().next_strategy(&s, &s.visual_direction, &[]);
        assert_eq!(strategy.approach, RegenerationApproach::SimplifyPrompt);
        assert!((strategy.confidence - 0.4).abs() < f32::EPSILON);
        assert!(strategy.warning.is_some());
        assert!(strategy.adjustments.prompt.is_some());
    }

    #[test]
    fn test_partial_output_prefers_reference_refinement() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![partial_attempt(0, "kling")];
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);

        assert_eq!(strategy.approach, RegenerationApproach::UseReference);
        assert!(strategy.adjustments.use_reference);
        assert_eq!(
            strategy.adjustments.reference_url.as_deref(),
            Some("https://cdn.example.com/attempt_0.mp4")
        );
        let provider = strategy.adjustments.provider.unwrap();
        assert!(ProviderCatalog::builtin()
            .get(&provider)
            .unwrap()
            .supports_image_reference);
    }

    #[test]
    fn test_hard_failure_switches_provider() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![failed_attempt(0, "luma_dream_machine", &[])];
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);

        assert_eq!(strategy.approach, RegenerationApproach::SwitchProvider);
        assert!((strategy.confidence - 0.6).abs() < f32::EPSILON);
        assert_ne!(
            strategy.adjustments.provider.unwrap().as_str(),
            "luma_dream_machine"
        );
    }

    #[test]
    fn test_recurring_issue_forces_prompt_change() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![failed_attempt(
            0,
            "kling",
            &["critical: warped geometry", "warped geometry"],
        )];
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);

        assert_eq!(strategy.approach, RegenerationApproach::SwitchProvider);
        assert!(strategy.adjustments.prompt.is_some());
        assert!(strategy.reasoning.contains("warped geometry"));
    }

    #[test]
    fn test_third_attempt_with_artifact_uses_stable_minimal_motion() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![partial_attempt(0, "kling"), failed_attempt(1, "runway_gen3", &[])];
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);

        assert_eq!(strategy.approach, RegenerationApproach::UseReference);
        assert_eq!(
            strategy.adjustments.motion_intensity,
            Some(MotionIntensity::Minimal)
        );
        assert!((strategy.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_third_attempt_without_artifact_simplifies_drastically() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![
            failed_attempt(0, "kling", &[]),
            failed_attempt(1, "runway_gen3", &[]),
        ];
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);

        assert_eq!(strategy.approach, RegenerationApproach::SimplifyPrompt);
        assert!((strategy.confidence - 0.4).abs() < f32::EPSILON);
        assert!(strategy.warning.is_some());
    }

    #[test]
    fn test_fourth_attempt_with_artifact_gets_final_premium_try() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![
            partial_attempt(0, "kling"),
            failed_attempt(1, "runway_gen3", &[]),
            failed_attempt(2, "luma_dream_machine", &[]),
        ];
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);

        assert_eq!(strategy.approach, RegenerationApproach::UseReference);
        assert_eq!(
            strategy.adjustments.motion_intensity,
            Some(MotionIntensity::Subtle)
        );
        assert!((strategy.confidence - 0.35).abs() < f32::EPSILON);
        assert!(strategy.warning.unwrap().contains("last automated attempt"));
    }

    #[test]
    fn test_fourth_attempt_without_artifact_abandons() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![
            failed_attempt(0, "kling", &[]),
            failed_attempt(1, "runway_gen3", &[]),
            failed_attempt(2, "luma_dream_machine", &[]),
        ];
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);

        assert_eq!(strategy.approach, RegenerationApproach::SourceFootage);
        assert!((strategy.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_confidence_never_exceeds_first_attempt_after_repeated_failures() {
        let s = scene("A cup of coffee on a wooden table");
        let mut history = Vec::new();
        for n in 0..6 {
            history.push(failed_attempt(n, "kling", &[]));
            if history.len() >= 3 {
                let strategy = engine().next_strategy(&s, &s.visual_direction, &history);
                assert!(strategy.confidence <= 0.8 + f32::EPSILON);
            }
        }
    }

    #[test]
    fn test_abandon_is_terminal_for_long_histories() {
        let s = scene("A cup of coffee on a wooden table");
        let history: Vec<_> = (0..5).map(|n| failed_attempt(n, "kling", &[])).collect();
        let strategy = engine().next_strategy(&s, &s.visual_direction, &history);
        assert_eq!(strategy.approach, RegenerationApproach::SourceFootage);
    }

    #[test]
    fn test_failure_pattern_normalization() {
        let history = vec![
            failed_attempt(0, "kling", &["critical: flickering edges", "minor: color shift"]),
            failed_attempt(1, "runway_gen3", &["Flickering edges"]),
        ];
        let patterns = analyze_failure_patterns(&history);
        assert_eq!(patterns.recurring, vec!["flickering edges".to_string()]);
        assert_eq!(patterns.partial_count, 0);
    }

    #[test]
    fn test_strategy_is_deterministic() {
        let s = scene("A cup of coffee on a wooden table");
        let history = vec![failed_attempt(0, "kling", &[])];
        let a = engine().next_strategy(&s, &s.visual_direction, &history);
        let b = engine().next_strategy(&s, &s.visual_direction, &history);
        assert_eq!(a.approach, b.approach);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.adjustments.provider, b.adjustments.provider);
    }
}
