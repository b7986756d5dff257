//! Visual-direction complexity analysis.
//!
//! Generative video backends fail in predictable content classes:
//! legible on-screen text, finger-level hand detail, crowds, physical
//! transformations, and fluid/physics interactions. The analyzer scores
//! a direction against those classes and proposes a simplified variant
//! plus provider short-lists.

use vidforge_models::{
    ComplexityAnalysis, ComplexityClass, ProviderCatalog, ProviderId,
};

/// Content classes no current backend renders reliably.
const IMPOSSIBLE_SIGNALS: &[(&str, &[&str])] = &[
    (
        "legible text",
        &["text", "words", "writing", "typography", "lettering", "caption", "headline"],
    ),
    ("exact logo", &["logo", "brand mark", "trademark"]),
    (
        "hand detail",
        &["fingers", "typing", "hands holding", "fingernails", "sign language"],
    ),
    (
        "transformation",
        &["morph", "transforms into", "turning into", "shapeshift"],
    ),
    ("crowd", &["crowd", "audience", "stadium", "hundreds of people"]),
    (
        "physics interaction",
        &["pouring", "splashing", "shattering", "colliding", "bouncing off"],
    ),
];

/// Content classes that render, but with strongly backend-dependent quality.
const COMPLEX_SIGNALS: &[(&str, &[&str])] = &[
    (
        "camera movement",
        &["pan", "zoom", "dolly", "tracking shot", "orbit", "crane shot", "fly-through"],
    ),
    (
        "fast motion",
        &["running", "dancing", "jumping", "sprinting", "fast", "rapid"],
    ),
    (
        "multiple subjects",
        &["two people", "three people", "group of", "couple", "team"],
    ),
    ("reflection", &["mirror", "reflection", "glass surface"]),
    ("fluids", &["water", "rain", "ocean", "waves", "steam", "smoke"]),
    ("low light", &["night", "dark", "dim", "candlelight", "neon"]),
    ("fire", &["fire", "flames", "explosion", "sparks"]),
];

/// Per-signal score weights.
const IMPOSSIBLE_WEIGHT: f32 = 0.35;
const COMPLEX_WEIGHT: f32 = 0.15;

/// Scores a visual direction for generation difficulty.
///
/// Holds the catalog so the recommend/avoid short-lists can be derived
/// from declared provider strengths and weaknesses.
#[derive(Debug, Clone)]
pub struct ComplexityAnalyzer {
    catalog: ProviderCatalog,
}

impl ComplexityAnalyzer {
    pub fn new(catalog: ProviderCatalog) -> Self {
        Self { catalog }
    }

    /// Analyze one visual direction. Deterministic: the same text always
    /// produces the same analysis.
    pub fn analyze(&self, visual_direction: &str) -> ComplexityAnalysis {
        let text = visual_direction.to_lowercase();

        let mut signals = Vec::new();
        let mut impossible_hits = 0u32;
        let mut complex_hits = 0u32;

        for (label, keywords) in IMPOSSIBLE_SIGNALS {
            if keywords.iter().any(|k| text.contains(k)) {
                impossible_hits += 1;
                signals.push((*label).to_string());
            }
        }
        for (label, keywords) in COMPLEX_SIGNALS {
            if keywords.iter().any(|k| text.contains(k)) {
                complex_hits += 1;
                signals.push((*label).to_string());
            }
        }

        let score = (impossible_hits as f32 * IMPOSSIBLE_WEIGHT
            + complex_hits as f32 * COMPLEX_WEIGHT)
            .min(1.0);

        let class = if impossible_hits >= 2 || score >= 0.7 {
            ComplexityClass::Impossible
        } else if impossible_hits == 1 || complex_hits >= 2 {
            ComplexityClass::Complex
        } else {
            ComplexityClass::Simple
        };

        let (recommended, avoid) = self.provider_lists(&text, class);

        ComplexityAnalysis {
            class,
            score,
            simplified_prompt: simplify_prompt(visual_direction),
            recommended,
            avoid,
            signals,
        }
    }

    /// Derive recommend/avoid lists from catalog strengths/weaknesses.
    ///
    /// For near-impossible content the recommendation collapses to the
    /// high-motion-tier backends regardless of keyword matches.
    fn provider_lists(
        &self,
        text: &str,
        class: ComplexityClass,
    ) -> (Vec<ProviderId>, Vec<ProviderId>) {
        let mut recommended = Vec::new();
        let mut avoid = Vec::new();

        for profile in self.catalog.iter() {
            let strength_match = profile.strengths.iter().any(|s| text.contains(s.as_str()));
            let weakness_match = profile.weaknesses.iter().any(|w| text.contains(w.as_str()));

            match class {
                ComplexityClass::Impossible => {
                    if profile.motion.is_high_tier() && !weakness_match {
                        recommended.push(profile.id.clone());
                    } else {
                        avoid.push(profile.id.clone());
                    }
                }
                _ => {
                    if strength_match && !weakness_match {
                        recommended.push(profile.id.clone());
                    } else if weakness_match {
                        avoid.push(profile.id.clone());
                    }
                }
            }
        }

        (recommended, avoid)
    }
}

/// Reduce a direction to a short subject-plus-lighting description.
///
/// Keeps the leading clause (the subject), drops everything after the
/// first clause boundary past a soft length cap, and appends safe
/// lighting/motion qualifiers.
pub fn simplify_prompt(visual_direction: &str) -> String {
    let trimmed = visual_direction.trim();

    let subject = {
        let first_clause = trimmed
            .split(|c| c == ',' || c == '.' || c == ';')
            .next()
            .unwrap_or(trimmed)
            .trim();

        if first_clause.len() <= 60 {
            first_clause.to_string()
        } else {
            // Cut at the last word boundary under the cap
            let mut cut = 60;
            while cut > 0 && !first_clause.is_char_boundary(cut) {
                cut -= 1;
            }
            let head = &first_clause[..cut];
            match head.rfind(' ') {
                Some(idx) => head[..idx].to_string(),
                None => head.to_string(),
            }
        }
    };

    format!("{}, soft diffused lighting, gentle camera motion", subject)
}
