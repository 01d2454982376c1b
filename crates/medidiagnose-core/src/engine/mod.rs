//! Offline diagnosis engine.
//!
//! Keyword scoring over a fixed table of condition templates. Used when the
//! diagnosis backend is unavailable, and by the history store.
//!
//! Scoring per template:
//! - +20 for every trigger keyword found in the lower-cased description
//! - +25 for every (selected symptom, trigger) pair where either contains the other
//! - + jitter in `0..MAX_JITTER`
//! - clamped to 0..=100

mod templates;

pub use templates::default_templates;

use rand::Rng;

use crate::models::{
    ConditionTemplate, ConfidenceLevel, DiagnosisResult, MatchScore, PossibleCondition,
    SymptomInput, UrgencyLevel,
};

/// Points per trigger keyword found in the description.
pub const DESCRIPTION_MATCH_POINTS: u32 = 20;

/// Points per matching (selected symptom, trigger) pair.
pub const SYMPTOM_MATCH_POINTS: u32 = 25;

/// Exclusive upper bound of the random perturbation.
pub const MAX_JITTER: u32 = 15;

/// Scores must exceed this to be listed.
pub const MIN_LISTED_SCORE: u8 = 30;

/// Maximum number of listed conditions.
pub const MAX_CONDITIONS: usize = 3;

/// Name of the entry used when nothing qualifies.
pub const FALLBACK_CONDITION: &str = "Unspecified Condition";

/// Confidence of the fallback entry.
pub const FALLBACK_CONFIDENCE: u8 = 35;

/// Closing recommendations appended after the top condition's treatments.
pub const CLOSING_RECOMMENDATIONS: [&str; 2] = [
    "Monitor your symptoms for any changes",
    "Consult with a healthcare provider for a proper diagnosis",
];

/// Selected-symptom phrases that force high urgency regardless of score.
///
/// Matched case-insensitively, so "Chest Pain" escalates as well.
pub const URGENT_SYMPTOMS: [&str; 2] = ["chest pain", "difficulty breathing"];

/// Keyword-matching diagnosis engine.
#[derive(Debug, Clone)]
pub struct MockDiagnosisEngine {
    templates: Vec<ConditionTemplate>,
}

impl Default for MockDiagnosisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDiagnosisEngine {
    /// Engine over the built-in condition table.
    pub fn new() -> Self {
        Self::with_templates(default_templates())
    }

    /// Engine over a custom table (order is the tie-break order).
    pub fn with_templates(templates: Vec<ConditionTemplate>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[ConditionTemplate] {
        &self.templates
    }

    /// Score an input with random jitter.
    pub fn score(&self, input: &SymptomInput) -> DiagnosisResult {
        let mut rng = rand::thread_rng();
        self.score_with_jitter(input, || rng.gen_range(0..MAX_JITTER))
    }

    /// Score an input, drawing one jitter value per template from `jitter`.
    ///
    /// Values at or above `MAX_JITTER` are clamped into range.
    pub fn score_with_jitter<F>(&self, input: &SymptomInput, jitter: F) -> DiagnosisResult
    where
        F: FnMut() -> u32,
    {
        let scores = self.match_scores(input, jitter);
        build_result(&scores, input)
    }

    /// Per-template scores, ranked best first (stable on ties).
    pub fn match_scores<F>(&self, input: &SymptomInput, mut jitter: F) -> Vec<MatchScore>
    where
        F: FnMut() -> u32,
    {
        let description = input.description.to_lowercase();
        let selected: Vec<String> = input
            .selected_symptoms
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        let mut scores: Vec<MatchScore> = self
            .templates
            .iter()
            .map(|template| {
                let raw = description_points(template, &description)
                    + selection_points(template, &selected)
                    + jitter().min(MAX_JITTER - 1);

                MatchScore {
                    condition: template.name.clone(),
                    score: raw.min(100) as u8,
                    treatments: template.treatments.clone(),
                    urgency: template.urgency,
                }
            })
            .collect();

        // Vec::sort_by is stable, so table order breaks ties
        scores.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::debug!(
            top = scores.first().map(|s| s.condition.as_str()),
            top_score = scores.first().map(|s| s.score),
            "Scored symptom input"
        );

        scores
    }
}

/// Points for trigger keywords found in the description.
fn description_points(template: &ConditionTemplate, description: &str) -> u32 {
    template
        .trigger_keywords
        .iter()
        .filter(|trigger| description.contains(trigger.as_str()))
        .count() as u32
        * DESCRIPTION_MATCH_POINTS
}

/// Points for selected symptoms overlapping trigger keywords.
///
/// Containment is checked in both directions, so one symptom can match several
/// triggers (and an empty symptom matches every trigger).
fn selection_points(template: &ConditionTemplate, selected: &[String]) -> u32 {
    let mut points = 0;
    for symptom in selected {
        for trigger in &template.trigger_keywords {
            if symptom.contains(trigger.as_str()) || trigger.contains(symptom.as_str()) {
                points += SYMPTOM_MATCH_POINTS;
            }
        }
    }
    points
}

/// Assemble the ranked result from sorted scores.
fn build_result(scores: &[MatchScore], input: &SymptomInput) -> DiagnosisResult {
    let mut possible_conditions: Vec<PossibleCondition> = scores
        .iter()
        .filter(|s| s.score > MIN_LISTED_SCORE)
        .take(MAX_CONDITIONS)
        .map(|s| PossibleCondition {
            name: s.condition.clone(),
            confidence: s.score,
            treatments: s.treatments.clone(),
        })
        .collect();

    if possible_conditions.is_empty() {
        possible_conditions.push(fallback_condition());
    }

    // The top template drives recommendations and urgency even when it did
    // not qualify for listing.
    let top = scores.first();

    let mut recommendations: Vec<String> =
        top.map(|s| s.treatments.clone()).unwrap_or_default();
    recommendations.extend(CLOSING_RECOMMENDATIONS.iter().map(|r| r.to_string()));

    let mut urgency_level = top.map(|s| s.urgency).unwrap_or(UrgencyLevel::Low);
    if has_urgent_symptom(input) {
        urgency_level = UrgencyLevel::High;
    }

    DiagnosisResult {
        confidence_level: ConfidenceLevel::from_score(possible_conditions[0].confidence),
        possible_conditions,
        recommendations,
        urgency_level,
    }
}

/// The entry listed when no template scores above the threshold.
pub fn fallback_condition() -> PossibleCondition {
    PossibleCondition {
        name: FALLBACK_CONDITION.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        treatments: vec!["Consult with a healthcare provider".to_string()],
    }
}

/// Safety override: some selected symptoms always mean high urgency.
pub fn has_urgent_symptom(input: &SymptomInput) -> bool {
    input.selected_symptoms.iter().any(|symptom| {
        let lower = symptom.to_lowercase();
        URGENT_SYMPTOMS.iter().any(|urgent| lower.contains(urgent))
    })
}
