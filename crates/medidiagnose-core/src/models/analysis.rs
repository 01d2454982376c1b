//! Analysis summaries shared by the intake flow, the API client and the report.
//!
//! Both the offline engine and the diagnosis backend end up here, so the UI
//! and the report generator consume one shape regardless of where a result
//! came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DiagnosisResult, SymptomInput, UrgencyLevel};

/// Closed result type for anything that can fail on the way to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome<T> {
    Success { data: T },
    Failure { reason: String },
}

impl<T> Outcome<T> {
    pub fn success(data: T) -> Self {
        Outcome::Success { data }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Outcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Success { data } => Some(data),
            Outcome::Failure { .. } => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Outcome::success(data),
            Err(e) => Outcome::failure(e.to_string()),
        }
    }
}

/// Everything the result screen and the report need about one analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Headline condition
    pub diagnosis: String,
    /// Narrative description of the condition
    pub description: String,
    /// Symptoms as analyzed (not the patient's checklist)
    pub analyzed_symptoms: String,
    pub causes: Vec<String>,
    pub recommendations: Vec<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub urgency: Option<UrgencyLevel>,
    /// Top confidence, when the source provides one
    pub confidence: Option<u8>,
}

impl AnalysisSummary {
    /// Summarize an offline engine result.
    ///
    /// The ranked conditions double as the list of possible causes.
    pub fn from_diagnosis(result: &DiagnosisResult, input: &SymptomInput) -> Self {
        let top = result.top_condition();
        Self {
            diagnosis: top.map(|c| c.name.clone()).unwrap_or_default(),
            description: String::new(),
            analyzed_symptoms: input.selected_symptoms.join(", "),
            causes: result
                .possible_conditions
                .iter()
                .map(|c| format!("{} ({}% match)", c.name, c.confidence))
                .collect(),
            recommendations: result.recommendations.clone(),
            analyzed_at: Some(Utc::now()),
            urgency: Some(result.urgency_level),
            confidence: top.map(|c| c.confidence),
        }
    }

    /// Copy with every text field stripped of asterisks.
    pub fn sanitized(&self) -> Self {
        Self {
            diagnosis: sanitize_text(&self.diagnosis),
            description: sanitize_text(&self.description),
            analyzed_symptoms: sanitize_text(&self.analyzed_symptoms),
            causes: self.causes.iter().map(|c| sanitize_text(c)).collect(),
            recommendations: self.recommendations.iter().map(|r| sanitize_text(r)).collect(),
            analyzed_at: self.analyzed_at,
            urgency: self.urgency,
            confidence: self.confidence,
        }
    }

    /// Fill empty narrative fields from the reference profile of the diagnosis.
    pub fn with_reference_defaults(mut self) -> Self {
        let profile = ReferenceProfile::lookup(&self.diagnosis);
        if self.description.is_empty() {
            self.description = profile.map(|p| p.description.to_string()).unwrap_or_default();
        }
        if self.analyzed_symptoms.is_empty() {
            self.analyzed_symptoms = profile
                .map(|p| p.symptoms)
                .unwrap_or("No specific symptoms identified.")
                .to_string();
        }
        if self.causes.is_empty() {
            self.causes = split_legacy_list(
                profile
                    .map(|p| p.causes)
                    .unwrap_or("No specific causes identified."),
            );
        }
        if self.recommendations.is_empty() {
            self.recommendations = split_legacy_list(
                profile
                    .map(|p| p.recommendations)
                    .unwrap_or("Consult a healthcare professional for personalized advice."),
            );
        }
        self
    }
}

/// Canned narrative for conditions the backend commonly returns without detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceProfile {
    pub condition: &'static str,
    pub description: &'static str,
    pub symptoms: &'static str,
    pub causes: &'static str,
    pub recommendations: &'static str,
}

const REFERENCE_PROFILES: &[ReferenceProfile] = &[
    ReferenceProfile {
        condition: "Acne (Acne vulgaris)",
        description: "This appears to be the most likely condition based on the presence of red spots and general irritation on the face.",
        symptoms: "Red papules/pustules on the cheek area, some containing pus.",
        causes: "Hormonal changes, excess oil production, bacteria (Propionibacterium acnes), lifestyle factors like stress or poor diet.",
        recommendations: "Gentle cleansing twice daily with a mild cleanser, use over-the-counter treatments with Benzoyl Peroxide or Salicylic Acid, avoid touching the face, moisturize with an oil-free product, consult a dermatologist if symptoms persist.",
    },
    ReferenceProfile {
        condition: "Eczema",
        description: "This condition is likely due to dry, inflamed skin with intense itching, often seen in patches.",
        symptoms: "Dry, scaly patches, intense itching, redness, and possible oozing or crusting.",
        causes: "Genetic predisposition, environmental triggers (e.g., allergens, irritants), stress, and immune system dysfunction.",
        recommendations: "Use fragrance-free moisturizers frequently, avoid known triggers (e.g., harsh soaps), apply topical corticosteroids as prescribed, keep skin clean and hydrated, consult a dermatologist for severe cases.",
    },
    ReferenceProfile {
        condition: "Psoriasis",
        description: "This appears to be a chronic autoimmune condition causing rapid skin cell turnover, leading to scaling on the skin's surface.",
        symptoms: "Thick, red patches with silvery scales, dryness, and possible cracking or bleeding.",
        causes: "Immune system dysfunction, genetic factors, environmental triggers (e.g., stress, infections), and lifestyle factors.",
        recommendations: "Use moisturizers to reduce dryness, apply topical treatments like corticosteroids, avoid triggers like stress or smoking, consider phototherapy for severe cases, consult a dermatologist for systemic treatments.",
    },
];

impl ReferenceProfile {
    /// Exact-name lookup.
    pub fn lookup(condition: &str) -> Option<&'static ReferenceProfile> {
        REFERENCE_PROFILES.iter().find(|p| p.condition == condition)
    }
}

/// Delete every literal asterisk. Other markdown passes through untouched.
pub fn sanitize_text(text: &str) -> String {
    text.replace('*', "")
}

/// Best-effort split of a legacy comma-joined text payload into items.
///
/// Splits on ", " only, so a fragment that carries its own ", " is split too;
/// structured arrays should be preferred wherever the source provides them.
pub fn split_legacy_list(text: &str) -> Vec<String> {
    text.split(", ")
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfidenceLevel, PossibleCondition};

    #[test]
    fn test_sanitize_only_removes_asterisks() {
        assert_eq!(sanitize_text("**Eczema** _dry_ #1"), "Eczema _dry_ #1");
    }

    #[test]
    fn test_split_legacy_list() {
        assert_eq!(
            split_legacy_list("Rest, Hydration, Bland diet"),
            vec!["Rest", "Hydration", "Bland diet"]
        );
        // Commas without a trailing space are kept
        assert_eq!(split_legacy_list("a,b, c"), vec!["a,b", "c"]);
        assert!(split_legacy_list("").is_empty());
    }

    #[test]
    fn test_split_legacy_list_mis_splits_nested_clauses() {
        let items = split_legacy_list("Avoid triggers (e.g., smoke, dust), rest");
        assert_eq!(items, vec!["Avoid triggers (e.g.", "smoke", "dust)", "rest"]);
    }

    #[test]
    fn test_outcome_tagging() {
        let ok: Outcome<u8> = Outcome::success(3);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["kind"], "success");
        assert_eq!(json["data"], 3);

        let failed: Outcome<u8> = Err::<u8, _>("boom").into();
        assert!(!failed.is_success());
        assert_eq!(failed, Outcome::failure("boom"));
    }

    #[test]
    fn test_from_diagnosis() {
        let result = DiagnosisResult {
            possible_conditions: vec![
                PossibleCondition {
                    name: "Dermatitis".into(),
                    confidence: 84,
                    treatments: vec!["Moisturizers".into()],
                },
                PossibleCondition {
                    name: "Allergic Reaction".into(),
                    confidence: 60,
                    treatments: vec!["Antihistamines".into()],
                },
            ],
            confidence_level: ConfidenceLevel::High,
            recommendations: vec!["Moisturizers".into()],
            urgency_level: UrgencyLevel::Low,
        };
        let input = SymptomInput::new(["Itching", "Redness"], "red itchy rash");

        let summary = AnalysisSummary::from_diagnosis(&result, &input);
        assert_eq!(summary.diagnosis, "Dermatitis");
        assert_eq!(summary.analyzed_symptoms, "Itching, Redness");
        assert_eq!(summary.causes[0], "Dermatitis (84% match)");
        assert_eq!(summary.confidence, Some(84));
        assert_eq!(summary.urgency, Some(UrgencyLevel::Low));
    }

    #[test]
    fn test_reference_defaults() {
        let summary = AnalysisSummary {
            diagnosis: "Eczema".into(),
            ..Default::default()
        }
        .with_reference_defaults();

        assert!(summary.description.starts_with("This condition is likely"));
        // "(e.g., harsh soaps)" is split in two by the legacy splitter
        assert_eq!(summary.recommendations.len(), 6);
        assert_eq!(summary.recommendations[1], "avoid known triggers (e.g.");

        let unknown = AnalysisSummary {
            diagnosis: "Something Else".into(),
            ..Default::default()
        }
        .with_reference_defaults();
        assert_eq!(unknown.description, "");
        assert_eq!(unknown.causes, vec!["No specific causes identified."]);
    }
}
