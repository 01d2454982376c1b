//! Diagnosis models produced by the scoring engine.

use serde::{Deserialize, Serialize};

/// Coarse triage category attached to a condition or result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
        }
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall confidence of a result, derived from the top score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Above 70 is high, above 50 is medium, anything else is low.
    pub fn from_score(score: u8) -> Self {
        if score > 70 {
            ConfidenceLevel::High
        } else if score > 50 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one candidate condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTemplate {
    /// Display name (e.g., "Dermatitis")
    pub name: String,
    /// Lower-case keywords that trigger this condition, in table order
    pub trigger_keywords: Vec<String>,
    /// Suggested treatments, in display order
    pub treatments: Vec<String>,
    /// Configured urgency
    pub urgency: UrgencyLevel,
}

impl ConditionTemplate {
    pub fn new(name: &str, triggers: &[&str], treatments: &[&str], urgency: UrgencyLevel) -> Self {
        Self {
            name: name.to_string(),
            trigger_keywords: triggers.iter().map(|t| t.to_lowercase()).collect(),
            treatments: treatments.iter().map(|t| t.to_string()).collect(),
            urgency,
        }
    }
}

/// Score of one template against one input. Recomputed on every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScore {
    pub condition: String,
    /// 0..=100
    pub score: u8,
    pub treatments: Vec<String>,
    pub urgency: UrgencyLevel,
}

/// A ranked condition in a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PossibleCondition {
    pub name: String,
    /// 0..=100, always above 30 except for the fallback entry (35)
    pub confidence: u8,
    pub treatments: Vec<String>,
}

/// Outcome of one scoring run. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    /// One to three conditions, best first
    pub possible_conditions: Vec<PossibleCondition>,
    pub confidence_level: ConfidenceLevel,
    pub recommendations: Vec<String>,
    pub urgency_level: UrgencyLevel,
}

impl DiagnosisResult {
    /// Best-ranked condition.
    pub fn top_condition(&self) -> Option<&PossibleCondition> {
        self.possible_conditions.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(ConfidenceLevel::from_score(71), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(70), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(51), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(50), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(100), ConfidenceLevel::High);
    }

    #[test]
    fn test_template_lowercases_triggers() {
        let template = ConditionTemplate::new("X", &["Dry Skin"], &["Rest"], UrgencyLevel::Low);
        assert_eq!(template.trigger_keywords, vec!["dry skin"]);
    }

    #[test]
    fn test_result_wire_format() {
        let result = DiagnosisResult {
            possible_conditions: vec![PossibleCondition {
                name: "Unspecified Condition".into(),
                confidence: 35,
                treatments: vec!["Consult with a healthcare provider".into()],
            }],
            confidence_level: ConfidenceLevel::Low,
            recommendations: vec![],
            urgency_level: UrgencyLevel::Medium,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["confidenceLevel"], "low");
        assert_eq!(value["urgencyLevel"], "medium");
        assert_eq!(value["possibleConditions"][0]["confidence"], 35);
    }
}
