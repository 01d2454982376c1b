//! Wire types for the diagnosis backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medidiagnose_core::models::{sanitize_text, split_legacy_list, AnalysisSummary};

/// A list field that older backends send as one comma-joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    Items(Vec<String>),
    /// Best-effort: split on ", ", so items containing ", " come apart
    Legacy(String),
}

impl Default for TextList {
    fn default() -> Self {
        TextList::Items(Vec::new())
    }
}

impl TextList {
    pub fn into_items(self) -> Vec<String> {
        match self {
            TextList::Items(items) => items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
            TextList::Legacy(text) => split_legacy_list(&text),
        }
    }

    /// Flatten back to display text.
    pub fn into_text(self) -> String {
        match self {
            TextList::Items(items) => items.join(", "),
            TextList::Legacy(text) => text,
        }
    }
}

/// `POST /symptom-check` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymptomCheckResponse {
    pub diagnosis: Option<String>,
    pub description: Option<String>,
    pub symptoms: Option<TextList>,
    pub causes: Option<TextList>,
    pub recommendations: Option<TextList>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub urgency: Option<medidiagnose_core::models::UrgencyLevel>,
    pub confidence: Option<u8>,
}

impl From<SymptomCheckResponse> for AnalysisSummary {
    fn from(response: SymptomCheckResponse) -> Self {
        AnalysisSummary {
            diagnosis: response.diagnosis.unwrap_or_default(),
            description: response.description.unwrap_or_default(),
            analyzed_symptoms: response
                .symptoms
                .map(TextList::into_text)
                .unwrap_or_default(),
            causes: response
                .causes
                .map(TextList::into_items)
                .unwrap_or_default(),
            recommendations: response
                .recommendations
                .map(TextList::into_items)
                .unwrap_or_default(),
            analyzed_at: response.analyzed_at,
            urgency: response.urgency,
            confidence: response.confidence,
        }
        .sanitized()
    }
}

/// Error body shape used by the API layer.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

/// Sanitized symptom labels as the JSON array sent in the multipart form.
pub fn encode_symptoms(symptoms: &[String]) -> serde_json::Result<String> {
    let sanitized: Vec<String> = symptoms.iter().map(|s| sanitize_text(s)).collect();
    serde_json::to_string(&sanitized)
}
