//! Diagnosis history models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DiagnosisResult, SymptomInput};

/// One past submission, owned by the history store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisHistoryEntry {
    /// Opaque identifier
    pub id: String,
    /// Submission time
    pub timestamp: DateTime<Utc>,
    /// Symptoms as submitted
    pub symptoms: SymptomInput,
    /// Whether an image accompanied the submission
    pub has_image: bool,
    /// Engine output
    pub result: DiagnosisResult,
}

impl DiagnosisHistoryEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(symptoms: SymptomInput, has_image: bool, result: DiagnosisResult) -> Self {
        Self {
            id: crate::helpers::generate_id(),
            timestamp: Utc::now(),
            symptoms,
            has_image,
            result,
        }
    }
}
