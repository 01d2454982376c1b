//! The fixed symptom checklist offered during intake.

use strsim::jaro_winkler;

/// Checklist entries, in display order.
pub const SYMPTOM_CHECKLIST: [&str; 8] = [
    "Rash",
    "Swelling",
    "Redness",
    "Itching",
    "Pain",
    "Fever",
    "Discoloration",
    "Blisters",
];

/// Minimum Jaro-Winkler similarity for a typed label to snap to an entry.
pub const CANONICAL_MATCH_THRESHOLD: f64 = 0.90;

/// Vocabulary used to normalize typed symptom labels.
#[derive(Debug, Clone)]
pub struct SymptomVocabulary {
    entries: Vec<String>,
}

impl Default for SymptomVocabulary {
    fn default() -> Self {
        Self::new(SYMPTOM_CHECKLIST.iter().map(|s| s.to_string()).collect())
    }
}

impl SymptomVocabulary {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e == label)
    }

    /// Snap a label to its checklist entry.
    ///
    /// Case-insensitive exact match first, then the closest entry by
    /// Jaro-Winkler similarity at or above [`CANONICAL_MATCH_THRESHOLD`].
    pub fn canonicalize(&self, label: &str) -> Option<&str> {
        let needle = label.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(exact) = self.entries.iter().find(|e| e.to_lowercase() == needle) {
            return Some(exact.as_str());
        }

        let mut best: Option<(&str, f64)> = None;
        for entry in &self.entries {
            let similarity = jaro_winkler(&needle, &entry.to_lowercase());
            if similarity >= CANONICAL_MATCH_THRESHOLD
                && best.map_or(true, |(_, s)| similarity > s)
            {
                best = Some((entry.as_str(), similarity));
            }
        }

        if let Some((entry, similarity)) = best {
            tracing::debug!(label, entry, similarity, "Snapped symptom label");
        }
        best.map(|(entry, _)| entry)
    }
}
