//! Symptom intake models.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

/// Symptoms captured during one intake session.
///
/// Immutable once submitted; the history store keeps a copy per entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SymptomInput {
    /// Checklist selections, set semantics (no duplicates, first-seen order)
    pub selected_symptoms: Vec<String>,
    /// Free-text description in the patient's words
    pub description: String,
}

impl SymptomInput {
    /// Build an input, dropping duplicate selections.
    pub fn new<I, S>(selected: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected_symptoms: Vec<String> = Vec::new();
        for symptom in selected {
            let symptom = symptom.into();
            if !selected_symptoms.contains(&symptom) {
                selected_symptoms.push(symptom);
            }
        }
        Self {
            selected_symptoms,
            description: description.into(),
        }
    }

    /// True when neither a selection nor any description text is present.
    pub fn is_empty(&self) -> bool {
        self.selected_symptoms.is_empty() && self.description.trim().is_empty()
    }
}

/// An image attached to the intake (bytes already read by the caller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name
    pub file_name: String,
    /// MIME type reported by the picker (e.g., "image/png")
    pub mime_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Pixel dimensions read from the image header.
    ///
    /// `None` for formats the decoder does not know (HEIC/HEIF) or corrupt data.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::io::Reader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

/// Pixels below which a side counts as poor.
pub const GOOD_IMAGE_MIN_SIDE: u32 = 500;

/// Pixels at or above which both sides count as excellent.
pub const EXCELLENT_IMAGE_MIN_SIDE: u32 = 1000;

/// Coarse upload quality, graded on the shorter side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Poor,
    Good,
    Excellent,
}

impl ImageQuality {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let shorter = width.min(height);
        if shorter < GOOD_IMAGE_MIN_SIDE {
            ImageQuality::Poor
        } else if shorter < EXCELLENT_IMAGE_MIN_SIDE {
            ImageQuality::Good
        } else {
            ImageQuality::Excellent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Poor => "poor",
            ImageQuality::Good => "good",
            ImageQuality::Excellent => "excellent",
        }
    }
}
