//! Patient-facing PDF report.
//!
//! Generation is refused outright when there is no result or no signed-in
//! patient; a render failure never leaves a file behind.

pub mod layout;
mod pdf;

pub use layout::{layout_report, LayoutInput, ReportLayout};
pub use pdf::render_pdf;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::helpers::format_report_date;
use crate::models::{sanitize_text, AnalysisSummary, Session};

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Printed and file name when a signed-in name has nothing printable left.
pub const FALLBACK_PATIENT_NAME: &str = "Patient";

/// Report errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No diagnosis available to generate a report.")]
    MissingResult,

    #[error("Please log in to generate a personalized report.")]
    NotSignedIn,

    #[error("Failed to render report: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Who the report is for and what they reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientMetadata {
    /// Display name, sanitized for print and file naming
    pub name: String,
    pub selected_symptoms: Vec<String>,
    pub description: String,
}

impl PatientMetadata {
    /// Build from the current session.
    ///
    /// Refused when nobody is signed in or the session has no display name.
    /// A name that sanitizes to nothing (e.g. non-Latin script) prints as
    /// [`FALLBACK_PATIENT_NAME`].
    pub fn from_session(
        session: &Session,
        selected_symptoms: &[String],
        description: &str,
    ) -> ReportResult<Self> {
        let raw = match (session.is_signed_in, session.display_name.as_deref()) {
            (true, Some(name)) if !name.trim().is_empty() => name,
            _ => return Err(ReportError::NotSignedIn),
        };
        let sanitized = sanitize_patient_name(raw);
        let name = match sanitized.trim() {
            "" => FALLBACK_PATIENT_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };

        Ok(Self {
            name,
            selected_symptoms: selected_symptoms.iter().map(|s| sanitize_text(s)).collect(),
            description: sanitize_text(description),
        })
    }

    pub fn file_name(&self) -> String {
        report_file_name(&self.name)
    }
}

/// A rendered report, held in memory until exported.
#[derive(Debug, Clone)]
pub struct Report {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl Report {
    /// Write into `dir` under the report's file name.
    ///
    /// Bytes land in a hidden partial file first and are renamed into place.
    pub fn export_to(&self, dir: &Path) -> ReportResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let target = dir.join(&self.file_name);
        let partial = dir.join(format!(".{}.part", self.file_name));

        std::fs::write(&partial, &self.bytes)?;
        if let Err(e) = std::fs::rename(&partial, &target) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::info!(path = %target.display(), pages = self.page_count, "Report exported");
        Ok(target)
    }
}

/// Builds reports with timestamps in a fixed offset.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    offset: FixedOffset,
    zone_label: String,
}

impl ReportGenerator {
    pub fn new(offset: FixedOffset, zone_label: impl Into<String>) -> Self {
        Self {
            offset,
            zone_label: zone_label.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.report_offset(), config.report_zone_label.clone())
    }

    /// Generate a report stamped with the current time.
    pub fn generate(
        &self,
        result: Option<&AnalysisSummary>,
        session: &Session,
        selected_symptoms: &[String],
        description: &str,
    ) -> ReportResult<Report> {
        self.generate_at(result, session, selected_symptoms, description, Utc::now())
    }

    pub fn generate_at(
        &self,
        result: Option<&AnalysisSummary>,
        session: &Session,
        selected_symptoms: &[String],
        description: &str,
        now: DateTime<Utc>,
    ) -> ReportResult<Report> {
        let result = result.ok_or(ReportError::MissingResult)?;
        let patient = PatientMetadata::from_session(session, selected_symptoms, description)?;

        let layout = self.layout(result, &patient, now);
        let bytes = render_pdf(&layout, layout::REPORT_TITLE).map_err(|e| {
            tracing::error!(error = %e, "Report generation failed");
            e
        })?;

        tracing::info!(pages = layout.page_count(), "Report generated");
        Ok(Report {
            file_name: patient.file_name(),
            bytes,
            page_count: layout.page_count(),
        })
    }

    /// Compute the page layout without rendering.
    pub fn layout(
        &self,
        result: &AnalysisSummary,
        patient: &PatientMetadata,
        now: DateTime<Utc>,
    ) -> ReportLayout {
        let summary = result.sanitized().with_reference_defaults();
        let generated_at = self.timestamp(&now);
        let analyzed_at = summary.analyzed_at.as_ref().map(|t| self.timestamp(t));

        layout_report(&LayoutInput {
            patient_name: &patient.name,
            generated_at: &generated_at,
            analyzed_at: analyzed_at.as_deref(),
            summary: &summary,
            selected_symptoms: &patient.selected_symptoms,
            description: &patient.description,
        })
    }

    fn timestamp(&self, at: &DateTime<Utc>) -> String {
        format_report_date(at, self.offset, &self.zone_label)
    }
}

/// Strip asterisks, then anything but ASCII letters, digits and whitespace.
pub fn sanitize_patient_name(name: &str) -> String {
    sanitize_text(name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect()
}

/// `MediDiagnose_Medical_Report_<Name>.pdf` with whitespace runs as underscores.
pub fn report_file_name(sanitized_name: &str) -> String {
    format!(
        "MediDiagnose_Medical_Report_{}.pdf",
        WHITESPACE_RUN.replace_all(sanitized_name, "_")
    )
}
