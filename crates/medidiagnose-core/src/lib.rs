//! MediDiagnose Core Library
//!
//! Local-first core of the MediDiagnose consumer health client.
//!
//! # Architecture
//!
//! ```text
//! Image + Symptoms → Intake Flow ──► Mock Diagnosis Engine ──► History Store
//!                        │          (or diagnosis backend)        │
//!                        │                                  [client_storage]
//!                        ▼
//!                 Result (Outcome) ──► Report Generator ──► PDF export
//!                        ▲
//!                 Session Context (identity provider, bearer token)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite key-value client storage
//! - [`models`]: Domain types (SymptomInput, DiagnosisResult, AnalysisSummary, ...)
//! - [`engine`]: Keyword-scoring mock diagnosis engine
//! - [`history`]: Bounded diagnosis history and delayed submissions
//! - [`report`]: Paginated PDF report
//! - [`intake`]: Image → symptoms → result state machine
//! - [`session`]: Session context with init/teardown lifecycle
//! - [`symptoms`], [`validators`], [`helpers`], [`config`]

pub mod config;
pub mod db;
pub mod engine;
pub mod helpers;
pub mod history;
pub mod intake;
pub mod models;
pub mod report;
pub mod session;
pub mod symptoms;
pub mod validators;

// Re-export commonly used types
pub use config::ClientConfig;
pub use db::Database;
pub use engine::MockDiagnosisEngine;
pub use history::{submit_delayed, HistoryStore, PendingSubmission};
pub use intake::{IntakeFlow, IntakeStep, Notice, NoticeSeverity, SubmissionTicket};
pub use models::{
    AnalysisSummary, ConfidenceLevel, DiagnosisHistoryEntry, DiagnosisResult, ImageQuality,
    ImageUpload, Outcome, PossibleCondition, Session, SymptomInput, UrgencyLevel, UserProfile,
};
pub use report::{PatientMetadata, Report, ReportGenerator};
pub use session::{IdentityProvider, SessionContext};
pub use symptoms::SymptomVocabulary;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MediDiagnoseError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error("Session error: {0}")]
    SessionError(String),
}

impl From<db::DbError> for MediDiagnoseError {
    fn from(e: db::DbError) -> Self {
        MediDiagnoseError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for MediDiagnoseError {
    fn from(e: serde_json::Error) -> Self {
        MediDiagnoseError::SerializationError(e.to_string())
    }
}

impl From<history::HistoryError> for MediDiagnoseError {
    fn from(e: history::HistoryError) -> Self {
        MediDiagnoseError::DatabaseError(e.to_string())
    }
}

impl From<session::SessionError> for MediDiagnoseError {
    fn from(e: session::SessionError) -> Self {
        MediDiagnoseError::SessionError(e.to_string())
    }
}

impl From<report::ReportError> for MediDiagnoseError {
    fn from(e: report::ReportError) -> Self {
        MediDiagnoseError::ReportError(e.to_string())
    }
}

impl From<intake::IntakeError> for MediDiagnoseError {
    fn from(e: intake::IntakeError) -> Self {
        MediDiagnoseError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for MediDiagnoseError {
    fn from(e: config::ConfigError) -> Self {
        MediDiagnoseError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MediDiagnoseError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MediDiagnoseError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MediDiagnoseCore>, MediDiagnoseError> {
    let db = Database::open(&path)?;
    MediDiagnoseCore::build(db, &ClientConfig::default())
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MediDiagnoseCore>, MediDiagnoseError> {
    let db = Database::open_in_memory()?;
    MediDiagnoseCore::build(db, &ClientConfig::default())
}

/// The fixed symptom checklist.
#[uniffi::export]
pub fn symptom_checklist() -> Vec<String> {
    symptoms::SYMPTOM_CHECKLIST
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Snap a typed label onto the checklist.
#[uniffi::export]
pub fn canonicalize_symptom(label: String) -> Option<String> {
    SymptomVocabulary::default()
        .canonicalize(&label)
        .map(str::to_string)
}

/// Check a symptom description against the default minimum length.
#[uniffi::export]
pub fn validate_description(text: String) -> FfiValidation {
    validators::validate_symptom_description(&text, validators::DEFAULT_DESCRIPTION_MIN_LEN)
        .into()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe client core for FFI.
#[derive(uniffi::Object)]
pub struct MediDiagnoseCore {
    history: Arc<Mutex<HistoryStore>>,
    session: Mutex<SessionContext>,
    reports: ReportGenerator,
}

impl MediDiagnoseCore {
    fn build(db: Database, config: &ClientConfig) -> Result<Arc<Self>, MediDiagnoseError> {
        let db = Arc::new(Mutex::new(db));
        let history = HistoryStore::open(db.clone(), config.history_capacity)?;
        let session = SessionContext::init(db)?;
        Ok(Arc::new(Self {
            history: Arc::new(Mutex::new(history)),
            session: Mutex::new(session),
            reports: ReportGenerator::from_config(config),
        }))
    }
}

#[uniffi::export]
impl MediDiagnoseCore {
    // =========================================================================
    // Diagnosis
    // =========================================================================

    /// Score the symptoms with the offline engine and record the result.
    pub fn diagnose(
        &self,
        selected_symptoms: Vec<String>,
        description: String,
        has_image: bool,
    ) -> Result<FfiDiagnosisResult, MediDiagnoseError> {
        let input = SymptomInput::new(selected_symptoms, description);
        let mut history = self.history.lock()?;
        let result = history.submit_now(has_image, &input)?;
        Ok(result.into())
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Past diagnoses, newest first.
    pub fn list_history(&self) -> Result<Vec<FfiHistoryEntry>, MediDiagnoseError> {
        let history = self.history.lock()?;
        Ok(history.entries().iter().cloned().map(Into::into).collect())
    }

    pub fn get_history_entry(
        &self,
        id: String,
    ) -> Result<Option<FfiHistoryEntry>, MediDiagnoseError> {
        let history = self.history.lock()?;
        Ok(history.get_by_id(&id).cloned().map(Into::into))
    }

    pub fn clear_history(&self) -> Result<(), MediDiagnoseError> {
        let mut history = self.history.lock()?;
        history.clear()?;
        Ok(())
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn sign_in(
        &self,
        full_name: String,
        token: Option<String>,
    ) -> Result<FfiSession, MediDiagnoseError> {
        let mut session = self.session.lock()?;
        session.sign_in(UserProfile::with_full_name(full_name), token)?;
        Ok(session.session().into())
    }

    pub fn sign_out(&self) -> Result<(), MediDiagnoseError> {
        let mut session = self.session.lock()?;
        session.teardown()?;
        Ok(())
    }

    pub fn current_session(&self) -> Result<FfiSession, MediDiagnoseError> {
        let session = self.session.lock()?;
        Ok(session.session().into())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Export the report for a history entry into `out_dir`. Returns the file path.
    pub fn export_report(
        &self,
        entry_id: String,
        out_dir: String,
    ) -> Result<String, MediDiagnoseError> {
        let entry = {
            let history = self.history.lock()?;
            history
                .get_by_id(&entry_id)
                .cloned()
                .ok_or_else(|| MediDiagnoseError::NotFound(format!("history entry {}", entry_id)))?
        };
        let session = self.session.lock()?.session();

        let summary = AnalysisSummary::from_diagnosis(&entry.result, &entry.symptoms);
        let report = self.reports.generate(
            Some(&summary),
            &session,
            &entry.symptoms.selected_symptoms,
            &entry.symptoms.description,
        )?;
        let path = report.export_to(Path::new(&out_dir))?;
        Ok(path.to_string_lossy().into_owned())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe possible condition.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPossibleCondition {
    pub name: String,
    pub confidence: u8,
    pub treatments: Vec<String>,
}

impl From<PossibleCondition> for FfiPossibleCondition {
    fn from(condition: PossibleCondition) -> Self {
        Self {
            name: condition.name,
            confidence: condition.confidence,
            treatments: condition.treatments,
        }
    }
}

/// FFI-safe diagnosis result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiagnosisResult {
    pub possible_conditions: Vec<FfiPossibleCondition>,
    pub confidence_level: String,
    pub recommendations: Vec<String>,
    pub urgency_level: String,
}

impl From<DiagnosisResult> for FfiDiagnosisResult {
    fn from(result: DiagnosisResult) -> Self {
        Self {
            possible_conditions: result
                .possible_conditions
                .into_iter()
                .map(Into::into)
                .collect(),
            confidence_level: result.confidence_level.as_str().to_string(),
            recommendations: result.recommendations,
            urgency_level: result.urgency_level.as_str().to_string(),
        }
    }
}

/// FFI-safe history entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistoryEntry {
    pub id: String,
    /// RFC 3339
    pub timestamp: String,
    pub selected_symptoms: Vec<String>,
    pub description: String,
    pub has_image: bool,
    pub result: FfiDiagnosisResult,
}

impl From<DiagnosisHistoryEntry> for FfiHistoryEntry {
    fn from(entry: DiagnosisHistoryEntry) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp.to_rfc3339(),
            selected_symptoms: entry.symptoms.selected_symptoms,
            description: entry.symptoms.description,
            has_image: entry.has_image,
            result: entry.result.into(),
        }
    }
}

/// FFI-safe session view.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub is_signed_in: bool,
    pub display_name: Option<String>,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        Self {
            is_signed_in: session.is_signed_in,
            display_name: session.display_name,
        }
    }
}

/// FFI-safe validation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiValidation {
    pub is_valid: bool,
    pub message: String,
}

impl From<validators::ValidationResult> for FfiValidation {
    fn from(result: validators::ValidationResult) -> Self {
        Self {
            is_valid: result.is_valid,
            message: result.message,
        }
    }
}
