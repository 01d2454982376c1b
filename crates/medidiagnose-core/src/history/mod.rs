//! Diagnosis history store.
//!
//! Wraps the offline engine and keeps the most recent results, newest first,
//! under a single storage key. Concurrent writers are last-writer-wins.

mod pending;

pub use pending::*;

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::db::{Database, DbError, HISTORY_KEY};
use crate::engine::MockDiagnosisEngine;
use crate::models::{DiagnosisHistoryEntry, DiagnosisResult, SymptomInput};

/// Default number of entries retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// History errors.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("History lock poisoned")]
    LockPoisoned,

    #[error("Submission cancelled")]
    Cancelled,

    #[error("Submission task failed: {0}")]
    TaskFailed(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Bounded, persisted list of past diagnoses.
pub struct HistoryStore {
    db: Arc<Mutex<Database>>,
    engine: MockDiagnosisEngine,
    entries: Vec<DiagnosisHistoryEntry>,
    capacity: usize,
}

impl HistoryStore {
    /// Open the store and load whatever was persisted.
    ///
    /// An unreadable persisted list is logged and treated as empty.
    pub fn open(db: Arc<Mutex<Database>>, capacity: usize) -> HistoryResult<Self> {
        Self::with_engine(db, MockDiagnosisEngine::new(), capacity)
    }

    pub fn with_engine(
        db: Arc<Mutex<Database>>,
        engine: MockDiagnosisEngine,
        capacity: usize,
    ) -> HistoryResult<Self> {
        let entries = {
            let guard = db.lock().map_err(|_| HistoryError::LockPoisoned)?;
            match guard.get_json::<Vec<DiagnosisHistoryEntry>>(HISTORY_KEY) {
                Ok(entries) => entries.unwrap_or_default(),
                Err(DbError::Json(e)) => {
                    tracing::warn!(error = %e, "Failed to parse stored diagnosis history");
                    Vec::new()
                }
                Err(e) => return Err(e.into()),
            }
        };

        let mut store = Self {
            db,
            engine,
            entries,
            capacity,
        };
        store.entries.truncate(store.capacity);
        tracing::debug!(entries = store.entries.len(), "Loaded diagnosis history");
        Ok(store)
    }

    /// Score the input immediately and record the result.
    pub fn submit_now(
        &mut self,
        has_image: bool,
        input: &SymptomInput,
    ) -> HistoryResult<DiagnosisResult> {
        let result = self.engine.score(input);
        self.record(DiagnosisHistoryEntry::new(
            input.clone(),
            has_image,
            result.clone(),
        ))?;
        Ok(result)
    }

    /// Prepend an entry, evict beyond capacity and persist.
    ///
    /// The in-memory list only changes once the write succeeded.
    pub fn record(&mut self, entry: DiagnosisHistoryEntry) -> HistoryResult<()> {
        let mut updated = Vec::with_capacity(self.entries.len() + 1);
        updated.push(entry);
        updated.extend(self.entries.iter().cloned());
        updated.truncate(self.capacity);

        self.persist(&updated)?;
        self.entries = updated;

        if let Some(entry) = self.entries.first() {
            tracing::info!(
                id = %entry.id,
                top = entry.result.top_condition().map(|c| c.name.as_str()).unwrap_or(""),
                "Recorded diagnosis"
            );
        }
        Ok(())
    }

    /// Delete the persisted copy, then empty the list.
    pub fn clear(&mut self) -> HistoryResult<()> {
        {
            let guard = self.db.lock().map_err(|_| HistoryError::LockPoisoned)?;
            guard.remove_item(HISTORY_KEY)?;
        }
        self.entries.clear();
        tracing::info!("Diagnosis history cleared");
        Ok(())
    }

    /// Absent ids are not an error.
    pub fn get_by_id(&self, id: &str) -> Option<&DiagnosisHistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Newest first.
    pub fn entries(&self) -> &[DiagnosisHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn engine(&self) -> &MockDiagnosisEngine {
        &self.engine
    }

    fn persist(&self, entries: &[DiagnosisHistoryEntry]) -> HistoryResult<()> {
        let guard = self.db.lock().map_err(|_| HistoryError::LockPoisoned)?;
        guard.set_json(HISTORY_KEY, entries)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_db() -> Arc<Mutex<Database>> {
        Arc::new(Mutex::new(Database::open_in_memory().unwrap()))
    }

    fn rash() -> SymptomInput {
        SymptomInput::new(["Itching", "Redness"], "red itchy rash")
    }

    #[test]
    fn test_submit_prepends_and_persists() {
        let db = shared_db();
        let mut store = HistoryStore::open(db.clone(), DEFAULT_HISTORY_CAPACITY).unwrap();

        store.submit_now(true, &rash()).unwrap();
        store
            .submit_now(false, &SymptomInput::new(["Fever"], "fever and chills"))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].symptoms.selected_symptoms, vec!["Fever"]);
        assert!(!store.entries()[0].has_image);
        assert!(store.entries()[1].has_image);

        let reopened = HistoryStore::open(db, DEFAULT_HISTORY_CAPACITY).unwrap();
        assert_eq!(reopened.entries(), store.entries());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = HistoryStore::open(shared_db(), 3).unwrap();
        for i in 0..5 {
            store
                .submit_now(false, &SymptomInput::new([format!("s{}", i)], ""))
                .unwrap();
        }

        assert_eq!(store.len(), 3);
        let order: Vec<&str> = store
            .entries()
            .iter()
            .map(|e| e.symptoms.selected_symptoms[0].as_str())
            .collect();
        assert_eq!(order, vec!["s4", "s3", "s2"]);
    }

    #[test]
    fn test_get_by_id() {
        let mut store = HistoryStore::open(shared_db(), DEFAULT_HISTORY_CAPACITY).unwrap();
        store.submit_now(true, &rash()).unwrap();
        let id = store.entries()[0].id.clone();

        assert!(store.get_by_id(&id).is_some());
        assert!(store.get_by_id("missing").is_none());
    }

    #[test]
    fn test_clear_removes_persisted_list() {
        let db = shared_db();
        let mut store = HistoryStore::open(db.clone(), DEFAULT_HISTORY_CAPACITY).unwrap();
        store.submit_now(true, &rash()).unwrap();

        store.clear().unwrap();

        assert!(store.is_empty());
        assert!(db.lock().unwrap().get_item(HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_history_loads_empty() {
        let db = shared_db();
        db.lock().unwrap().set_item(HISTORY_KEY, "{not json").unwrap();

        let store = HistoryStore::open(db, DEFAULT_HISTORY_CAPACITY).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_write_leaves_list_unchanged() {
        let db = shared_db();
        let mut store = HistoryStore::open(db.clone(), DEFAULT_HISTORY_CAPACITY).unwrap();
        store.submit_now(true, &rash()).unwrap();
        let before = store.entries().to_vec();

        db.lock()
            .unwrap()
            .conn()
            .execute_batch("DROP TABLE client_storage")
            .unwrap();

        assert!(matches!(
            store.submit_now(false, &rash()),
            Err(HistoryError::Database(_))
        ));
        assert_eq!(store.entries(), before.as_slice());

        assert!(store.clear().is_err());
        assert_eq!(store.len(), 1);
    }
}
