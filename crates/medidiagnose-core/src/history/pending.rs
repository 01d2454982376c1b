//! Delayed, cancellable submissions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::{HistoryError, HistoryResult, HistoryStore};
use crate::models::{DiagnosisResult, SymptomInput};

/// Handle to a submission waiting out its simulated latency.
///
/// Dropping the handle cancels the submission; nothing is recorded unless the
/// delay elapsed first.
#[derive(Debug)]
pub struct PendingSubmission {
    handle: JoinHandle<HistoryResult<DiagnosisResult>>,
}

/// Score and record `input` after `delay` on the current tokio runtime.
pub fn submit_delayed(
    store: Arc<Mutex<HistoryStore>>,
    has_image: bool,
    input: SymptomInput,
    delay: Duration,
) -> PendingSubmission {
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let mut store = store.lock().map_err(|_| HistoryError::LockPoisoned)?;
        store.submit_now(has_image, &input)
    });
    PendingSubmission { handle }
}

impl PendingSubmission {
    /// Wait for the result. A cancelled submission yields [`HistoryError::Cancelled`].
    pub async fn wait(mut self) -> HistoryResult<DiagnosisResult> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(HistoryError::Cancelled),
            Err(e) => Err(HistoryError::TaskFailed(e.to_string())),
        }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::history::DEFAULT_HISTORY_CAPACITY;

    fn store() -> Arc<Mutex<HistoryStore>> {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        Arc::new(Mutex::new(
            HistoryStore::open(db, DEFAULT_HISTORY_CAPACITY).unwrap(),
        ))
    }

    fn input() -> SymptomInput {
        SymptomInput::new(["Fever"], "fever and body aches")
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_after_delay() {
        let store = store();
        let pending = submit_delayed(store.clone(), true, input(), Duration::from_secs(2));

        let result = pending.wait().await.unwrap();

        let guard = store.lock().unwrap();
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.entries()[0].result, result);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_records_nothing() {
        let store = store();
        let pending = submit_delayed(store.clone(), true, input(), Duration::from_secs(2));

        tokio::time::advance(Duration::from_millis(500)).await;
        pending.cancel();

        assert!(matches!(pending.wait().await, Err(HistoryError::Cancelled)));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(store.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let store = store();
        drop(submit_delayed(
            store.clone(),
            false,
            input(),
            Duration::from_secs(2),
        ));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(store.lock().unwrap().is_empty());
    }
}
