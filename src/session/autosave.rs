//! Debounced saving of free-text answers.
//!
//! Each edit restarts a per-question timer; the answer is only sent once
//! the question has been quiet for the debounce period. Dropping the
//! `Autosaver` cancels every pending save.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::orchestrator::{AnswerOutcome, SessionOrchestrator};
use super::types::AnswerPayload;
use crate::error::Result;

/// Default quiet period before an edit is saved
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct PendingSave {
    token: u64,
    payload: AnswerPayload,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Pending {
    next_token: u64,
    saves: HashMap<String, PendingSave>,
}

pub struct Autosaver {
    orchestrator: Arc<SessionOrchestrator>,
    debounce: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl Autosaver {
    pub fn new(orchestrator: Arc<SessionOrchestrator>, debounce: Duration) -> Self {
        Self {
            orchestrator,
            debounce,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Record an edit. Replaces any save still waiting for the same question.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, question_id: &str, payload: AnswerPayload) {
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.saves.remove(question_id) {
            previous.handle.abort();
        }

        pending.next_token += 1;
        let token = pending.next_token;

        let orchestrator = self.orchestrator.clone();
        let shared = self.pending.clone();
        let debounce = self.debounce;
        let id = question_id.to_string();
        let task_payload = payload.clone();

        // The map lock is held until the entry is inserted, so the task can
        // never observe the map before its own entry exists.
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            {
                let mut pending = shared.lock();
                match pending.saves.get(&id) {
                    Some(entry) if entry.token == token => {
                        pending.saves.remove(&id);
                    }
                    _ => return,
                }
            }
            tracing::debug!("[autosave] saving answer for {}", id);
            if let Err(e) = orchestrator.answer(&id, task_payload).await {
                tracing::warn!("[autosave] failed to save answer for {}: {}", id, e);
            }
        });

        pending.saves.insert(
            question_id.to_string(),
            PendingSave {
                token,
                payload,
                handle,
            },
        );
    }

    /// Send every pending save now, without waiting for the debounce.
    ///
    /// All pending saves are attempted; the first failure is returned.
    pub async fn flush(&self) -> Result<Vec<(String, AnswerOutcome)>> {
        let drained: Vec<(String, AnswerPayload)> = {
            let mut pending = self.pending.lock();
            pending
                .saves
                .drain()
                .map(|(id, save)| {
                    save.handle.abort();
                    (id, save.payload)
                })
                .collect()
        };

        if !drained.is_empty() {
            tracing::debug!("[autosave] flushing {} pending saves", drained.len());
        }

        let mut saved = Vec::with_capacity(drained.len());
        let mut first_error = None;
        for (id, payload) in drained {
            match self.orchestrator.answer(&id, payload).await {
                Ok(outcome) => saved.push((id, outcome)),
                Err(e) => {
                    tracing::warn!("[autosave] failed to flush answer for {}: {}", id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(saved),
        }
    }

    /// Drop every pending save without sending it.
    pub fn cancel_all(&self) {
        let mut pending = self.pending.lock();
        for (_, save) in pending.saves.drain() {
            save.handle.abort();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().saves.len()
    }

    pub fn is_pending(&self, question_id: &str) -> bool {
        self.pending.lock().saves.contains_key(question_id)
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
