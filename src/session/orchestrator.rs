//! Session orchestration.
//!
//! `SessionOrchestrator` sequences remote calls with store mutations:
//! - state is only written after the platform confirms a change
//! - the store lock is never held across an `.await`
//! - overlapping `answer` calls for one question resolve to the newest one
//!
//! Callers get either a value or an [`InterviewError`]; nothing is retried here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use super::events::SessionEvent;
use super::sequencer::AnswerSequencer;
use super::store::SessionStore;
use super::types::{
    AnswerPayload, InterviewResult, Question, Session, SessionOverview, SessionStatus,
    StartRequest, TemplateOverview,
};
use crate::error::{InterviewError, Result};
use crate::remote::InterviewBackend;

/// Where the orchestrator is in the lifecycle of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session
    Idle,
    /// Create-session call in flight
    Starting,
    /// Session exists, questions not loaded yet
    AwaitingQuestions,
    /// Questions loaded, answers accepted
    Active,
    /// Finalize call in flight
    Submitting,
    /// Session is read-only
    Submitted,
}

/// Result of an `answer` call that reached the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// Persisted and mirrored into the store
    Saved { saved_at: DateTime<Utc> },
    /// Persisted but not recorded: a newer answer for the same question
    /// already landed, or the session was submitted or replaced meanwhile
    Superseded,
}

struct Inner {
    store: SessionStore,
    phase: Phase,
    sequencer: AnswerSequencer,
    /// Bumped whenever the session is replaced or cleared
    generation: u64,
}

pub struct SessionOrchestrator {
    backend: Arc<dyn InterviewBackend>,
    inner: Mutex<Inner>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
}

impl SessionOrchestrator {
    pub fn new(backend: Arc<dyn InterviewBackend>) -> Self {
        Self {
            backend,
            inner: Mutex::new(Inner {
                store: SessionStore::new(),
                phase: Phase::Idle,
                sequencer: AnswerSequencer::new(),
                generation: 0,
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Drop every subscriber. Receivers drain what is buffered, then end.
    pub fn close_subscribers(&self) {
        self.subscribers.lock().clear();
    }

    fn emit(&self, event: SessionEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn fail(&self, operation: &str, err: InterviewError) -> InterviewError {
        tracing::warn!("[session] {} failed: {}", operation, err);
        self.emit(SessionEvent::Failed {
            operation: operation.to_string(),
            message: err.to_string(),
        });
        err
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Create a new session and make it the current one.
    ///
    /// On success the store is cleared before the new session is installed.
    /// On failure the previous state is left exactly as it was.
    pub async fn start(&self, request: StartRequest) -> Result<Session> {
        let (previous, generation) = {
            let mut inner = self.inner.lock();
            match inner.phase {
                Phase::Starting => {
                    return Err(InterviewError::ValidationFailed(
                        "a session is already being started".to_string(),
                    ))
                }
                Phase::Submitting => {
                    return Err(InterviewError::ValidationFailed(
                        "cannot start while a submission is in flight".to_string(),
                    ))
                }
                phase => {
                    inner.phase = Phase::Starting;
                    (phase, inner.generation)
                }
            }
        };

        tracing::info!("[session] starting session: {:?}", request);

        let session = match self.backend.create_session(&request).await {
            Ok(session) => session,
            Err(e) => {
                let mut inner = self.inner.lock();
                // A reset while in flight already cleared the previous state
                inner.phase = if inner.generation == generation {
                    previous
                } else {
                    Phase::Idle
                };
                drop(inner);
                return Err(self.fail("start", e.into()));
            }
        };

        {
            let mut inner = self.inner.lock();
            inner.store.reset();
            inner.sequencer.reset();
            inner.generation += 1;
            inner.store.set_session(session.clone());
            inner.phase = Phase::AwaitingQuestions;
        }

        tracing::info!("[session] session {} started", session.id);
        self.emit(SessionEvent::Started {
            session_id: session.id.clone(),
            level: session.level,
            stack: session.stack,
        });
        Ok(session)
    }

    /// Fetch and install the question set of `session_id`.
    ///
    /// Authoritative metadata is fetched alongside. For a session the store
    /// does not hold yet (resume) the metadata is required and replaces the
    /// current session; for the current session a metadata failure is only
    /// logged. Sessions that are already submitted load read-only.
    ///
    /// Calling this again once questions are loaded returns them unchanged.
    pub async fn load_questions(&self, session_id: &str) -> Result<Vec<Question>> {
        let (resuming, generation) = {
            let mut inner = self.inner.lock();
            if let Some(current) = inner.store.session() {
                if current.id == session_id && !inner.store.questions().is_empty() {
                    tracing::debug!(
                        "[session] questions for {} already loaded, ignoring reload",
                        session_id
                    );
                    return Ok(inner.store.questions().to_vec());
                }
            }
            if matches!(inner.phase, Phase::Starting | Phase::Submitting) {
                return Err(InterviewError::ValidationFailed(format!(
                    "cannot load questions while the session is {:?}",
                    inner.phase
                )));
            }
            let resuming = inner
                .store
                .session()
                .map(|s| s.id != session_id)
                .unwrap_or(true);
            inner.store.set_loading(true);
            (resuming, inner.generation)
        };

        tracing::debug!(
            "[session] loading questions for {} (resume: {})",
            session_id,
            resuming
        );

        let (meta, questions) = tokio::join!(
            self.backend.fetch_session(session_id),
            self.backend.fetch_questions(session_id)
        );

        let meta = match meta {
            Ok(meta) => Some(meta),
            Err(e) if resuming => {
                self.inner.lock().store.set_loading(false);
                return Err(self.fail("load_questions", e.into()));
            }
            Err(e) => {
                tracing::warn!(
                    "[session] could not refresh metadata of {}: {}",
                    session_id,
                    e
                );
                None
            }
        };

        let questions = match questions {
            Ok(questions) => questions,
            Err(e) => {
                self.inner.lock().store.set_loading(false);
                return Err(self.fail("load_questions", e.into()));
            }
        };

        let event = {
            let mut inner = self.inner.lock();
            inner.store.set_loading(false);

            if inner.generation != generation {
                drop(inner);
                return Err(self.fail(
                    "load_questions",
                    InterviewError::SessionNotFound(format!(
                        "session {} was replaced while its questions were loading",
                        session_id
                    )),
                ));
            }

            if resuming {
                inner.store.reset();
                inner.sequencer.reset();
                inner.generation += 1;
            }

            if let Some(meta) = meta {
                let merged = match inner.store.session() {
                    // Never let a lagging listing move the local status backwards
                    Some(local) if local.id == meta.id && local.status > meta.status => Session {
                        status: local.status,
                        submitted_at: local.submitted_at,
                        ..meta
                    },
                    _ => meta,
                };
                inner.store.set_session(merged);
            }

            inner.store.set_questions(questions.clone());

            let status = inner
                .store
                .session()
                .map(|s| s.status)
                .unwrap_or(SessionStatus::InProgress);
            inner.phase = if status.is_writable() {
                Phase::Active
            } else {
                Phase::Submitted
            };

            SessionEvent::QuestionsLoaded {
                session_id: session_id.to_string(),
                total: questions.len(),
                required: questions.iter().filter(|q| q.is_required).count(),
                status,
            }
        };

        tracing::info!(
            "[session] loaded {} questions for {}",
            questions.len(),
            session_id
        );
        self.emit(event);
        Ok(questions)
    }

    /// Persist an answer and, once the platform confirms it, record it locally.
    ///
    /// Payloads are checked against the question type when the question is
    /// known. A failed call leaves the previously stored answer in place.
    pub async fn answer(
        &self,
        question_id: &str,
        payload: AnswerPayload,
    ) -> Result<AnswerOutcome> {
        let (session_id, ticket) = {
            let mut inner = self.inner.lock();
            let session = inner
                .store
                .session()
                .ok_or_else(|| InterviewError::SessionNotFound("no active session".to_string()))?;

            if matches!(inner.phase, Phase::Submitting | Phase::Submitted)
                || !session.status.is_writable()
            {
                return Err(InterviewError::ValidationFailed(format!(
                    "session {} no longer accepts answers",
                    session.id
                )));
            }
            let session_id = session.id.clone();

            match inner.store.question(question_id) {
                Some(question) => payload
                    .validate_for(question)
                    .map_err(InterviewError::ValidationFailed)?,
                None => tracing::warn!(
                    "[session] answering unknown question {} of session {}",
                    question_id,
                    session_id
                ),
            }

            (session_id, inner.sequencer.issue())
        };

        let answer = payload.into_answer(question_id);
        tracing::debug!(
            "[session] persisting answer for {} (seq {})",
            question_id,
            ticket.seq()
        );

        let saved_at = self
            .backend
            .persist_answer(&session_id, &answer)
            .await
            .map_err(|e| self.fail("answer", e.into()))?;

        let event = {
            let mut inner = self.inner.lock();
            let frozen = matches!(inner.phase, Phase::Submitting | Phase::Submitted)
                || inner
                    .store
                    .session()
                    .map_or(true, |session| !session.status.is_writable());
            if frozen {
                tracing::debug!(
                    "[session] answer for {} confirmed after submission, not recorded",
                    question_id
                );
                None
            } else if !inner.sequencer.accept(question_id, ticket) {
                None
            } else if inner.store.question(question_id).is_none() {
                tracing::warn!(
                    "[session] question {} is not loaded, answer not mirrored",
                    question_id
                );
                return Ok(AnswerOutcome::Saved { saved_at });
            } else {
                inner.store.save_answer(question_id, answer);
                Some(SessionEvent::AnswerSaved {
                    question_id: question_id.to_string(),
                    saved_at,
                    progress: inner.store.progress(),
                    can_submit: inner.store.can_submit(),
                })
            }
        };

        match event {
            Some(event) => {
                self.emit(event);
                Ok(AnswerOutcome::Saved { saved_at })
            }
            None => {
                tracing::debug!(
                    "[session] discarding answer for {} (seq {})",
                    question_id,
                    ticket.seq()
                );
                self.emit(SessionEvent::AnswerSuperseded {
                    question_id: question_id.to_string(),
                });
                Ok(AnswerOutcome::Superseded)
            }
        }
    }

    /// Finalize the session.
    ///
    /// Refused without a network call unless every required question has an
    /// answer. On failure the session stays in progress and may be retried.
    pub async fn submit(&self) -> Result<Session> {
        let session_id = {
            let mut inner = self.inner.lock();
            let session = inner
                .store
                .session()
                .ok_or_else(|| InterviewError::SessionNotFound("no active session".to_string()))?;
            let session_id = session.id.clone();

            match inner.phase {
                Phase::Submitting => {
                    return Err(InterviewError::ValidationFailed(format!(
                        "session {} is already being submitted",
                        session_id
                    )))
                }
                Phase::AwaitingQuestions | Phase::Starting => {
                    return Err(InterviewError::ValidationFailed(format!(
                        "questions of session {} are not loaded",
                        session_id
                    )))
                }
                _ => {}
            }
            if session.status != SessionStatus::InProgress {
                return Err(InterviewError::ValidationFailed(format!(
                    "session {} is already {:?}",
                    session_id, session.status
                )));
            }
            if !inner.store.can_submit() {
                let missing = inner.store.missing_required().join(", ");
                return Err(InterviewError::ValidationFailed(format!(
                    "required questions unanswered: {}",
                    missing
                )));
            }

            inner.phase = Phase::Submitting;
            inner.store.set_submitting(true);
            session_id
        };

        tracing::info!("[session] submitting session {}", session_id);

        let submitted_at = match self.backend.finalize_session(&session_id).await {
            Ok(at) => at,
            Err(e) => {
                let mut inner = self.inner.lock();
                inner.store.set_submitting(false);
                inner.phase = Phase::Active;
                drop(inner);
                return Err(self.fail("submit", e.into()));
            }
        };

        let session = {
            let mut inner = self.inner.lock();
            inner.store.set_submitting(false);
            inner.phase = Phase::Submitted;
            let updated = inner
                .store
                .session()
                .and_then(|s| s.submitted(submitted_at))
                .ok_or_else(|| {
                    InterviewError::SessionNotFound(format!(
                        "session {} disappeared during submission",
                        session_id
                    ))
                })?;
            inner.store.set_session(updated.clone());
            updated
        };

        tracing::info!("[session] session {} submitted", session_id);
        self.emit(SessionEvent::Submitted {
            session_id,
            submitted_at,
        });
        Ok(session)
    }

    /// Fetch the evaluation of `session_id`.
    ///
    /// Returns [`InterviewError::NotYetEvaluated`] while grading is running.
    /// When the session is the current one, its status moves to evaluated.
    pub async fn get_result(&self, session_id: &str) -> Result<InterviewResult> {
        let report = self
            .backend
            .fetch_result(session_id)
            .await
            .map_err(|e| self.fail("get_result", e.into()))?;

        let result = report
            .into_result()
            .ok_or_else(|| InterviewError::NotYetEvaluated(session_id.to_string()))?;

        {
            let mut inner = self.inner.lock();
            let evaluated = inner
                .store
                .session()
                .filter(|s| s.id == session_id)
                .and_then(|s| s.evaluated());
            if let Some(evaluated) = evaluated {
                inner.store.set_session(evaluated);
            }
        }

        tracing::info!(
            "[session] session {} evaluated: {:.1}",
            session_id,
            result.overall_score
        );
        self.emit(SessionEvent::Evaluated {
            session_id: session_id.to_string(),
            overall_score: result.overall_score,
        });
        Ok(result)
    }

    /// Drop the current session. Responses still in flight are discarded.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.store.reset();
        inner.sequencer.reset();
        inner.generation += 1;
        inner.phase = Phase::Idle;
        tracing::debug!("[session] reset");
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Move to the next question. Returns the new cursor.
    pub fn next(&self) -> usize {
        self.navigate(|store| store.next_question())
    }

    /// Move to the previous question. Returns the new cursor.
    pub fn previous(&self) -> usize {
        self.navigate(|store| store.previous_question())
    }

    /// Jump to `index`, clamped to the loaded questions.
    pub fn go_to(&self, index: usize) -> usize {
        self.navigate(|store| {
            let last = store.total_questions().saturating_sub(1);
            store.set_current_index(index.min(last));
        })
    }

    fn navigate(&self, step: impl FnOnce(&mut SessionStore)) -> usize {
        let (index, total) = {
            let mut inner = self.inner.lock();
            step(&mut inner.store);
            (inner.store.current_index(), inner.store.total_questions())
        };
        self.emit(SessionEvent::CursorMoved { index, total });
        index
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Copy of the current store state.
    pub fn snapshot(&self) -> SessionStore {
        self.inner.lock().store.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.lock().store.session().cloned()
    }

    pub fn current_question(&self) -> Option<Question> {
        self.inner.lock().store.current_question().cloned()
    }

    pub fn progress(&self) -> f64 {
        self.inner.lock().store.progress()
    }

    pub fn can_submit(&self) -> bool {
        self.inner.lock().store.can_submit()
    }

    /// The caller's past sessions, most recent first.
    pub async fn history(&self, per_page: u32) -> Result<Vec<SessionOverview>> {
        self.backend
            .list_sessions(per_page)
            .await
            .map_err(|e| self.fail("history", e.into()))
    }

    /// Templates available for a template-driven start.
    pub async fn templates(&self) -> Result<Vec<TemplateOverview>> {
        self.backend
            .list_templates()
            .await
            .map_err(|e| self.fail("templates", e.into()))
    }
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SessionOrchestrator")
            .field("phase", &inner.phase)
            .field("session", &inner.store.session().map(|s| s.id.as_str()))
            .finish_non_exhaustive()
    }
}
