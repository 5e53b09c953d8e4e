//! Integration tests for the session runtime.
//!
//! These drive `SessionOrchestrator` end to end against a scripted backend:
//! - Full attempt lifecycle (start, load, answer, submit, result)
//! - Failure paths leaving local state untouched
//! - Out-of-order answer responses
//! - Debounced autosave

#![cfg(test)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_api::InterviewApiError;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::autosave::Autosaver;
use super::events::SessionEvent;
use super::orchestrator::{AnswerOutcome, Phase, SessionOrchestrator};
use super::types::*;
use crate::error::InterviewError;
use crate::remote::InterviewBackend;

type Reply = oneshot::Sender<Result<DateTime<Utc>, InterviewApiError>>;

/// In-memory platform whose answers can be held back and released in any order.
#[derive(Default)]
struct ScriptedBackend {
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, InterviewApiError>>,
    questions: Mutex<Vec<Question>>,
    remote_session: Mutex<Option<Session>>,
    result: Mutex<Option<EvaluationReport>>,
    hold_answers: AtomicBool,
    held: Mutex<Vec<Option<Reply>>>,
    persisted: Mutex<Vec<Answer>>,
    /// When set, `create_session` waits for this before answering
    start_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedBackend {
    fn with_questions(questions: Vec<Question>) -> Arc<Self> {
        let backend = Self::default();
        *backend.questions.lock() = questions;
        Arc::new(backend)
    }

    /// Make the next call to `operation` fail.
    fn fail_next(&self, operation: &'static str, err: InterviewApiError) {
        self.failures.lock().insert(operation, err);
    }

    fn record(&self, operation: &'static str) -> Result<(), InterviewApiError> {
        self.calls.lock().push(operation);
        match self.failures.lock().remove(operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn call_count(&self, operation: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == operation).count()
    }

    fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// Resolve the `index`-th held answer call successfully.
    fn release(&self, index: usize) {
        let reply = self.held.lock()[index].take().expect("answer already released");
        let _ = reply.send(Ok(Utc::now()));
    }

    /// Hold the next `create_session` until the returned sender fires.
    fn gate_start(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.start_gate.lock() = Some(rx);
        tx
    }

    fn set_result(&self, report: EvaluationReport) {
        *self.result.lock() = Some(report);
    }
}

#[async_trait]
impl InterviewBackend for ScriptedBackend {
    async fn create_session(&self, request: &StartRequest) -> Result<Session, InterviewApiError> {
        let gate = self.start_gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.record("create_session")?;
        let session = match request {
            StartRequest::Track { level, stack } => {
                Session::in_progress("s1", *level, *stack, Utc::now())
            }
            StartRequest::Template { template_id } => Session {
                template_name: Some(format!("Template {}", template_id)),
                ..Session::in_progress("s-tpl", Level::Middle, Stack::Fullstack, Utc::now())
            },
        };
        *self.remote_session.lock() = Some(session.clone());
        Ok(session)
    }

    async fn fetch_questions(&self, _session_id: &str) -> Result<Vec<Question>, InterviewApiError> {
        self.record("fetch_questions")?;
        Ok(self.questions.lock().clone())
    }

    async fn fetch_session(&self, session_id: &str) -> Result<Session, InterviewApiError> {
        self.record("fetch_session")?;
        self.remote_session
            .lock()
            .clone()
            .filter(|s| s.id == session_id)
            .ok_or_else(|| InterviewApiError::NotFound(format!("session {}", session_id)))
    }

    async fn persist_answer(
        &self,
        _session_id: &str,
        answer: &Answer,
    ) -> Result<DateTime<Utc>, InterviewApiError> {
        self.record("persist_answer")?;
        self.persisted.lock().push(answer.clone());

        if !self.hold_answers.load(Ordering::SeqCst) {
            return Ok(Utc::now());
        }
        let (tx, rx) = oneshot::channel();
        self.held.lock().push(Some(tx));
        rx.await
            .unwrap_or_else(|_| Err(InterviewApiError::ConfigError("reply dropped".to_string())))
    }

    async fn finalize_session(&self, _session_id: &str) -> Result<DateTime<Utc>, InterviewApiError> {
        self.record("finalize_session")?;
        Ok(Utc::now())
    }

    async fn fetch_result(&self, session_id: &str) -> Result<EvaluationReport, InterviewApiError> {
        self.record("fetch_result")?;
        self.result
            .lock()
            .clone()
            .ok_or_else(|| InterviewApiError::NotFound(format!("result of {}", session_id)))
    }

    async fn list_sessions(&self, _per_page: u32) -> Result<Vec<SessionOverview>, InterviewApiError> {
        self.record("list_sessions")?;
        Ok(self
            .remote_session
            .lock()
            .iter()
            .map(|s| SessionOverview {
                id: s.id.clone(),
                template_name: s.template_name.clone(),
                level: s.level,
                stack: s.stack,
                status: s.status,
                score: None,
                started_at: s.started_at,
                submitted_at: s.submitted_at,
            })
            .collect())
    }

    async fn list_templates(&self) -> Result<Vec<TemplateOverview>, InterviewApiError> {
        self.record("list_templates")?;
        Ok(vec![TemplateOverview {
            id: "t1".to_string(),
            name: "Backend basics".to_string(),
            description: None,
            level: "Junior".to_string(),
            stack: "Backend".to_string(),
            duration_minutes: 30,
        }])
    }
}

fn question(id: &str, question_type: QuestionType, required: bool, order: u32) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {}", id),
        question_type,
        options: match question_type {
            QuestionType::Mcq => vec!["A".to_string(), "B".to_string(), "C".to_string()],
            _ => vec![],
        },
        order,
        is_required: required,
    }
}

/// Two required questions and one optional one
fn standard_questions() -> Vec<Question> {
    vec![
        question("q1", QuestionType::Mcq, true, 1),
        question("q2", QuestionType::Essay, true, 2),
        question("q3", QuestionType::Essay, false, 3),
    ]
}

fn orchestrator(backend: &Arc<ScriptedBackend>) -> Arc<SessionOrchestrator> {
    Arc::new(SessionOrchestrator::new(backend.clone()))
}

async fn started(backend: &Arc<ScriptedBackend>) -> Arc<SessionOrchestrator> {
    let orch = orchestrator(backend);
    let session = orch
        .start(StartRequest::Track {
            level: Level::Junior,
            stack: Stack::Backend,
        })
        .await
        .unwrap();
    orch.load_questions(&session.id).await.unwrap();
    orch
}

fn network_error() -> InterviewApiError {
    InterviewApiError::ApiError {
        status: 503,
        message: "connection reset".to_string(),
    }
}

async fn wait_for_held(backend: &ScriptedBackend, count: usize) {
    for _ in 0..1000 {
        if backend.held_count() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {} held answer calls, got {}", count, backend.held_count());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_full_attempt_reaches_submitted() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);

    let session = orch
        .start(StartRequest::Track {
            level: Level::Junior,
            stack: Stack::Backend,
        })
        .await
        .unwrap();
    let snapshot = orch.snapshot();
    assert_eq!(snapshot.session().unwrap().status, SessionStatus::InProgress);
    assert!(snapshot.questions().is_empty());
    assert_eq!(orch.phase(), Phase::AwaitingQuestions);

    let questions = orch.load_questions(&session.id).await.unwrap();
    assert_eq!(questions.len(), 3);
    assert!(!orch.can_submit());
    assert_eq!(orch.phase(), Phase::Active);

    orch.answer("q1", AnswerPayload::choice("A")).await.unwrap();
    assert!(!orch.can_submit());
    orch.answer("q2", AnswerPayload::text("Ownership moves values"))
        .await
        .unwrap();
    assert!(orch.can_submit());

    let submitted = orch.submit().await.unwrap();
    assert_eq!(submitted.status, SessionStatus::Submitted);
    assert!(submitted.submitted_at.is_some());
    assert_eq!(orch.session().unwrap().status, SessionStatus::Submitted);
    assert_eq!(orch.phase(), Phase::Submitted);
    assert!(!orch.snapshot().is_submitting());
}

#[tokio::test]
async fn test_single_mcq_answer_completes_progress() {
    let backend = ScriptedBackend::with_questions(vec![question("q1", QuestionType::Mcq, true, 1)]);
    let orch = started(&backend).await;

    let outcome = orch.answer("q1", AnswerPayload::choice("B")).await.unwrap();
    assert!(matches!(outcome, AnswerOutcome::Saved { .. }));

    let snapshot = orch.snapshot();
    assert_eq!(
        snapshot.answer("q1").unwrap().selected_option.as_deref(),
        Some("B")
    );
    assert_eq!(snapshot.progress(), 1.0);
}

#[tokio::test]
async fn test_submit_without_required_answers_makes_no_call() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, InterviewError::ValidationFailed(ref m) if m.contains("q1") && m.contains("q2")));
    assert_eq!(backend.call_count("finalize_session"), 0);
    assert_eq!(orch.session().unwrap().status, SessionStatus::InProgress);
    assert_eq!(orch.phase(), Phase::Active);
}

#[tokio::test]
async fn test_failed_persist_keeps_previous_answer() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;

    orch.answer("q2", AnswerPayload::text("first draft"))
        .await
        .unwrap();
    let before = orch.snapshot();

    backend.fail_next("persist_answer", network_error());
    let err = orch
        .answer("q2", AnswerPayload::text("second draft"))
        .await
        .unwrap_err();

    assert!(matches!(err, InterviewError::RemoteFailure { status: Some(503), .. }));
    assert_eq!(orch.snapshot().answers(), before.answers());
    assert_eq!(
        orch.snapshot().answer("q2").unwrap().answer_text.as_deref(),
        Some("first draft")
    );
}

#[tokio::test]
async fn test_failed_start_leaves_state_untouched() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);

    backend.fail_next("create_session", network_error());
    let err = orch
        .start(StartRequest::Template {
            template_id: "t1".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, InterviewError::RemoteFailure { .. }));
    assert_eq!(orch.phase(), Phase::Idle);
    assert!(orch.session().is_none());

    // A retry goes through normally
    let session = orch
        .start(StartRequest::Template {
            template_id: "t1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.template_name.as_deref(), Some("Template t1"));
}

#[tokio::test]
async fn test_failed_start_after_reset_stays_idle() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    assert_eq!(orch.phase(), Phase::Active);

    let gate = backend.gate_start();
    backend.fail_next("create_session", network_error());
    let pending = {
        let orch = orch.clone();
        tokio::spawn(async move {
            orch.start(StartRequest::Template {
                template_id: "t2".to_string(),
            })
            .await
        })
    };
    for _ in 0..100 {
        if orch.phase() == Phase::Starting {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(orch.phase(), Phase::Starting);

    orch.reset();
    gate.send(()).unwrap();

    assert!(pending.await.unwrap().is_err());
    assert_eq!(orch.phase(), Phase::Idle);
    assert!(orch.session().is_none());
}

#[tokio::test]
async fn test_start_replaces_previous_attempt() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    orch.answer("q1", AnswerPayload::choice("C")).await.unwrap();
    orch.next();

    orch.start(StartRequest::Track {
        level: Level::Senior,
        stack: Stack::Devops,
    })
    .await
    .unwrap();

    let snapshot = orch.snapshot();
    assert_eq!(snapshot.session().unwrap().level, Level::Senior);
    assert!(snapshot.questions().is_empty());
    assert!(snapshot.answers().is_empty());
    assert_eq!(snapshot.current_index(), 0);
}

#[tokio::test]
async fn test_failed_submit_can_be_retried() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    orch.answer("q1", AnswerPayload::choice("A")).await.unwrap();
    orch.answer("q2", AnswerPayload::text("done")).await.unwrap();

    backend.fail_next("finalize_session", network_error());
    assert!(orch.submit().await.is_err());
    assert_eq!(orch.session().unwrap().status, SessionStatus::InProgress);
    assert!(!orch.snapshot().is_submitting());
    assert_eq!(orch.phase(), Phase::Active);

    let session = orch.submit().await.unwrap();
    assert_eq!(session.status, SessionStatus::Submitted);
    assert_eq!(backend.call_count("finalize_session"), 2);
}

#[tokio::test]
async fn test_submitted_session_rejects_answers_and_resubmit() {
    let backend = ScriptedBackend::with_questions(vec![question("q1", QuestionType::Mcq, true, 1)]);
    let orch = started(&backend).await;
    orch.answer("q1", AnswerPayload::choice("A")).await.unwrap();
    orch.submit().await.unwrap();
    let persisted = backend.call_count("persist_answer");

    let err = orch.answer("q1", AnswerPayload::choice("B")).await.unwrap_err();
    assert!(matches!(err, InterviewError::ValidationFailed(_)));
    assert_eq!(backend.call_count("persist_answer"), persisted);

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, InterviewError::ValidationFailed(_)));
    assert_eq!(backend.call_count("finalize_session"), 1);
}

#[tokio::test]
async fn test_operations_without_session() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);

    let err = orch.answer("q1", AnswerPayload::choice("A")).await.unwrap_err();
    assert!(matches!(err, InterviewError::SessionNotFound(_)));

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, InterviewError::SessionNotFound(_)));
    assert!(backend.calls.lock().is_empty());
}

#[tokio::test]
async fn test_submit_before_questions_loaded_is_rejected() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);
    orch.start(StartRequest::Track {
        level: Level::Junior,
        stack: Stack::Frontend,
    })
    .await
    .unwrap();

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, InterviewError::ValidationFailed(_)));
    assert_eq!(backend.call_count("finalize_session"), 0);
}

// ============================================================================
// Question loading
// ============================================================================

#[tokio::test]
async fn test_second_load_is_a_no_op() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    orch.answer("q1", AnswerPayload::choice("A")).await.unwrap();
    orch.go_to(2);

    let questions = orch.load_questions("s1").await.unwrap();

    assert_eq!(questions.len(), 3);
    assert_eq!(backend.call_count("fetch_questions"), 1);
    assert_eq!(orch.snapshot().current_index(), 2);
    assert!(orch.snapshot().answer("q1").is_some());
}

#[tokio::test]
async fn test_resume_installs_remote_metadata() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    *backend.remote_session.lock() = Some(Session {
        template_name: Some("Backend basics".to_string()),
        ..Session::in_progress("s9", Level::Lead, Stack::Backend, Utc::now())
    });
    let orch = orchestrator(&backend);

    orch.load_questions("s9").await.unwrap();

    let session = orch.session().unwrap();
    assert_eq!(session.id, "s9");
    assert_eq!(session.level, Level::Lead);
    assert_eq!(orch.phase(), Phase::Active);
    orch.answer("q2", AnswerPayload::text("resumed")).await.unwrap();
}

#[tokio::test]
async fn test_resume_of_submitted_session_is_read_only() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let started_at = Utc::now();
    *backend.remote_session.lock() = Some(Session {
        status: SessionStatus::Submitted,
        submitted_at: Some(started_at),
        ..Session::in_progress("s9", Level::Junior, Stack::Mobile, started_at)
    });
    let orch = orchestrator(&backend);

    orch.load_questions("s9").await.unwrap();

    assert_eq!(orch.phase(), Phase::Submitted);
    let err = orch.answer("q2", AnswerPayload::text("late")).await.unwrap_err();
    assert!(matches!(err, InterviewError::ValidationFailed(_)));
}

#[tokio::test]
async fn test_resume_of_unknown_session_is_not_found() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);

    let err = orch.load_questions("missing").await.unwrap_err();
    assert!(matches!(err, InterviewError::SessionNotFound(_)));
    assert!(orch.session().is_none());
    assert!(!orch.snapshot().is_loading());
}

#[tokio::test]
async fn test_metadata_failure_for_current_session_is_tolerated() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);
    let session = orch
        .start(StartRequest::Track {
            level: Level::Middle,
            stack: Stack::Frontend,
        })
        .await
        .unwrap();

    backend.fail_next("fetch_session", network_error());
    let questions = orch.load_questions(&session.id).await.unwrap();

    assert_eq!(questions.len(), 3);
    assert_eq!(orch.session().unwrap().id, session.id);
}

#[tokio::test]
async fn test_failed_question_fetch_clears_loading() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);
    let session = orch
        .start(StartRequest::Track {
            level: Level::Middle,
            stack: Stack::Frontend,
        })
        .await
        .unwrap();

    backend.fail_next("fetch_questions", network_error());
    assert!(orch.load_questions(&session.id).await.is_err());

    let snapshot = orch.snapshot();
    assert!(!snapshot.is_loading());
    assert!(snapshot.questions().is_empty());
    assert_eq!(orch.phase(), Phase::AwaitingQuestions);
}

// ============================================================================
// Answers
// ============================================================================

#[tokio::test]
async fn test_mismatched_payload_never_reaches_network() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;

    let err = orch.answer("q1", AnswerPayload::text("B")).await.unwrap_err();
    assert!(matches!(err, InterviewError::ValidationFailed(_)));

    let err = orch.answer("q1", AnswerPayload::choice("Z")).await.unwrap_err();
    assert!(matches!(err, InterviewError::ValidationFailed(_)));

    assert_eq!(backend.call_count("persist_answer"), 0);
}

#[tokio::test]
async fn test_answer_before_questions_is_persisted_but_not_mirrored() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);
    orch.start(StartRequest::Track {
        level: Level::Junior,
        stack: Stack::Backend,
    })
    .await
    .unwrap();

    let outcome = orch.answer("q2", AnswerPayload::text("early")).await.unwrap();

    assert!(matches!(outcome, AnswerOutcome::Saved { .. }));
    assert_eq!(backend.call_count("persist_answer"), 1);
    assert!(orch.snapshot().answers().is_empty());
}

#[tokio::test]
async fn test_newer_answer_wins_when_older_response_arrives_last() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    backend.hold_answers.store(true, Ordering::SeqCst);

    let first = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.answer("q2", AnswerPayload::text("A")).await })
    };
    wait_for_held(&backend, 1).await;
    let second = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.answer("q2", AnswerPayload::text("B")).await })
    };
    wait_for_held(&backend, 2).await;

    backend.release(1);
    let outcome = second.await.unwrap().unwrap();
    assert!(matches!(outcome, AnswerOutcome::Saved { .. }));

    backend.release(0);
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome, AnswerOutcome::Superseded);

    assert_eq!(
        orch.snapshot().answer("q2").unwrap().answer_text.as_deref(),
        Some("B")
    );
}

#[tokio::test]
async fn test_answers_for_different_questions_commute() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    backend.hold_answers.store(true, Ordering::SeqCst);

    let first = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.answer("q2", AnswerPayload::text("essay")).await })
    };
    wait_for_held(&backend, 1).await;
    let second = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.answer("q3", AnswerPayload::text("optional")).await })
    };
    wait_for_held(&backend, 2).await;

    backend.release(1);
    backend.release(0);
    assert!(matches!(
        second.await.unwrap().unwrap(),
        AnswerOutcome::Saved { .. }
    ));
    assert!(matches!(
        first.await.unwrap().unwrap(),
        AnswerOutcome::Saved { .. }
    ));

    let snapshot = orch.snapshot();
    assert_eq!(snapshot.answer("q2").unwrap().answer_text.as_deref(), Some("essay"));
    assert_eq!(snapshot.answer("q3").unwrap().answer_text.as_deref(), Some("optional"));
}

#[tokio::test]
async fn test_response_from_previous_session_is_discarded() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    backend.hold_answers.store(true, Ordering::SeqCst);

    let stale = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.answer("q2", AnswerPayload::text("old")).await })
    };
    wait_for_held(&backend, 1).await;

    orch.reset();
    orch.start(StartRequest::Track {
        level: Level::Junior,
        stack: Stack::Backend,
    })
    .await
    .unwrap();
    orch.load_questions("s1").await.unwrap();

    backend.release(0);
    assert_eq!(stale.await.unwrap().unwrap(), AnswerOutcome::Superseded);
    assert!(orch.snapshot().answers().is_empty());
}

#[tokio::test]
async fn test_answer_confirmed_after_submit_is_not_recorded() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    orch.answer("q1", AnswerPayload::choice("A")).await.unwrap();
    orch.answer("q2", AnswerPayload::text("ownership")).await.unwrap();

    backend.hold_answers.store(true, Ordering::SeqCst);
    let late = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.answer("q3", AnswerPayload::text("late")).await })
    };
    wait_for_held(&backend, 1).await;

    let before = orch.snapshot().answers().clone();
    let session = orch.submit().await.unwrap();
    assert_eq!(session.status, SessionStatus::Submitted);

    backend.release(0);
    assert_eq!(late.await.unwrap().unwrap(), AnswerOutcome::Superseded);

    let after = orch.snapshot();
    assert_eq!(after.answers(), &before);
    assert!(after.answer("q3").is_none());
    assert_eq!(orch.phase(), Phase::Submitted);
}

// ============================================================================
// Navigation, results, catalog
// ============================================================================

#[tokio::test]
async fn test_navigation_is_clamped_and_local() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    let calls = backend.calls.lock().len();

    assert_eq!(orch.previous(), 0);
    assert_eq!(orch.next(), 1);
    assert_eq!(orch.next(), 2);
    assert_eq!(orch.next(), 2);
    assert_eq!(orch.go_to(99), 2);
    assert_eq!(orch.go_to(1), 1);
    assert_eq!(orch.current_question().unwrap().id, "q2");

    assert_eq!(backend.calls.lock().len(), calls);
}

#[tokio::test]
async fn test_result_pending_then_evaluated() {
    let backend = ScriptedBackend::with_questions(vec![question("q1", QuestionType::Mcq, true, 1)]);
    let orch = started(&backend).await;
    orch.answer("q1", AnswerPayload::choice("A")).await.unwrap();
    orch.submit().await.unwrap();

    let mut report = EvaluationReport {
        session_id: "s1".to_string(),
        overall_score: None,
        level: Level::Junior,
        stack: Stack::Backend,
        submitted_at: Some(Utc::now()),
        evaluated_at: None,
        feedback: None,
        question_results: vec![],
    };
    backend.set_result(report.clone());

    let err = orch.get_result("s1").await.unwrap_err();
    assert!(matches!(err, InterviewError::NotYetEvaluated(ref id) if id == "s1"));
    assert_eq!(orch.session().unwrap().status, SessionStatus::Submitted);

    report.overall_score = Some(8.5);
    report.evaluated_at = Some(Utc::now());
    report.feedback = Some("Solid fundamentals".to_string());
    backend.set_result(report);

    let result = orch.get_result("s1").await.unwrap();
    assert_eq!(result.overall_score, 8.5);
    assert_eq!(orch.session().unwrap().status, SessionStatus::Evaluated);
}

#[tokio::test]
async fn test_history_and_templates() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;

    let history = orch.history(10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "s1");

    let templates = orch.templates().await.unwrap();
    assert_eq!(templates[0].name, "Backend basics");

    backend.fail_next("list_templates", network_error());
    assert!(matches!(
        orch.templates().await.unwrap_err(),
        InterviewError::RemoteFailure { .. }
    ));
}

#[tokio::test]
async fn test_events_follow_confirmed_changes() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = orchestrator(&backend);
    let mut events = orch.subscribe();

    let session = orch
        .start(StartRequest::Track {
            level: Level::Junior,
            stack: Stack::Backend,
        })
        .await
        .unwrap();
    orch.load_questions(&session.id).await.unwrap();
    orch.answer("q1", AnswerPayload::choice("A")).await.unwrap();
    backend.fail_next("persist_answer", network_error());
    let _ = orch.answer("q2", AnswerPayload::text("x")).await;
    orch.next();

    assert!(matches!(events.recv().await, Some(SessionEvent::Started { .. })));
    assert!(matches!(
        events.recv().await,
        Some(SessionEvent::QuestionsLoaded { total: 3, required: 2, .. })
    ));
    match events.recv().await {
        Some(SessionEvent::AnswerSaved {
            question_id,
            can_submit,
            ..
        }) => {
            assert_eq!(question_id, "q1");
            assert!(!can_submit);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(
        events.recv().await,
        Some(SessionEvent::Failed { ref operation, .. }) if operation == "answer"
    ));
    assert_eq!(
        events.recv().await,
        Some(SessionEvent::CursorMoved { index: 1, total: 3 })
    );
}

// ============================================================================
// Autosave
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_autosave_sends_only_the_last_edit() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    let autosaver = Autosaver::new(orch.clone(), Duration::from_millis(500));

    autosaver.schedule("q2", AnswerPayload::text("Own"));
    tokio::time::sleep(Duration::from_millis(300)).await;
    autosaver.schedule("q2", AnswerPayload::text("Ownership"));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.call_count("persist_answer"), 0);
    assert!(autosaver.is_pending("q2"));

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(backend.call_count("persist_answer"), 1);
    assert_eq!(
        backend.persisted.lock()[0].answer_text.as_deref(),
        Some("Ownership")
    );
    assert_eq!(autosaver.pending_count(), 0);
    assert_eq!(
        orch.snapshot().answer("q2").unwrap().answer_text.as_deref(),
        Some("Ownership")
    );
}

#[tokio::test(start_paused = true)]
async fn test_autosave_flush_sends_immediately() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;
    let autosaver = Autosaver::new(orch.clone(), Duration::from_millis(500));

    autosaver.schedule("q2", AnswerPayload::text("essay"));
    autosaver.schedule("q3", AnswerPayload::text("notes"));

    let saved = autosaver.flush().await.unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(autosaver.pending_count(), 0);

    // The debounced timers were cancelled by the flush
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.call_count("persist_answer"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_autosaver_cancels_pending_saves() {
    let backend = ScriptedBackend::with_questions(standard_questions());
    let orch = started(&backend).await;

    {
        let autosaver = Autosaver::new(orch.clone(), Duration::from_millis(500));
        autosaver.schedule("q2", AnswerPayload::text("abandoned"));
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(backend.call_count("persist_answer"), 0);
    assert!(orch.snapshot().answer("q2").is_none());
}

// ============================================================================
// Property tests
// ============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn release_orders() -> impl Strategy<Value = Vec<usize>> {
        (2usize..6).prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: whatever order responses arrive in, the last issued answer wins
        #[test]
        fn prop_last_issued_answer_wins(order in release_orders()) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let final_text = runtime.block_on(async {
                let backend = ScriptedBackend::with_questions(standard_questions());
                let orch = started(&backend).await;
                backend.hold_answers.store(true, Ordering::SeqCst);

                let mut handles = Vec::new();
                for i in 0..order.len() {
                    let orch = orch.clone();
                    handles.push(tokio::spawn(async move {
                        orch.answer("q2", AnswerPayload::text(format!("draft {}", i))).await
                    }));
                    wait_for_held(&backend, i + 1).await;
                }

                let mut handles: Vec<Option<_>> = handles.into_iter().map(Some).collect();
                for &index in &order {
                    backend.release(index);
                    let handle = handles[index].take().unwrap();
                    handle.await.unwrap().unwrap();
                }

                orch.snapshot()
                    .answer("q2")
                    .and_then(|a| a.answer_text.clone())
            });

            prop_assert_eq!(final_text, Some(format!("draft {}", order.len() - 1)));
        }
    }
}
