//! Seam between the session runtime and the interview platform.
//!
//! The orchestrator only talks to [`InterviewBackend`]. The production
//! implementation wraps [`interview_api::Client`] and converts wire payloads
//! into the domain model; tests substitute a scripted backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_api::{
    Client, CreateSessionRequest, EvaluationResult, InterviewApiError, PersistAnswerRequest,
    SessionSummary, TemplateSummary, WireQuestion, WireQuestionResult,
};

use crate::session::types::{
    Answer, EvaluationReport, Question, QuestionResult, Session, SessionOverview, StartRequest,
    TemplateOverview,
};

/// Remote operations the orchestrator depends on.
#[async_trait]
pub trait InterviewBackend: Send + Sync {
    /// Create a session. The returned session is always in progress.
    async fn create_session(&self, request: &StartRequest) -> Result<Session, InterviewApiError>;

    /// Fetch the question set, ordered by `order`.
    async fn fetch_questions(&self, session_id: &str) -> Result<Vec<Question>, InterviewApiError>;

    /// Fetch the authoritative session metadata.
    async fn fetch_session(&self, session_id: &str) -> Result<Session, InterviewApiError>;

    /// Persist one answer and return the time it was saved.
    async fn persist_answer(
        &self,
        session_id: &str,
        answer: &Answer,
    ) -> Result<DateTime<Utc>, InterviewApiError>;

    /// Finalize a session and return the submission time.
    async fn finalize_session(&self, session_id: &str) -> Result<DateTime<Utc>, InterviewApiError>;

    /// Fetch the evaluation, which may still be pending.
    async fn fetch_result(&self, session_id: &str) -> Result<EvaluationReport, InterviewApiError>;

    async fn list_sessions(&self, per_page: u32) -> Result<Vec<SessionOverview>, InterviewApiError>;

    async fn list_templates(&self) -> Result<Vec<TemplateOverview>, InterviewApiError>;
}

#[async_trait]
impl InterviewBackend for Client {
    async fn create_session(&self, request: &StartRequest) -> Result<Session, InterviewApiError> {
        let wire = match request {
            StartRequest::Template { template_id } => CreateSessionRequest::Template {
                template_id: template_id.clone(),
            },
            StartRequest::Track { level, stack } => CreateSessionRequest::Track {
                level: *level,
                stack: *stack,
            },
        };
        let created = Client::create_session(self, &wire).await?;
        tracing::info!("[api] created session {}", created.session_id);

        Ok(Session::in_progress(
            created.session_id,
            created.level,
            created.stack,
            created.started_at,
        ))
    }

    async fn fetch_questions(&self, session_id: &str) -> Result<Vec<Question>, InterviewApiError> {
        let set = Client::fetch_questions(self, session_id).await?;
        if !set.session_id.is_empty() && set.session_id != session_id {
            return Err(InterviewApiError::ParseError(format!(
                "asked for questions of session {}, got session {}",
                session_id, set.session_id
            )));
        }
        Ok(into_questions(set.questions))
    }

    async fn fetch_session(&self, session_id: &str) -> Result<Session, InterviewApiError> {
        Client::fetch_session(self, session_id).await.map(Session::from)
    }

    async fn persist_answer(
        &self,
        session_id: &str,
        answer: &Answer,
    ) -> Result<DateTime<Utc>, InterviewApiError> {
        let request = PersistAnswerRequest {
            question_id: answer.question_id.clone(),
            answer_content: answer.answer_text.clone(),
            selected_option: answer.selected_option.clone(),
            voice_file_url: answer.voice_file_url.clone(),
        };
        let saved = Client::persist_answer(self, session_id, &request).await?;
        Ok(saved.saved_at)
    }

    async fn finalize_session(&self, session_id: &str) -> Result<DateTime<Utc>, InterviewApiError> {
        let finalized = Client::finalize_session(self, session_id).await?;
        Ok(finalized.submitted_at)
    }

    async fn fetch_result(&self, session_id: &str) -> Result<EvaluationReport, InterviewApiError> {
        Client::fetch_result(self, session_id)
            .await
            .map(EvaluationReport::from)
    }

    async fn list_sessions(&self, per_page: u32) -> Result<Vec<SessionOverview>, InterviewApiError> {
        let page = Client::list_sessions(self, per_page).await?;
        Ok(page.items.into_iter().map(SessionOverview::from).collect())
    }

    async fn list_templates(&self) -> Result<Vec<TemplateOverview>, InterviewApiError> {
        let page = Client::list_templates(self).await?;
        Ok(page.items.into_iter().map(TemplateOverview::from).collect())
    }
}

/// Convert wire questions, sorted by their declared order.
pub fn into_questions(wire: Vec<WireQuestion>) -> Vec<Question> {
    let mut questions: Vec<Question> = wire.into_iter().map(Question::from).collect();
    questions.sort_by_key(|q| q.order);
    questions
}

impl From<WireQuestion> for Question {
    fn from(wire: WireQuestion) -> Self {
        Question {
            id: wire.question_id,
            text: wire.content,
            question_type: wire.kind.into(),
            options: wire.options.unwrap_or_default(),
            order: wire.order,
            is_required: wire.is_required,
        }
    }
}

impl From<SessionSummary> for Session {
    fn from(summary: SessionSummary) -> Self {
        Session {
            id: summary.id,
            level: summary.level,
            stack: summary.stack,
            status: summary.status.into(),
            started_at: summary.started_at,
            submitted_at: summary.submitted_at,
            template_name: summary.template_name,
        }
    }
}

impl From<SessionSummary> for SessionOverview {
    fn from(summary: SessionSummary) -> Self {
        SessionOverview {
            id: summary.id,
            template_name: summary.template_name,
            level: summary.level,
            stack: summary.stack,
            status: summary.status.into(),
            score: summary.score,
            started_at: summary.started_at,
            submitted_at: summary.submitted_at,
        }
    }
}

impl From<WireQuestionResult> for QuestionResult {
    fn from(wire: WireQuestionResult) -> Self {
        QuestionResult {
            question_id: wire.question_id,
            question_text: wire.question_text,
            user_answer: wire.user_answer,
            score: wire.score,
            feedback: wire.feedback,
        }
    }
}

impl From<EvaluationResult> for EvaluationReport {
    fn from(wire: EvaluationResult) -> Self {
        EvaluationReport {
            session_id: wire.session_id,
            overall_score: wire.overall_score,
            level: wire.level,
            stack: wire.stack,
            submitted_at: wire.submitted_at,
            evaluated_at: wire.evaluated_at,
            feedback: wire.feedback,
            question_results: wire
                .question_results
                .into_iter()
                .map(QuestionResult::from)
                .collect(),
        }
    }
}

impl From<TemplateSummary> for TemplateOverview {
    fn from(wire: TemplateSummary) -> Self {
        TemplateOverview {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            level: wire.level,
            stack: wire.stack,
            duration_minutes: wire.duration_minutes,
        }
    }
}
