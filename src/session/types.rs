//! Domain model of an interview attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use interview_api::{Level, Stack};

/// Lifecycle of a session. Moves forward one step at a time and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Submitted,
    Evaluated,
}

impl SessionStatus {
    /// The only status this one may move to, if any.
    pub fn successor(self) -> Option<SessionStatus> {
        match self {
            SessionStatus::InProgress => Some(SessionStatus::Submitted),
            SessionStatus::Submitted => Some(SessionStatus::Evaluated),
            SessionStatus::Evaluated => None,
        }
    }

    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        self.successor() == Some(next)
    }

    /// Answers may only be written while in progress.
    pub fn is_writable(self) -> bool {
        self == SessionStatus::InProgress
    }
}

impl From<interview_api::InterviewStatus> for SessionStatus {
    fn from(status: interview_api::InterviewStatus) -> Self {
        match status {
            interview_api::InterviewStatus::InProgress => SessionStatus::InProgress,
            interview_api::InterviewStatus::Submitted => SessionStatus::Submitted,
            interview_api::InterviewStatus::Evaluated => SessionStatus::Evaluated,
        }
    }
}

/// One interview attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub level: Level,
    pub stack: Stack,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    /// Present for template-driven sessions when the platform reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
}

impl Session {
    /// A freshly created session.
    pub fn in_progress(id: impl Into<String>, level: Level, stack: Stack, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            level,
            stack,
            status: SessionStatus::InProgress,
            started_at,
            submitted_at: None,
            template_name: None,
        }
    }

    /// Copy of this session moved to `Submitted` at `submitted_at`.
    ///
    /// Returns `None` if the session is not in progress.
    pub fn submitted(&self, submitted_at: DateTime<Utc>) -> Option<Session> {
        if !self.status.can_transition_to(SessionStatus::Submitted) {
            return None;
        }
        Some(Session {
            status: SessionStatus::Submitted,
            submitted_at: Some(submitted_at),
            ..self.clone()
        })
    }

    /// Copy of this session moved to `Evaluated`, or `None` if it is not submitted.
    pub fn evaluated(&self) -> Option<Session> {
        if !self.status.can_transition_to(SessionStatus::Evaluated) {
            return None;
        }
        Some(Session {
            status: SessionStatus::Evaluated,
            ..self.clone()
        })
    }
}

/// Input modality of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Mcq,
    Essay,
    Voice,
}

impl From<interview_api::QuestionKind> for QuestionType {
    fn from(kind: interview_api::QuestionKind) -> Self {
        match kind {
            interview_api::QuestionKind::Mcq => QuestionType::Mcq,
            interview_api::QuestionKind::Essay => QuestionType::Essay,
            interview_api::QuestionKind::Voice => QuestionType::Voice,
        }
    }
}

/// One prompt of a session's fixed question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Only populated for multiple-choice questions
    #[serde(default)]
    pub options: Vec<String>,
    pub order: u32,
    pub is_required: bool,
}

/// What the user entered for a question, shaped by the question's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerPayload {
    /// Free text for an essay question
    Text { text: String },
    /// Chosen option of a multiple-choice question
    Choice { option: String },
    /// Recording and/or transcript of a voice question
    Voice {
        #[serde(default)]
        file_url: Option<String>,
        #[serde(default)]
        transcript: Option<String>,
    },
}

impl AnswerPayload {
    pub fn text(text: impl Into<String>) -> Self {
        AnswerPayload::Text { text: text.into() }
    }

    pub fn choice(option: impl Into<String>) -> Self {
        AnswerPayload::Choice {
            option: option.into(),
        }
    }

    pub fn transcript(transcript: impl Into<String>) -> Self {
        AnswerPayload::Voice {
            file_url: None,
            transcript: Some(transcript.into()),
        }
    }

    /// The question type this payload is meant for.
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerPayload::Text { .. } => QuestionType::Essay,
            AnswerPayload::Choice { .. } => QuestionType::Mcq,
            AnswerPayload::Voice { .. } => QuestionType::Voice,
        }
    }

    /// Check the payload against the question it answers.
    pub fn validate_for(&self, question: &Question) -> Result<(), String> {
        if self.question_type() != question.question_type {
            return Err(format!(
                "question {} expects a {:?} answer, got {:?}",
                question.id,
                question.question_type,
                self.question_type()
            ));
        }

        match self {
            AnswerPayload::Choice { option } if !question.options.contains(option) => Err(
                format!("'{}' is not an option of question {}", option, question.id),
            ),
            AnswerPayload::Voice {
                file_url: None,
                transcript: None,
            } => Err(format!(
                "voice answer for question {} has neither a recording nor a transcript",
                question.id
            )),
            _ => Ok(()),
        }
    }

    /// Build the stored answer for `question_id`.
    pub fn into_answer(self, question_id: impl Into<String>) -> Answer {
        let question_id = question_id.into();
        match self {
            AnswerPayload::Text { text } => Answer {
                question_id,
                answer_text: Some(text),
                selected_option: None,
                voice_file_url: None,
            },
            AnswerPayload::Choice { option } => Answer {
                question_id,
                answer_text: None,
                selected_option: Some(option),
                voice_file_url: None,
            },
            AnswerPayload::Voice {
                file_url,
                transcript,
            } => Answer {
                question_id,
                answer_text: transcript,
                selected_option: None,
                voice_file_url: file_url,
            },
        }
    }
}

/// The live answer to one question. At most one per question id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_file_url: Option<String>,
}

impl Answer {
    /// The field that counts for a question of type `question_type`.
    ///
    /// Voice answers fall back to the transcript when there is no recording.
    pub fn active_value(&self, question_type: QuestionType) -> Option<&str> {
        match question_type {
            QuestionType::Mcq => self.selected_option.as_deref(),
            QuestionType::Essay => self.answer_text.as_deref(),
            QuestionType::Voice => self
                .voice_file_url
                .as_deref()
                .or(self.answer_text.as_deref()),
        }
    }
}

/// Per-question evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub question_text: String,
    pub user_answer: String,
    pub score: f64,
    pub feedback: String,
}

/// Evaluation payload as fetched, possibly still pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub session_id: String,
    pub overall_score: Option<f64>,
    pub level: Level,
    pub stack: Stack,
    pub submitted_at: Option<DateTime<Utc>>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
    pub question_results: Vec<QuestionResult>,
}

impl EvaluationReport {
    pub fn is_pending(&self) -> bool {
        self.evaluated_at.is_none()
    }

    /// The finished result, or `None` while grading is still running.
    pub fn into_result(self) -> Option<InterviewResult> {
        let evaluated_at = self.evaluated_at?;
        Some(InterviewResult {
            session_id: self.session_id,
            overall_score: self.overall_score.unwrap_or_default(),
            level: self.level,
            stack: self.stack,
            submitted_at: self.submitted_at,
            evaluated_at,
            feedback: self.feedback,
            question_results: self.question_results,
        })
    }
}

/// A completed evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewResult {
    pub session_id: String,
    pub overall_score: f64,
    pub level: Level,
    pub stack: Stack,
    pub submitted_at: Option<DateTime<Utc>>,
    pub evaluated_at: DateTime<Utc>,
    pub feedback: Option<String>,
    pub question_results: Vec<QuestionResult>,
}

/// Past session as shown in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOverview {
    pub id: String,
    pub template_name: Option<String>,
    pub level: Level,
    pub stack: Stack,
    pub status: SessionStatus,
    pub score: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Interview template offered for template-driven start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOverview {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub level: String,
    pub stack: String,
    pub duration_minutes: u32,
}

/// How a new session picks its questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum StartRequest {
    Template { template_id: String },
    Track { level: Level, stack: Stack },
}
