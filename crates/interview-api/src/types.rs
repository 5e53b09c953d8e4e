//! Request and response types for the interview platform API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Default page size used when looking a session up in the listing
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Response envelope wrapping every payload returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Seniority level a session is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    #[serde(alias = "junior")]
    Junior,
    #[serde(alias = "middle")]
    Middle,
    #[serde(alias = "senior")]
    Senior,
    #[serde(alias = "lead")]
    Lead,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Junior, Level::Middle, Level::Senior, Level::Lead];

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Level::Junior => "Junior",
            Level::Middle => "Middle",
            Level::Senior => "Senior",
            Level::Lead => "Lead",
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown level '{}'", s))
    }
}

/// Technology stack a session is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stack {
    #[serde(alias = "frontend")]
    Frontend,
    #[serde(alias = "backend")]
    Backend,
    #[serde(alias = "fullstack")]
    Fullstack,
    #[serde(alias = "devops")]
    Devops,
    #[serde(alias = "mobile")]
    Mobile,
}

impl Stack {
    pub const ALL: [Stack; 5] = [
        Stack::Frontend,
        Stack::Backend,
        Stack::Fullstack,
        Stack::Devops,
        Stack::Mobile,
    ];

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Stack::Frontend => "Frontend",
            Stack::Backend => "Backend",
            Stack::Fullstack => "Fullstack",
            Stack::Devops => "DevOps",
            Stack::Mobile => "Mobile",
        }
    }
}

impl std::str::FromStr for Stack {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stack::ALL
            .into_iter()
            .find(|stack| stack.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown stack '{}'", s))
    }
}

/// Lifecycle status as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    #[serde(alias = "in_progress")]
    InProgress,
    #[serde(alias = "submitted")]
    Submitted,
    #[serde(alias = "evaluated")]
    Evaluated,
}

/// Question modality.
///
/// The backend uses its own vocabulary (`choice`, `theoretical`, ...); any
/// value that is not recognised as multiple-choice or essay is a voice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    Mcq,
    Essay,
    Voice,
}

impl From<String> for QuestionKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "choice" | "mcq" => QuestionKind::Mcq,
            "theoretical" | "essay" => QuestionKind::Essay,
            _ => QuestionKind::Voice,
        }
    }
}

/// Body for creating a session.
///
/// Both selectors hit the same endpoint and produce the same response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CreateSessionRequest {
    /// Snapshot the questions of an interview template
    Template { template_id: String },
    /// Let the platform pick questions for a level/stack pair
    Track { level: Level, stack: Stack },
}

/// Response payload of session creation
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    #[serde(deserialize_with = "deserialize_id")]
    pub session_id: String,
    pub level: Level,
    pub stack: Stack,
    pub started_at: DateTime<Utc>,
}

/// One question as delivered by the platform
#[derive(Debug, Clone, Deserialize)]
pub struct WireQuestion {
    #[serde(alias = "id", deserialize_with = "deserialize_id")]
    pub question_id: String,
    #[serde(alias = "question_text")]
    pub content: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub order: u32,
    #[serde(default = "default_required", alias = "mandatory")]
    pub is_required: bool,
}

fn default_required() -> bool {
    true
}

/// Question set of a session
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSet {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub session_id: String,
    pub questions: Vec<WireQuestion>,
}

/// One entry of the session listing
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub template_name: Option<String>,
    pub level: Level,
    pub stack: Stack,
    pub status: InterviewStatus,
    #[serde(default)]
    pub score: Option<f64>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub total: u32,
    pub page: u32,
    pub last_page: u32,
}

/// A page of listed items
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// Body for persisting one answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistAnswerRequest {
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_file_url: Option<String>,
}

/// Acknowledgement of a persisted answer
#[derive(Debug, Clone, Deserialize)]
pub struct SavedAnswer {
    #[serde(deserialize_with = "deserialize_id")]
    pub question_id: String,
    pub saved_at: DateTime<Utc>,
}

/// Acknowledgement of a finalized session
#[derive(Debug, Clone, Deserialize)]
pub struct FinalizedSession {
    #[serde(deserialize_with = "deserialize_id")]
    pub session_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Evaluation payload. `evaluated_at == None` means grading is still running.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationResult {
    #[serde(deserialize_with = "deserialize_id")]
    pub session_id: String,
    #[serde(default)]
    pub overall_score: Option<f64>,
    pub level: Level,
    pub stack: Stack,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub question_results: Vec<WireQuestionResult>,
}

/// Per-question evaluation
#[derive(Debug, Clone, Deserialize)]
pub struct WireQuestionResult {
    #[serde(deserialize_with = "deserialize_id")]
    pub question_id: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub user_answer: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated account
#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Login response payload
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserAccount,
}

/// Interview template as listed in the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stack: String,
    pub level: String,
    #[serde(default)]
    pub duration_minutes: u32,
    pub status: String,
}

/// Ids are strings on the client side but some endpoints emit integers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}
