//! HTTP client for the interview practice platform API.
//!
//! This crate speaks the platform's JSON wire format: every response is
//! wrapped in a `{ success, data, message }` envelope, ids may arrive as
//! strings or numbers, and question types use the backend's own vocabulary.
//! It knows nothing about session state; callers translate the wire types
//! into their own domain model.
//!
//! # Example
//!
//! ```rust,no_run
//! use interview_api::{Client, CreateSessionRequest, Level, Stack};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:8003")?.with_token("secret");
//!
//!     let created = client
//!         .create_session(&CreateSessionRequest::Track {
//!             level: Level::Junior,
//!             stack: Stack::Backend,
//!         })
//!         .await?;
//!
//!     let questions = client.fetch_questions(&created.session_id).await?;
//!     println!("{} questions", questions.questions.len());
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::Client;
pub use error::InterviewApiError;
pub use types::*;

/// Endpoint paths, relative to the API base URL.
///
/// Paths containing `{id}` are expanded with [`endpoints::session_path`].
pub mod endpoints {
    /// Create a session (POST) or list the caller's sessions (GET)
    pub const INTERVIEWS: &str = "/api/interviews";
    /// Ordered question set of a session
    pub const QUESTIONS: &str = "/api/interview/{id}/questions";
    /// Persist one answer
    pub const ANSWER: &str = "/api/interview/{id}/answer";
    /// Finalize a session
    pub const SUBMIT: &str = "/api/interview/{id}/submit";
    /// Evaluation result
    pub const RESULT: &str = "/api/interview/{id}/result";
    /// Exchange credentials for a bearer token
    pub const LOGIN: &str = "/api/auth/login";
    /// Interview template catalog
    pub const TEMPLATES: &str = "/api/admin/templates";

    /// Expand a session-scoped endpoint template.
    pub fn session_path(template: &str, session_id: &str) -> String {
        template.replace("{id}", session_id)
    }
}
