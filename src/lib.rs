//! Interview session runtime.
//!
//! Owns the client-side state of one interview attempt and sequences it
//! with the interview platform API:
//!
//! - [`session::SessionStore`] holds the attempt and derives progress and
//!   submit eligibility
//! - [`session::SessionOrchestrator`] is the only mutation entry point and
//!   writes to the store after the platform confirms
//! - [`remote::InterviewBackend`] is the seam to the platform, implemented
//!   for [`interview_api::Client`]

pub mod error;
pub mod remote;
pub mod session;
pub mod settings;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{InterviewError, Result};
pub use remote::InterviewBackend;
pub use session::{
    AnswerOutcome, AnswerPayload, Autosaver, SessionEvent, SessionOrchestrator, SessionStore,
};
