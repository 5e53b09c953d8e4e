//! Interview session runtime
//!
//! Drives one interview attempt from creation to evaluation.
//!
//! ## Layers
//!
//! ### Store (synchronous, infallible)
//! - Holds session metadata, questions, answers and the cursor
//! - Computes progress and submit eligibility on every read
//!
//! ### Orchestrator (async)
//! - Sequences platform calls with store mutations
//! - Writes only after the platform confirms
//! - Discards out-of-order answer responses per question
//!
//! ### Glue
//! - Event stream for front-ends
//! - Debounced autosave of free-text answers

pub mod autosave;
pub mod events;
pub mod orchestrator;
pub mod sequencer;
pub mod store;
pub mod types;

#[cfg(test)]
mod integration_tests;

pub use autosave::Autosaver;
pub use events::SessionEvent;
pub use orchestrator::{AnswerOutcome, Phase, SessionOrchestrator};
pub use store::SessionStore;
pub use types::*;
