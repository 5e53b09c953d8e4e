//! CLI module for taking interviews from a terminal.
//!
//! The CLI is a thin front-end over `SessionOrchestrator`: it wires the
//! platform client and settings together, renders the orchestrator's event
//! stream, and drives the session from an interactive prompt.
//!
//! ```text
//! +-----------------+     +----------------------+     +---------------+
//! | repl.rs         | --> | SessionOrchestrator  | --> | output.rs     |
//! | (user input)    |     | (subscribe())        |     | (print/JSON)  |
//! +-----------------+     +----------------------+     +---------------+
//! ```

mod args;
mod bootstrap;
mod output;
mod repl;
mod runner;

pub use args::{Args, Command, TakeMode};
pub use bootstrap::{initialize, CliContext};
pub use output::run_event_loop;
pub use repl::run_repl;
pub use runner::{execute, wait_for_result};
