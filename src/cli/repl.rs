//! Interactive interview loop for `interview-cli take`.
//!
//! Each line is either a slash command or an answer to the current question:
//! - `/next`, `/prev`, `/goto <n>` - Move between questions
//! - `/status` - Show progress and unanswered required questions
//! - `/submit` - Finalize the session
//! - `/quit`, `/exit`, `/q` - Leave without submitting
//!
//! Essay answers go through the debounced autosaver; everything else is
//! saved immediately.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;

use crate::session::{AnswerPayload, Autosaver, Question, QuestionType, SessionOrchestrator};

use super::output::print_question;

/// REPL command variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Leave the REPL
    Quit,
    Next,
    Previous,
    /// Jump to a zero-based question index
    GoTo(usize),
    Submit,
    Status,
    Help,
    /// Unknown command (will show help)
    Unknown(String),
    /// Answer to the current question
    Answer(String),
    /// Empty input (skip)
    Empty,
}

impl ReplCommand {
    /// Parse user input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }

        if !trimmed.starts_with('/') {
            return ReplCommand::Answer(trimmed.to_string());
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        match command.as_str() {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/next" | "/n" => ReplCommand::Next,
            "/prev" | "/p" => ReplCommand::Previous,
            "/submit" => ReplCommand::Submit,
            "/status" | "/s" => ReplCommand::Status,
            "/help" | "/h" => ReplCommand::Help,
            "/goto" | "/g" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n >= 1 => ReplCommand::GoTo(n - 1),
                _ => ReplCommand::Unknown(trimmed.to_string()),
            },
            _ => ReplCommand::Unknown(trimmed.to_string()),
        }
    }
}

/// Turn a typed line into an answer for `question`.
///
/// Multiple-choice input may be the option number or its text.
/// Voice input is a recording URL or a transcript.
pub fn payload_for(question: &Question, input: &str) -> Result<AnswerPayload, String> {
    match question.question_type {
        QuestionType::Mcq => {
            let by_number = input
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| question.options.get(i));
            let by_text = question
                .options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(input));

            by_number
                .or(by_text)
                .map(|o| AnswerPayload::choice(o.clone()))
                .ok_or_else(|| {
                    format!(
                        "Pick one of 1-{} or type the option text",
                        question.options.len()
                    )
                })
        }
        QuestionType::Essay => Ok(AnswerPayload::text(input)),
        QuestionType::Voice => {
            if input.starts_with("http://") || input.starts_with("https://") {
                Ok(AnswerPayload::Voice {
                    file_url: Some(input.to_string()),
                    transcript: None,
                })
            } else {
                Ok(AnswerPayload::transcript(input))
            }
        }
    }
}

fn show_current(orchestrator: &SessionOrchestrator) {
    let snapshot = orchestrator.snapshot();
    match snapshot.current_question() {
        Some(question) => {
            let current = snapshot
                .answer(&question.id)
                .and_then(|a| a.active_value(question.question_type));
            print_question(
                question,
                snapshot.current_index(),
                snapshot.total_questions(),
                current,
            );
        }
        None => eprintln!("This session has no questions"),
    }
}

fn show_status(orchestrator: &SessionOrchestrator) {
    let snapshot = orchestrator.snapshot();
    eprintln!(
        "{}/{} answered ({:.0}%)",
        snapshot.answered_count(),
        snapshot.total_questions(),
        snapshot.progress() * 100.0
    );
    let missing = snapshot.missing_required();
    if missing.is_empty() {
        eprintln!("All required questions answered, /submit when ready");
    } else {
        eprintln!("Required questions left: {}", missing.join(", "));
    }
}

async fn flush(autosaver: &Autosaver) {
    if let Err(e) = autosaver.flush().await {
        eprintln!("Error: {}", e);
    }
}

/// Run the interactive loop for the orchestrator's current session.
///
/// Returns when the user submits, quits, or on EOF (Ctrl+D).
pub async fn run_repl(orchestrator: Arc<SessionOrchestrator>, autosaver: &Autosaver) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    // Piped answers get no prompt characters mixed into the output
    let interactive = atty::is(atty::Stream::Stdin);

    if interactive {
        eprintln!("Type an answer, or /help for commands\n");
    }
    show_current(&orchestrator);

    loop {
        if interactive {
            print!("> ");
            stdout.flush()?;
        }

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            flush(autosaver).await;
            eprintln!("\nGoodbye!");
            break;
        }

        match ReplCommand::parse(&input) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => {
                flush(autosaver).await;
                eprintln!("Goodbye!");
                break;
            }
            ReplCommand::Help => {
                eprintln!("/next /prev /goto <n> /status /submit /quit");
            }
            ReplCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("Available: /next, /prev, /goto <n>, /status, /submit, /quit");
            }
            ReplCommand::Status => show_status(&orchestrator),
            ReplCommand::Next => {
                flush(autosaver).await;
                orchestrator.next();
                show_current(&orchestrator);
            }
            ReplCommand::Previous => {
                flush(autosaver).await;
                orchestrator.previous();
                show_current(&orchestrator);
            }
            ReplCommand::GoTo(index) => {
                flush(autosaver).await;
                orchestrator.go_to(index);
                show_current(&orchestrator);
            }
            ReplCommand::Submit => {
                flush(autosaver).await;
                match orchestrator.submit().await {
                    Ok(session) => {
                        println!(
                            "Submitted. Check the evaluation with: interview-cli result {} --wait",
                            session.id
                        );
                        break;
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            ReplCommand::Answer(text) => {
                let Some(question) = orchestrator.current_question() else {
                    eprintln!("No question to answer");
                    continue;
                };
                let payload = match payload_for(&question, &text) {
                    Ok(payload) => payload,
                    Err(hint) => {
                        eprintln!("{}", hint);
                        continue;
                    }
                };

                if question.question_type == QuestionType::Essay {
                    autosaver.schedule(&question.id, payload);
                } else if let Err(e) = orchestrator.answer(&question.id, payload).await {
                    eprintln!("Error: {}", e);
                }
            }
        }
    }

    Ok(())
}
