//! CLI output handling - event receiver loop and result rendering.
//!
//! Session events are rendered as they arrive, either as terminal status
//! lines or as JSON lines (`--json`). `--quiet` suppresses everything but
//! final results.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::session::{InterviewResult, Question, SessionEvent, SessionOverview, TemplateOverview};

/// Run the event loop until the channel closes.
pub async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<SessionEvent>,
    json_mode: bool,
    quiet_mode: bool,
) -> Result<()> {
    while let Some(event) = event_rx.recv().await {
        if json_mode {
            println!("{}", serde_json::to_string(&event)?);
            io::stdout().flush()?;
        } else if !quiet_mode {
            render_event(&event);
        }
    }

    Ok(())
}

/// Status line for one event, or `None` if it is not worth showing.
fn describe_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Started {
            session_id,
            level,
            stack,
        } => Some(format!(
            "[session] started {} ({} {})",
            session_id,
            level.label(),
            stack.label()
        )),
        SessionEvent::QuestionsLoaded {
            total, required, ..
        } => Some(format!(
            "[session] {} questions, {} required",
            total, required
        )),
        SessionEvent::AnswerSaved {
            question_id,
            progress,
            can_submit,
            ..
        } => Some(format!(
            "[saved] {} ({:.0}% answered{})",
            question_id,
            progress * 100.0,
            if *can_submit { ", ready to submit" } else { "" }
        )),
        SessionEvent::AnswerSuperseded { question_id } => {
            Some(format!("[saved] {} (newer answer kept)", question_id))
        }
        SessionEvent::CursorMoved { .. } => None,
        SessionEvent::Submitted { session_id, .. } => {
            Some(format!("[session] {} submitted", session_id))
        }
        SessionEvent::Evaluated {
            session_id,
            overall_score,
        } => Some(format!(
            "[session] {} evaluated: {:.1}",
            session_id, overall_score
        )),
        SessionEvent::Failed { operation, message } => {
            Some(format!("[error] {}: {}", operation, message))
        }
    }
}

fn render_event(event: &SessionEvent) {
    if let Some(line) = describe_event(event) {
        eprintln!("{}", line);
    }
}

/// Print a serializable value as one JSON line.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    io::stdout().flush()?;
    Ok(())
}

pub fn print_question(question: &Question, index: usize, total: usize, current: Option<&str>) {
    let marker = if question.is_required { "*" } else { "" };
    println!(
        "\n[{}/{}]{} ({:?}) {}",
        index + 1,
        total,
        marker,
        question.question_type,
        question.text
    );
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }
    if let Some(current) = current {
        println!("  current answer: {}", truncate(current, 80));
    }
}

pub fn print_templates(templates: &[TemplateOverview]) {
    if templates.is_empty() {
        println!("No active templates");
        return;
    }
    for t in templates {
        println!(
            "{:<8} {:<32} {:<10} {:<10} {} min",
            t.id,
            truncate(&t.name, 32),
            t.level,
            t.stack,
            t.duration_minutes
        );
    }
}

pub fn print_history(sessions: &[SessionOverview]) {
    if sessions.is_empty() {
        println!("No sessions yet");
        return;
    }
    for s in sessions {
        let score = s
            .score
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<24} {:<8} {:<10} {:<12} {:>5}  {}",
            s.id,
            truncate(s.template_name.as_deref().unwrap_or("-"), 24),
            s.level.label(),
            s.stack.label(),
            format!("{:?}", s.status),
            score,
            s.started_at.format("%Y-%m-%d %H:%M")
        );
    }
}

pub fn print_result(result: &InterviewResult) {
    println!(
        "Session {} ({} {}): {:.1}",
        result.session_id,
        result.level.label(),
        result.stack.label(),
        result.overall_score
    );
    if let Some(feedback) = &result.feedback {
        println!("\n{}", feedback);
    }
    for (i, q) in result.question_results.iter().enumerate() {
        println!("\n{}. {} [{:.1}]", i + 1, q.question_text, q.score);
        println!("   answer: {}", truncate(&q.user_answer, 100));
        if !q.feedback.is_empty() {
            println!("   {}", q.feedback);
        }
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
