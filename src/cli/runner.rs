//! CLI execution runner.
//!
//! Dispatches the parsed subcommand against the orchestrator.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::InterviewError;
use crate::session::{Autosaver, InterviewResult, SessionOrchestrator};
use crate::settings::get_with_env_fallback;

use super::args::{Command, TakeMode};
use super::bootstrap::CliContext;
use super::output::{print_history, print_json, print_result, print_templates};
use super::repl::run_repl;

/// Run the command selected on the command line.
pub async fn execute(ctx: &mut CliContext) -> Result<()> {
    match ctx.args.command.clone() {
        Command::Login { email, password } => login(ctx, &email, password).await,
        Command::Templates => {
            let templates = ctx.orchestrator.templates().await?;
            if ctx.args.json {
                print_json(&templates)
            } else {
                print_templates(&templates);
                Ok(())
            }
        }
        Command::History { per_page } => {
            let sessions = ctx.orchestrator.history(per_page).await?;
            if ctx.args.json {
                print_json(&sessions)
            } else {
                print_history(&sessions);
                Ok(())
            }
        }
        Command::Result { session_id, wait } => show_result(ctx, &session_id, wait).await,
        command @ Command::Take { .. } => {
            let mode = command
                .take_mode()
                .context("take without selectors")??;
            take(ctx, mode).await
        }
    }
}

async fn login(ctx: &CliContext, email: &str, password: Option<String>) -> Result<()> {
    let password = match get_with_env_fallback(&password, &["INTERVIEW_PASSWORD"], None) {
        Some(password) => password,
        None => {
            eprint!("Password: ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let auth = ctx
        .client
        .login(&interview_api::LoginRequest {
            email: email.to_string(),
            password,
        })
        .await
        .context("Login failed")?;

    ctx.settings_manager
        .store_token(&auth.token)
        .await
        .context("Failed to store token")?;

    if ctx.args.json {
        print_json(&serde_json::json!({
            "email": auth.user.email,
            "name": auth.user.name,
            "role": auth.user.role,
        }))
    } else {
        println!("Logged in as {} ({})", auth.user.name, auth.user.email);
        if !ctx.args.quiet {
            eprintln!(
                "Token saved to {}",
                ctx.settings_manager.path().display()
            );
        }
        Ok(())
    }
}

async fn take(ctx: &mut CliContext, mode: TakeMode) -> Result<()> {
    ctx.start_output();
    let orchestrator = ctx.orchestrator.clone();

    let session_id = match mode {
        TakeMode::Start(request) => orchestrator.start(request).await?.id,
        TakeMode::Resume(session_id) => session_id,
    };
    orchestrator.load_questions(&session_id).await?;

    let writable = orchestrator
        .session()
        .map(|s| s.status.is_writable())
        .unwrap_or(false);
    if !writable {
        eprintln!(
            "Session {} is already submitted. Use: interview-cli result {}",
            session_id, session_id
        );
        return Ok(());
    }

    let autosaver = Autosaver::new(orchestrator.clone(), ctx.autosave_debounce());
    run_repl(orchestrator, &autosaver).await
}

async fn show_result(ctx: &CliContext, session_id: &str, wait: bool) -> Result<()> {
    let result = if wait {
        if !ctx.args.quiet && !ctx.args.json {
            eprintln!("Waiting for evaluation of {}...", session_id);
        }
        wait_for_result(
            &ctx.orchestrator,
            session_id,
            Duration::from_secs(ctx.settings.results.poll_interval_secs),
            ctx.settings.results.max_polls,
        )
        .await
    } else {
        ctx.orchestrator.get_result(session_id).await
    };

    match result {
        Ok(result) if ctx.args.json => print_json(&result),
        Ok(result) => {
            print_result(&result);
            Ok(())
        }
        Err(InterviewError::NotYetEvaluated(_)) if !wait => {
            println!("Evaluation of {} is still running; retry with --wait", session_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Fetch the result, re-polling while grading is pending.
///
/// Gives up with `NotYetEvaluated` after `max_polls` fetches.
pub async fn wait_for_result(
    orchestrator: &SessionOrchestrator,
    session_id: &str,
    interval: Duration,
    max_polls: u32,
) -> Result<InterviewResult, InterviewError> {
    let mut polls = 1;
    loop {
        match orchestrator.get_result(session_id).await {
            Err(InterviewError::NotYetEvaluated(_)) if polls < max_polls => {
                tracing::debug!(
                    "[session] evaluation of {} pending (poll {}/{})",
                    session_id,
                    polls,
                    max_polls
                );
                polls += 1;
                tokio::time::sleep(interval).await;
            }
            other => return other,
        }
    }
}
