//! CLI bootstrap - wire settings, logging, the API client and the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::session::{SessionEvent, SessionOrchestrator};
use crate::settings::{get_with_env_fallback, InterviewSettings, SettingsManager};

use super::args::Args;
use super::output::run_event_loop;

/// Context for CLI execution containing all initialized services.
pub struct CliContext {
    /// Session runtime driven by the commands
    pub orchestrator: Arc<SessionOrchestrator>,

    /// Event receiver for output handling (taken by the command that renders events)
    pub event_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,

    /// Raw API client, for calls outside a session (login)
    pub client: interview_api::Client,

    /// Settings manager
    pub settings_manager: Arc<SettingsManager>,

    /// Settings snapshot taken at startup
    pub settings: InterviewSettings,

    /// Background event renderer, once started
    output_handle: Option<JoinHandle<Result<()>>>,

    /// Command-line arguments
    pub args: Args,
}

impl CliContext {
    /// Debounce applied to essay answers.
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.settings.autosave.debounce_ms)
    }

    /// Start rendering session events in the background.
    pub fn start_output(&mut self) {
        if let Some(event_rx) = self.event_rx.take() {
            let json_mode = self.args.json;
            let quiet_mode = self.args.quiet;
            self.output_handle = Some(tokio::spawn(async move {
                run_event_loop(event_rx, json_mode, quiet_mode).await
            }));
        }
    }

    /// Graceful shutdown - let the output task drain buffered events.
    pub async fn shutdown(mut self) -> Result<()> {
        self.orchestrator.close_subscribers();

        if let Some(handle) = self.output_handle.take() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Output handler error: {}", e),
                Err(e) => tracing::warn!("Output handler panicked: {}", e),
            }
        }

        Ok(())
    }
}

/// Initialize the CLI context.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    let settings_manager = Arc::new(
        SettingsManager::new()
            .await
            .context("Failed to initialize settings manager")?,
    );
    let settings = settings_manager.get().await;

    // Initialize logging based on verbosity
    let log_level = if args.verbose {
        "debug"
    } else {
        settings.advanced.log_level.as_str()
    };
    init_logging(log_level)?;

    // Ensure settings file exists (creates template on first run)
    if let Err(e) = settings_manager.ensure_settings_file().await {
        tracing::warn!("Failed to create settings template: {}", e);
    }

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
    }

    let client = build_client(&settings, args)?;

    if args.verbose {
        eprintln!("[cli] API: {}", client.base_url());
        eprintln!("[cli] Authenticated: {}", client.has_token());
    }

    let orchestrator = Arc::new(SessionOrchestrator::new(Arc::new(client.clone())));
    let event_rx = Some(orchestrator.subscribe());

    Ok(CliContext {
        orchestrator,
        event_rx,
        client,
        settings_manager,
        settings,
        output_handle: None,
        args: args.clone(),
    })
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(
            format!("interview_room={}", level)
                .parse()
                .context("Invalid log level")?,
        )
        .add_directive(
            format!("interview_api={}", level)
                .parse()
                .context("Invalid log level")?,
        );
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// Build the API client. Flag > environment > settings for URL and token.
fn build_client(settings: &InterviewSettings, args: &Args) -> Result<interview_api::Client> {
    let base_url = get_with_env_fallback(
        &args.api_url,
        &["INTERVIEW_API_URL"],
        Some(settings.api.base_url.clone()),
    )
    .unwrap_or_else(|| settings.api.base_url.clone());

    let token = get_with_env_fallback(&args.token, &["INTERVIEW_TOKEN"], settings.api.token.clone());

    let client = interview_api::Client::with_timeout(
        &base_url,
        Duration::from_secs(settings.api.timeout_secs),
    )
    .with_context(|| format!("Invalid API URL '{}'", base_url))?;

    Ok(match token {
        Some(token) => client.with_token(token),
        None => client,
    })
}
