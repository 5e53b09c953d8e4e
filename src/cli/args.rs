//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for interview-cli.

use clap::{Parser, Subcommand};

use crate::session::{Level, Stack, StartRequest};

/// Interview CLI - take practice interviews from the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "interview-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// API root URL (overrides INTERVIEW_API_URL and settings)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides INTERVIEW_TOKEN and settings)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output events and results as JSON lines (for scripting/parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Only output final results
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Log in and store the token in settings
    Login {
        #[arg(long)]
        email: String,

        /// Password (default: INTERVIEW_PASSWORD, else prompt)
        #[arg(long)]
        password: Option<String>,
    },

    /// List active interview templates
    Templates,

    /// List past sessions
    History {
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },

    /// Take an interview interactively
    Take {
        /// Start from an interview template
        #[arg(long, conflicts_with_all = ["level", "stack", "resume"])]
        template: Option<String>,

        /// Seniority level: junior, middle, senior, lead
        #[arg(long, requires = "stack", conflicts_with = "resume")]
        level: Option<Level>,

        /// Stack: frontend, backend, fullstack, devops, mobile
        #[arg(long, requires = "level", conflicts_with = "resume")]
        stack: Option<Stack>,

        /// Continue an existing session
        #[arg(long)]
        resume: Option<String>,
    },

    /// Show the evaluation of a session
    Result {
        session_id: String,

        /// Keep polling until grading finishes
        #[arg(long)]
        wait: bool,
    },
}

/// How `take` gets its session.
#[derive(Debug, Clone, PartialEq)]
pub enum TakeMode {
    Start(StartRequest),
    Resume(String),
}

impl Command {
    /// Resolve the `take` selectors. Returns `None` for other commands.
    pub fn take_mode(&self) -> Option<anyhow::Result<TakeMode>> {
        let Command::Take {
            template,
            level,
            stack,
            resume,
        } = self
        else {
            return None;
        };

        let mode = match (template, level, stack, resume) {
            (Some(template_id), _, _, _) => Ok(TakeMode::Start(StartRequest::Template {
                template_id: template_id.clone(),
            })),
            (_, Some(level), Some(stack), _) => Ok(TakeMode::Start(StartRequest::Track {
                level: *level,
                stack: *stack,
            })),
            (_, _, _, Some(session_id)) => Ok(TakeMode::Resume(session_id.clone())),
            _ => Err(anyhow::anyhow!(
                "Pass --template <id>, --level and --stack, or --resume <session>"
            )),
        };
        Some(mode)
    }
}
