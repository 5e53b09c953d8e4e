//! Interview CLI - take practice interviews from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Build the CLI binary
//! cargo build --features cli --bin interview-cli
//!
//! # Store a token
//! ./target/debug/interview-cli login --email me@example.com
//!
//! # Take an interview
//! ./target/debug/interview-cli take --level junior --stack backend
//! ./target/debug/interview-cli take --template 12
//!
//! # Wait for grading and print the result as JSON
//! ./target/debug/interview-cli result 42 --wait --json | jq .
//! ```

use anyhow::Result;
use clap::Parser;

use interview_room::cli::{execute, initialize, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut ctx = initialize(&args).await?;

    let result = execute(&mut ctx).await;

    // Graceful shutdown
    ctx.shutdown().await?;

    result
}
