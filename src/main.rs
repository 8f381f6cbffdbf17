//! Lumina CLI - capture snippets and generate post drafts from a terminal
//!
//! # Usage
//!
//! ```bash
//! # Capture and generate in one go (relay must be running, see lumina-relay)
//! lumina capture "Hello world" --url https://example.com/post --title Example --generate
//!
//! # List, inspect, edit
//! lumina list
//! lumina show 3f2a
//! lumina edit 3f2a tldr "Shorter and punchier."
//!
//! # Talk to the provider directly instead of the relay
//! lumina settings set ai.mode direct
//! lumina settings set ai.apiKey '$OPENAI_API_KEY'
//!
//! # JSON output for scripting
//! lumina list --json | jq '.[0].drafts'
//! ```

use anyhow::Result;
use clap::Parser;

use lumina::cli::{initialize, run, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut ctx = initialize(&args).await?;

    run(&mut ctx).await
}
