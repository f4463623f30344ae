//! DraftDeck CLI: AI-drafted business documents and slide decks.
//!
//! Runs the HTTP API and offers offline access to the same workflows.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
