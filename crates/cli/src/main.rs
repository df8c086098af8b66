//! Price Comparer CLI - Database migrations and cache seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema migrations and create the session table
//! pc-cli migrate
//!
//! # Load cached prices from a JSON file
//! pc-cli seed prices.json
//! ```
//!
//! Both commands read `DATABASE_URL` (a `.env` file is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pc-cli")]
#[command(author, version, about = "Price Comparer CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Append price cache rows from a JSON file
    Seed {
        /// Path to a `{"prices": [...]}` file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            let inserted = commands::seed::prices(&file).await?;
            tracing::info!(inserted, "Seeding complete");
        }
    }
    Ok(())
}
