//! Stride CLI - database migrations and local seed data.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations
//! stride migrate
//!
//! # Load users, products and addresses for a local environment
//! stride seed fixtures/dev.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stride")]
#[command(author, version, about = "Stride storefront operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply storefront database migrations
    Migrate,
    /// Upsert users, products and addresses from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => {
            let summary = commands::seed::from_file(&file).await?;
            tracing::info!(
                users = summary.users,
                products = summary.products,
                addresses = summary.addresses,
                "Seeding complete"
            );
        }
    }
    Ok(())
}
