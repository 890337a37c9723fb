//! OrderDesk CLI - Database migrations and sample data.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! od-cli migrate
//!
//! # Show applied and pending migrations
//! od-cli migrate --status
//!
//! # Insert sample users, products, roles, addresses and orders
//! od-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERDESK_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "od-cli")]
#[command(author, version, about = "OrderDesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// List migrations and whether they are applied, without running any
        #[arg(long)]
        status: bool,
    },
    /// Seed the database with sample data (safe to run repeatedly)
    Seed,
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
    let pool = commands::connect().await?;

    match cli.command {
        Commands::Migrate { status: true } => commands::migrate::status(&pool).await?,
        Commands::Migrate { status: false } => commands::migrate::run(&pool).await?,
        Commands::Seed => commands::seed::run(&pool).await?,
    }
    Ok(())
}
