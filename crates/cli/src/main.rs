//! EcoHome CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! ecohome migrate
//!
//! # Create a demo household with 30 days of readings
//! ecohome seed --name "Demo Household" --postcode 6000 --days 30
//!
//! # Print a household's green score and tips
//! ecohome score 1
//! ```
//!
//! Connection settings come from the same environment variables as the
//! server (`DATABASE_URL` or `DB_HOST`, `DB_PORT`, ...), including `.env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ecohome")]
#[command(author, version, about = "EcoHome CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for the database and apply migrations
    Migrate,
    /// Create a demo household with generated readings
    Seed {
        /// Household name
        #[arg(short, long, default_value = "Demo Household")]
        name: String,

        /// Household postcode
        #[arg(short, long, default_value = "6000")]
        postcode: String,

        /// Number of occupants
        #[arg(short, long, default_value_t = 2)]
        members: i64,

        /// Days of history to generate, ending today
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
    /// Print a household's green score, breakdown and tips
    Score {
        /// Household ID
        household_id: i32,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before tracing so RUST_LOG set there applies
    dotenvy::dotenv().ok();
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
        Commands::Seed {
            name,
            postcode,
            members,
            days,
        } => {
            commands::seed::household(&name, &postcode, members, days).await?;
        }
        Commands::Score { household_id } => commands::score::show(household_id).await?,
    }
    Ok(())
}
