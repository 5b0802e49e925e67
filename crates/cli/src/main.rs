//! Ballonwerk CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (schema and session table)
//! bw-cli migrate
//!
//! # Load products from a YAML file
//! bw-cli seed products catalog.yaml
//!
//! # Grant or revoke admin rights
//! bw-cli user grant-admin -e owner@example.com
//! bw-cli user revoke-admin -e owner@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bw-cli")]
#[command(author, version, about = "Ballonwerk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a YAML file
    Products {
        /// Path to the YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Give a user access to the admin dashboard
    GrantAdmin {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Remove a user's admin access
    RevokeAdmin {
        /// Account email address
        #[arg(short, long)]
        email: String,
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
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
        Commands::User { action } => match action {
            UserAction::GrantAdmin { email } => {
                commands::user::set_admin(&email, true).await?;
            }
            UserAction::RevokeAdmin { email } => {
                commands::user::set_admin(&email, false).await?;
            }
        },
    }
    Ok(())
}
