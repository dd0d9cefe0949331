//! Stockpile CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sp-cli migrate
//!
//! # Seed sample companies and products
//! sp-cli seed --companies 3 --products-per-company 10
//!
//! # Create a user
//! sp-cli user create -e ana@example.com -u ana -p 'long passphrase'
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sp-cli")]
#[command(author, version, about = "Stockpile CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed sample companies and products
    Seed {
        /// Number of companies to create
        #[arg(long, default_value_t = 3)]
        companies: u32,

        /// Number of products per company
        #[arg(long, default_value_t = 10)]
        products_per_company: u32,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Unique user name
        #[arg(short, long)]
        user_name: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Given name
        #[arg(long)]
        first_name: Option<String>,

        /// Family name
        #[arg(long)]
        last_name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            companies,
            products_per_company,
        } => {
            commands::seed::run(companies, products_per_company).await?;
        }
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                user_name,
                password,
                first_name,
                last_name,
            } => {
                commands::user::create(email, user_name, password, first_name, last_name).await?;
            }
        },
    }
    Ok(())
}
