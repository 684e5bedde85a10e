//! Souk CLI - command-line client for the Souk platform.
//!
//! # Usage
//!
//! ```bash
//! # Authenticate
//! souk auth login -e amina@example.com -p <password>
//!
//! # Browse the catalog
//! souk products list --search lantern
//!
//! # Build a cart and check out
//! souk cart add 42 -q 2
//! souk checkout submit --name "Amina El Fassi" --street "3 Rue des Consuls" \
//!     --city Rabat --postal 10020 --country Morocco --phone +212600000000
//!
//! # After paying in the hosted widget
//! souk checkout confirm
//! ```
//!
//! # Environment Variables
//!
//! - `SOUK_API_BASE_URL` - Base URL of the platform gateway (required)
//! - `SOUK_DATA_DIR` - Where tokens and checkout state are stored

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use souk_client::{Souk, SoukConfig};

mod commands;

use commands::{
    AdminCommand, AuthCommand, CartCommand, CheckoutCommand, OrdersCommand, ProductsCommand,
};

#[derive(Parser)]
#[command(name = "souk")]
#[command(author, version, about = "Souk command-line shop client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login, registration and profile
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsCommand,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Drive a checkout
    Checkout {
        #[command(subcommand)]
        action: CheckoutCommand,
    },
    /// List and cancel orders
    Orders {
        #[command(subcommand)]
        action: OrdersCommand,
    },
    /// Back-office operations (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        report_failure(&e);
        std::process::exit(1);
    }
}

#[allow(clippy::print_stderr)]
fn report_failure(error: &commands::CliError) {
    eprintln!("error: {error}");
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let config = SoukConfig::from_env()?;
    let souk = Souk::new(config)?;

    match cli.command {
        Commands::Auth { action } => commands::auth::run(&souk, action).await,
        Commands::Products { action } => commands::shop::run_products(&souk, action).await,
        Commands::Cart { action } => commands::shop::run_cart(&souk, action).await,
        Commands::Checkout { action } => commands::shop::run_checkout(&souk, action).await,
        Commands::Orders { action } => commands::shop::run_orders(&souk, action).await,
        Commands::Admin { action } => commands::admin::run(&souk, action).await,
    }
}
