//! FF Traders CLI - drive the storefront cart and checkout from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add a product, as if its "Add to cart" button was clicked
//! ff-cli cart add --id tee-01 --name "Graphic Tee" --price 12.50
//!
//! # Change a quantity, remove a row, show or clear the cart
//! ff-cli cart qty tee-01 3
//! ff-cli cart remove tee-01
//! ff-cli cart show
//! ff-cli cart clear
//!
//! # Place an order
//! ff-cli checkout --name "Ayesha Khan" --phone 0300-1234567 \
//!     --address "12 Mall Road" --city Lahore --payment cod --agree
//!
//! # Send a contact message
//! ff-cli contact --name Bilal --email bilal@example.com --message "Hello"
//! ```
//!
//! The cart is kept in the file named by `FFTRADERS_STORE_PATH`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use fftraders_storefront::config::StorefrontConfig;
use fftraders_storefront::error::AppError;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ff-cli")]
#[command(author, version, about = "FF Traders storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the stored cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Check out the current cart
    Checkout(commands::checkout::CheckoutArgs),
    /// Send a contact message
    Contact(commands::contact::ContactArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add(commands::cart::AddArgs),
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: String,
    },
    /// Set a product's quantity
    Qty {
        /// Product ID
        id: String,
        /// New quantity, parsed leniently
        value: String,
    },
    /// Show the cart contents and totals
    Show,
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Route tracing events to Sentry: errors and warnings as events, the rest
/// as breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            AppError::from(e).report();
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fftraders_storefront=info,fftraders_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add(args) => commands::cart::add(config, args).await,
            CartAction::Remove { id } => commands::cart::remove(config, &id)?,
            CartAction::Qty { id, value } => commands::cart::set_quantity(config, &id, value)?,
            CartAction::Show => commands::cart::show(config),
            CartAction::Clear => commands::cart::clear(config),
        },
        Commands::Checkout(args) => commands::checkout::run(config, args)?,
        Commands::Contact(args) => commands::contact::run(config, args)?,
    }
    Ok(())
}
