//! Fusion CLI - Drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered
//! fusion products --search mug
//!
//! # Add two large shirts to the cart
//! fusion cart add shirt-1 --qty 2 --variant size=L
//!
//! # Place the order
//! fusion checkout --name "Lin" --phone 0700000000
//! ```
//!
//! # Commands
//!
//! - `settings` - Show site settings
//! - `products` - List or search the catalog
//! - `cart` - Show and edit the cart
//! - `wishlist` - Show and edit the wishlist
//! - `checkout` - Submit the cart as an order
//!
//! Configuration comes from the environment, with a `.env` file in the working
//! directory loaded first if present; see `fusion_storefront::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fusion_storefront::api::HttpTransport;
use fusion_storefront::config::StorefrontConfig;
use fusion_storefront::error::AppError;
use fusion_storefront::state::{BootOptions, Storefront};
use fusion_storefront::storage::FileStore;

mod commands;

use commands::{CartAction, Shop, WishlistAction};

#[derive(Parser)]
#[command(name = "fusion")]
#[command(author, version, about = "Fusion storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show site settings
    Settings,
    /// List products
    Products {
        /// Only show products whose title contains this term
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Show and edit the wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Submit the cart as an order
    Checkout {
        /// Customer name
        #[arg(short, long)]
        name: String,

        /// Customer phone number
        #[arg(short, long)]
        phone: String,

        /// Customer email address
        #[arg(short, long, default_value = "")]
        email: String,

        /// Note for the seller
        #[arg(short, long, default_value = "")]
        message: String,
    },
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

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events for Sentry: errors and warnings become events, the rest breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fusion_storefront=info,fusion_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration failed: {e}");
            std::process::exit(1);
        }
    };

    let cli = Cli::parse();

    if let Err(e) = run(cli, &config).await {
        e.capture();
        tracing::error!("Command failed: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), AppError> {
    let store = Arc::new(FileStore::open(&config.storage_dir)?);
    let transport = HttpTransport::new(config.api_base_url.clone(), config.request_timeout)?;
    let mut shop: Shop = Storefront::boot(BootOptions::from(config), store, transport).await;

    match cli.command {
        Commands::Settings => commands::catalog::settings(&shop),
        Commands::Products { search } => commands::catalog::products(&shop, search.as_deref()).await,
        Commands::Cart { action } => commands::cart::run(&mut shop, action)?,
        Commands::Wishlist { action } => commands::wishlist::run(&mut shop, action)?,
        Commands::Checkout {
            name,
            phone,
            email,
            message,
        } => {
            let details = fusion_storefront::checkout::ContactDetails {
                name,
                phone,
                email,
                message,
            };
            commands::checkout::submit(&mut shop, &details).await?;
        }
    }
    Ok(())
}
