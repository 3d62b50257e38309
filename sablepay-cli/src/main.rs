//! SablePay terminal
//!
//! A command-line point-of-sale front end for accepting crypto payments
//! through SablePay.

mod commands;
mod config;
mod shutdown;

use clap::{Parser, Subcommand};
use config::{ConfigLoader, Overrides};
use rust_decimal::Decimal;
use sablepay_sdk::client::PaymentClient;
use sablepay_sdk::objects::PaymentItem;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Config file looked up when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "./sablepay.toml";

/// SablePay terminal - take crypto payments from the command line
#[derive(Parser, Debug)]
#[command(name = "sablepay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file [default: ./sablepay.toml if present]
    #[arg(short, long, env = "SABLEPAY_CONFIG")]
    config: Option<PathBuf>,

    /// Secret API key (sable_sk_sand_… or sable_sk_live_…)
    #[arg(long, env = "SABLEPAY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Merchant UUID
    #[arg(long, env = "SABLEPAY_MERCHANT_ID")]
    merchant_id: Option<String>,

    /// Override the API root (e.g. https://sandbox-api.sablepay.io/api/v1/)
    #[arg(long, env = "SABLEPAY_BASE_URL")]
    base_url: Option<Url>,

    /// Log every API request and response
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a payment, show its link, and wait for it to settle
    Pay {
        /// Amount in USD; required unless items are given
        #[arg(short, long)]
        amount: Option<Decimal>,

        /// Line item as NAME:QUANTITY:PRICE (repeatable)
        #[arg(short, long = "item", value_parser = parse_item)]
        items: Vec<PaymentItem>,

        /// Metadata entry as KEY=VALUE (repeatable)
        #[arg(short, long = "meta", value_parser = parse_meta)]
        meta: Vec<(String, String)>,
    },

    /// Show the current status of a payment
    Status {
        payment_id: String,
    },

    /// Poll an existing payment until it settles
    Watch {
        payment_id: String,

        /// Milliseconds between status checks [default: from config]
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Maximum number of status checks [default: from config]
        #[arg(long)]
        max_attempts: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.verbose);

    // Load configuration
    let (config_path, required) = match args.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let loader = ConfigLoader::new(
        &config_path,
        required,
        Overrides {
            api_key: args.api_key,
            merchant_id: args.merchant_id,
            base_url: args.base_url,
            enable_logging: args.verbose,
        },
    );
    let client_config = loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!(
        environment = ?client_config.environment(),
        base_url = %client_config.base_url,
        "Configuration loaded"
    );

    let client = PaymentClient::new(client_config)?;

    match args.command {
        Command::Pay {
            amount,
            items,
            meta,
        } => commands::pay(client, amount, items, meta).await,
        Command::Status { payment_id } => commands::status(client, payment_id).await,
        Command::Watch {
            payment_id,
            interval_ms,
            max_attempts,
        } => {
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or(client.config().poll_interval);
            let max_attempts = max_attempts.unwrap_or(client.config().max_poll_attempts);
            commands::watch(client, payment_id, interval, max_attempts).await
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so they never interleave with command output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,sablepay_sdk=debug,sablepay_core=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parse `NAME:QUANTITY:PRICE`. The name may itself contain `:`.
fn parse_item(raw: &str) -> Result<PaymentItem, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected NAME:QUANTITY:PRICE, got {raw:?}"));
    };
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity {quantity:?}: {e}"))?;
    let price = price
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid price {price:?}: {e}"))?;
    Ok(PaymentItem::new(name.trim(), quantity, price))
}

/// Parse `KEY=VALUE`.
fn parse_meta(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}
