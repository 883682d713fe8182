//! CLI administration tool for quota-shortener.
//!
//! Inspects and resets client quotas and looks up short links directly in
//! the shared Redis store, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show a client's quota window
//! cargo run --bin admin -- quota show 203.0.113.7
//!
//! # Give a client a fresh window
//! cargo run --bin admin -- quota reset 203.0.113.7
//!
//! # Look up a short link
//! cargo run --bin admin -- link show aZ3_k
//!
//! # Check the store connection
//! cargo run --bin admin -- store check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; `DOMAIN` and a Redis connection are required.

use quota_shortener::application::services::{LinkService, RateLimiter};
use quota_shortener::config::{self, Config, mask_connection_string};
use quota_shortener::domain::repositories::MappingRepository;
use quota_shortener::infrastructure::store::RedisStore;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing quota-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect or reset client quotas
    Quota {
        #[command(subcommand)]
        action: QuotaAction,
    },

    /// Inspect short links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Store operations
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum QuotaAction {
    /// Show remaining calls and reset time for a client
    Show {
        /// Client identity (IP address)
        client: String,
    },

    /// Drop a client's counter so its next call opens a fresh window
    Reset {
        /// Client identity (IP address)
        client: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Show the target and remaining lifetime of a short code
    Show {
        /// Short code, without the domain
        code: String,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Check store connection
    Check,
}

struct Services {
    rate_limiter: RateLimiter,
    links: LinkService,
    store: Arc<RedisStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let services = connect(&config).await?;

    match cli.command {
        Commands::Quota { action } => handle_quota_action(action, &services).await?,
        Commands::Link { action } => handle_link_action(action, &services).await?,
        Commands::Store { action } => handle_store_action(action, &config, &services).await?,
    }

    Ok(())
}

/// Connects to Redis and wires the services the commands use.
async fn connect(config: &Config) -> Result<Services> {
    let redis_url = config
        .redis_url
        .as_deref()
        .context("REDIS_URL (or REDIS_HOST) must be set for admin commands")?;

    let store = Arc::new(
        RedisStore::connect(redis_url, config.store_timeout())
            .await
            .with_context(|| {
                format!("Failed to connect to {}", mask_connection_string(redis_url))
            })?,
    );

    let rate_limiter = RateLimiter::new(store.clone(), config.quota_policy());
    let links = LinkService::new(
        store.clone(),
        Arc::new(RateLimiter::new(store.clone(), config.quota_policy())),
        config.link_settings(),
    );

    Ok(Services {
        rate_limiter,
        links,
        store,
    })
}

async fn handle_quota_action(action: QuotaAction, services: &Services) -> Result<()> {
    match action {
        QuotaAction::Show { client } => show_quota(services, &client).await,
        QuotaAction::Reset { client, yes } => reset_quota(services, &client, yes).await,
    }
}

/// Prints the quota window of `client`.
///
/// # Output Format
///
/// ```text
/// 📊 Quota for 203.0.113.7
///
///   Remaining: 7 / 10
///   Resets in: 24 min (at 2024-01-15 10:30:00)
/// ```
async fn show_quota(services: &Services, client: &str) -> Result<()> {
    println!(
        "{} {}",
        "📊 Quota for".bright_blue().bold(),
        client.cyan().bold()
    );
    println!();

    let policy = services.rate_limiter.policy();
    let status = services
        .rate_limiter
        .status(client)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read quota: {}", e))?;

    let remaining = if status.is_exhausted() {
        status.remaining.max(0).to_string().red().bold()
    } else {
        status.remaining.to_string().bright_green().bold()
    };

    println!("  Remaining: {} / {}", remaining, policy.quota);

    if status.reset_in.is_zero() {
        println!("  Resets in: {}", "no active window".bright_black());
    } else {
        println!(
            "  Resets in: {} min (at {})",
            status.reset_in_minutes().to_string().bright_white(),
            format_deadline(status.reset_in).bright_black()
        );
    }
    println!();

    Ok(())
}

/// Resets the quota of `client` after confirmation (default: No).
async fn reset_quota(services: &Services, client: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔄 Reset Quota".bright_blue().bold());
    println!();
    println!("  Client: {}", client.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Reset this client's quota?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = services
        .rate_limiter
        .reset(client)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reset quota: {}", e))?;

    if removed {
        println!("{}", "✅ Quota reset successfully!".green().bold());
    } else {
        println!("{}", "⚠️  Client had no active window".yellow());
    }
    println!();

    Ok(())
}

async fn handle_link_action(action: LinkAction, services: &Services) -> Result<()> {
    match action {
        LinkAction::Show { code } => {
            println!("{}", "🔗 Short Link".bright_blue().bold());
            println!();

            let target = match services.links.resolve(&code).await {
                Ok(target) => target,
                Err(e) => {
                    println!("{} {}", "❌".red(), e.to_string().red());
                    return Ok(());
                }
            };

            let lifetime = services
                .links
                .remaining_lifetime(&code)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read link lifetime: {}", e))?;

            println!("  Short URL: {}", services.links.short_url(&code).cyan());
            println!("  Target:    {}", target.bright_white());
            match lifetime {
                Some(ttl) => println!(
                    "  Expires:   {} ({}s left)",
                    format_deadline(ttl).bright_black(),
                    ttl.as_secs()
                ),
                None => println!("  Expires:   {}", "never".yellow()),
            }
            println!();
        }
    }

    Ok(())
}

async fn handle_store_action(
    action: StoreAction,
    config: &Config,
    services: &Services,
) -> Result<()> {
    match action {
        StoreAction::Check => {
            println!("{}", "🔍 Checking store connection...".bright_blue());

            if let Some(url) = &config.redis_url {
                println!("  Redis: {}", mask_connection_string(url).bright_black());
            }

            if services.store.health_check().await {
                println!("{}", "✅ Store connection OK".green().bold());
            } else {
                anyhow::bail!("Store did not answer PING");
            }
        }
    }

    Ok(())
}

/// Wall-clock time `remaining` from now, in local time.
fn format_deadline(remaining: Duration) -> String {
    let offset = ChronoDuration::from_std(remaining).unwrap_or(ChronoDuration::MAX);
    Local::now()
        .checked_add_signed(offset)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "far future".to_string())
}
