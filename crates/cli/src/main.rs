//! Gyoka CLI
//!
//! A command-line tool for editing Gyoka feeds: listing, adding,
//! deleting and trimming posts.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::feed;
use gyoka_client::{CancellationToken, Client};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_BASE_URL: &str = "http://localhost:8787";

/// Gyoka feed editor CLI
#[derive(Parser)]
#[command(name = "gyoka")]
#[command(author, version, about = "CLI for the Gyoka feed management API", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via GYOKA_BASE_URL env var)
    #[arg(long, env = "GYOKA_BASE_URL")]
    pub base_url: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the server is reachable
    Ping,

    /// List posts in a feed
    List {
        /// Feed URI (at://did:plc:.../app.bsky.feed.generator/...)
        feed: String,

        /// Maximum number of posts to return (server default if omitted)
        #[arg(long, short)]
        limit: Option<i64>,
    },

    /// Trim a feed down to the newest N posts
    Trim {
        /// Feed URI
        feed: String,

        /// Number of posts to keep
        #[arg(long, short)]
        count: i64,
    },

    /// Add posts to a feed
    Add {
        /// Feed URI
        feed: String,

        /// Post to add, as <uri>=<cid> (repeatable)
        #[arg(long = "post", short, required = true, value_parser = feed::parse_post_arg)]
        posts: Vec<(String, String)>,

        /// Indexed-at timestamp for the posts (RFC 3339, defaults to now)
        #[arg(long)]
        indexed_at: Option<String>,
    },

    /// Delete posts from a feed
    Delete {
        /// Feed URI
        feed: String,

        /// Post to delete, as <uri>=<cid> (repeatable)
        #[arg(long = "post", short, required = true, value_parser = feed::parse_post_arg)]
        posts: Vec<(String, String)>,
    },
}

fn init_tracing(verbose: bool, log_json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (plain, json) = if log_json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;

    let base_url = cli
        .base_url
        .clone()
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let client = Client::with_options(&base_url, config.client_options())
        .with_context(|| format!("Failed to create client for {}", base_url))?;
    debug!(base_url = %base_url, auth = %client.auth_type(), "Client configured");

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received, cancelling request");
                cancel.cancel();
            }
        }
    });

    let result = match cli.command {
        Commands::Ping => feed::ping(&client, &cancel, cli.format).await,
        Commands::List { feed, limit } => {
            feed::list_posts(&client, &feed, limit, &cancel, cli.format).await
        }
        Commands::Trim { feed, count } => {
            feed::trim(&client, &feed, count, &cancel, cli.format).await
        }
        Commands::Add {
            feed,
            posts,
            indexed_at,
        } => feed::add_posts(&client, &feed, posts, indexed_at, &cancel, cli.format).await,
        Commands::Delete { feed, posts } => {
            feed::delete_posts(&client, &feed, posts, &cancel, cli.format).await
        }
    };

    ctrl_c.abort();
    client.close().await;
    result
}
