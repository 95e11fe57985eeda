// Entrypoint for the CLI application.
// - Parses flags, sets up logging on stderr, builds the API client.
// - Runs a one-shot subcommand when given one, otherwise the interactive
//   form. The token is always prompted for, never read from flags.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use followback::api::{ApiClient, DEFAULT_API_BASE_URL};
use followback::browser::ChromeLauncher;
use followback::follows::{check_follows, check_follows_scraped, unfollow_users};
use followback::scrape::{ScrapeSettings, DEFAULT_WEB_BASE_URL};
use followback::ui::{main_menu, print_result, prompt_token, with_spinner, App};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Find who you follow on GitHub that doesn't follow you back.
#[derive(Parser)]
#[command(name = "followback")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// REST API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_BASE_URL)]
    api_url: String,

    /// Website base URL used by the browser variant
    #[arg(long, global = true, default_value = DEFAULT_WEB_BASE_URL)]
    web_url: String,

    /// Milliseconds to wait for each scraped page to render
    #[arg(long, global = true, default_value = "2000")]
    settle_ms: u64,

    /// Show the browser window while scraping
    #[arg(long, global = true)]
    headed: bool,

    /// Path to the Chrome/Chromium executable
    #[arg(long, global = true)]
    chrome: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List accounts you follow that don't follow you back
    Check {
        /// GitHub username
        account: String,

        /// Scrape profile pages in a browser instead of using the API (no token)
        #[arg(long)]
        scrape: bool,
    },

    /// Unfollow a comma-separated list of accounts
    Unfollow {
        /// e.g. "alice,bob"
        accounts: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("followback=debug,warn")
    } else {
        EnvFilter::new("followback=warn")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let app = App {
        api: ApiClient::new(&cli.api_url).context("Failed to build HTTP client")?,
        launcher: ChromeLauncher {
            headed: cli.headed,
            executable: cli.chrome,
        },
        scrape: ScrapeSettings {
            base_url: cli.web_url,
            settle_delay: Duration::from_millis(cli.settle_ms),
            ..ScrapeSettings::default()
        },
    };

    match cli.command {
        None => main_menu(&app)?,
        Some(Commands::Check { account, scrape: true }) => {
            let text = with_spinner("Scraping profile pages...", || {
                check_follows_scraped(&app.launcher, &app.scrape, &account)
            })?;
            print_result(&text);
        }
        Some(Commands::Check { account, scrape: false }) => {
            let token = prompt_token()?;
            let text = with_spinner("Checking followers...", || {
                check_follows(&app.api, &account, &token)
            })?;
            print_result(&text);
        }
        Some(Commands::Unfollow { accounts }) => {
            let token = prompt_token()?;
            let text = with_spinner("Unfollowing...", || {
                unfollow_users(&app.api, &token, &accounts)
            })?;
            print_result(&text);
        }
    }
    Ok(())
}
