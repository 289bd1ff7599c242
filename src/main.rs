//! bookmeter-scraper - Scrape profiles, bookshelves and follow lists from Bookmeter

use anyhow::Result;
use bookmeter_scraper::bookmeter::{ListingKind, YearMonth};
use bookmeter_scraper::commands::{BooksCommand, ProfileCommand, UsersCommand};
use bookmeter_scraper::config::{Config, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bookmeter-scraper",
    version,
    about = "Scrape profiles, bookshelves and follow lists from Bookmeter",
    long_about = "Scrape profiles, bookshelves and follow lists from Bookmeter. \
                  Listings require a login; pass credentials by flag, environment or config file."
)]
struct Cli {
    /// Login mail address
    #[arg(long, global = true, env = "BOOKMETER_MAIL")]
    mail: Option<String>,

    /// Login password
    #[arg(long, global = true, env = "BOOKMETER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "BOOKMETER_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true, env = "BOOKMETER_DELAY")]
    delay: Option<u64>,

    /// Maximum number of listing pages to fetch
    #[arg(long, global = true)]
    max_pages: Option<u32>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a user's profile
    #[command(alias = "p")]
    Profile {
        /// Numeric user id
        user_id: String,
    },

    /// List every book on one of a user's shelves
    #[command(alias = "b")]
    Books {
        /// Numeric user id
        user_id: String,

        /// Shelf to list: read, reading, tsundoku, wish
        #[arg(short, long, default_value = "read")]
        kind: ListingKind,
    },

    /// List books read (or re-read) in one month
    #[command(alias = "m")]
    Month {
        /// Numeric user id
        user_id: String,

        /// Month as YYYY-MM
        month: YearMonth,
    },

    /// List a user's followers
    Followers {
        /// Numeric user id
        user_id: String,
    },

    /// List the users a user follows
    Followings {
        /// Numeric user id
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(mail) = cli.mail {
        config.mail = Some(mail);
    }
    if let Some(password) = cli.password {
        config.password = Some(password);
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = Some(max_pages);
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    let output = match cli.command {
        Commands::Profile { user_id } => ProfileCommand::new(config).execute(&user_id).await?,
        Commands::Books { user_id, kind } => BooksCommand::new(config).execute(&user_id, kind).await?,
        Commands::Month { user_id, month } => {
            BooksCommand::new(config).execute_month(&user_id, month).await?
        }
        Commands::Followers { user_id } => {
            UsersCommand::new(config).execute(&user_id, ListingKind::Followers).await?
        }
        Commands::Followings { user_id } => {
            UsersCommand::new(config).execute(&user_id, ListingKind::Followings).await?
        }
    };

    println!("{}", output);

    Ok(())
}
