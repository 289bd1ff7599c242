//! CLI command implementations.

pub mod books;
pub mod profile;
pub mod users;

pub use books::BooksCommand;
pub use profile::ProfileCommand;
pub use users::UsersCommand;

use crate::bookmeter::BookmeterClient;
use crate::config::Config;
use anyhow::{Context, Result};
use tracing::warn;

/// Creates a client and logs in when credentials are configured.
pub async fn connect(config: &Config) -> Result<BookmeterClient> {
    let mut client = BookmeterClient::new(config).await.context("Failed to create HTTP client")?;

    match config.credentials() {
        Some((mail, password)) => {
            client.log_in(mail, password).await?;
        }
        None => warn!("No credentials configured; listings will be empty"),
    }

    Ok(client)
}
