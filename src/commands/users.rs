//! Follower and following commands.

use crate::bookmeter::{BookmeterSession, Collector, ListingKind};
use crate::config::Config;
use crate::error::ScraperError;
use crate::format::Formatter;
use anyhow::Result;
use tracing::info;

/// Lists a user's followers or followings.
pub struct UsersCommand {
    config: Config,
}

impl UsersCommand {
    /// Creates a new users command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches the listing and returns formatted output.
    pub async fn execute(&self, user_id: &str, kind: ListingKind) -> Result<String> {
        let client = super::connect(&self.config).await?;
        self.execute_with_client(&client, user_id, kind).await
    }

    /// Fetches the listing with a provided session (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl BookmeterSession,
        user_id: &str,
        kind: ListingKind,
    ) -> Result<String> {
        let collector = Collector::new(client).with_max_pages(self.config.max_pages);

        let users = match kind {
            ListingKind::Followers => collector.followers(user_id).await?,
            ListingKind::Followings => collector.followings(user_id).await?,
            other => anyhow::bail!(ScraperError::InvalidListing {
                kind: other.to_string(),
                expected: "users",
            }),
        };

        info!("Found {} {}", users.len(), kind);
        Ok(Formatter::new(self.config.format).format_users(&users))
    }
}
