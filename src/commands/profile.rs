//! Profile lookup command implementation.

use crate::bookmeter::{BookmeterSession, Collector};
use crate::config::Config;
use crate::format::Formatter;
use anyhow::Result;
use tracing::info;

/// Shows a user's profile.
pub struct ProfileCommand {
    config: Config,
}

impl ProfileCommand {
    /// Creates a new profile command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches a profile and returns formatted output.
    pub async fn execute(&self, user_id: &str) -> Result<String> {
        let client = super::connect(&self.config).await?;
        self.execute_with_client(&client, user_id).await
    }

    /// Fetches a profile with a provided session (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl BookmeterSession,
        user_id: &str,
    ) -> Result<String> {
        info!("Looking up profile: {}", user_id);

        let profile = Collector::new(client).profile(user_id).await?;

        Ok(Formatter::new(self.config.format).format_profile(&profile))
    }
}
