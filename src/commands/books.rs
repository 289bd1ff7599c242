//! Bookshelf commands: whole listings and monthly reading.

use crate::bookmeter::{BookmeterSession, Collector, ListingKind, YearMonth};
use crate::config::Config;
use crate::format::Formatter;
use anyhow::Result;
use tracing::info;

/// Lists books from a user's shelves.
pub struct BooksCommand {
    config: Config,
}

impl BooksCommand {
    /// Creates a new books command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Lists every book on one shelf and returns formatted output.
    pub async fn execute(&self, user_id: &str, kind: ListingKind) -> Result<String> {
        let client = super::connect(&self.config).await?;
        self.execute_with_client(&client, user_id, kind).await
    }

    /// Lists every book on one shelf with a provided session (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl BookmeterSession,
        user_id: &str,
        kind: ListingKind,
    ) -> Result<String> {
        let books = Collector::new(client)
            .with_max_pages(self.config.max_pages)
            .books(user_id, kind)
            .await?;

        info!("Found {} {} books", books.len(), kind);
        Ok(Formatter::new(self.config.format).format_books(books.as_slice()))
    }

    /// Lists books read in `month` and returns formatted output.
    pub async fn execute_month(&self, user_id: &str, month: YearMonth) -> Result<String> {
        let client = super::connect(&self.config).await?;
        self.execute_month_with_client(&client, user_id, month).await
    }

    /// Lists books read in `month` with a provided session (for testing).
    pub async fn execute_month_with_client(
        &self,
        client: &impl BookmeterSession,
        user_id: &str,
        month: YearMonth,
    ) -> Result<String> {
        let books = Collector::new(client)
            .with_max_pages(self.config.max_pages)
            .read_books_in_month(user_id, month)
            .await?;

        info!("Found {} books read in {}", books.len(), month);
        Ok(Formatter::new(self.config.format).format_books(books.as_slice()))
    }
}
