//! Per-run cache of parsed book pages.

use crate::bookmeter::client::BookmeterSession;
use crate::bookmeter::models::BookDetail;
use crate::bookmeter::parser::Parser;
use anyhow::{Context, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::trace;

/// Parsed book pages keyed by book path, fetched at most once each.
///
/// A cache lives for one scraping run and is never shared between subjects.
#[derive(Debug, Default)]
pub struct DetailCache {
    pages: HashMap<String, BookDetail>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed page at `path`, fetching it on first use.
    pub async fn get_or_fetch<S>(
        &mut self,
        session: &S,
        parser: &Parser,
        path: &str,
    ) -> Result<&BookDetail>
    where
        S: BookmeterSession + ?Sized,
    {
        match self.pages.entry(path.to_string()) {
            Entry::Occupied(entry) => {
                trace!("Book page cache hit: {}", path);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let html = session.fetch_book_page(path).await?;
                let detail = parser
                    .parse_book_page(&html)
                    .with_context(|| format!("Failed to parse book page {}", path))?;
                Ok(entry.insert(detail))
            }
        }
    }

    /// Number of distinct pages fetched so far.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
