//! Sequential page-by-page retrieval of a user's listing.
//!
//! A [`PageStream`] fetches one page per call to [`PageStream::next_page`], in
//! order, and ends when the listing runs out. Whether the next page is needed
//! is decided by the caller, so pages are never fetched ahead.

use crate::bookmeter::client::BookmeterSession;
use crate::bookmeter::listings::{validate_user_id, ListingKind};
use crate::bookmeter::models::{BookSlot, ListingPage, Slot, UserSlot};
use crate::bookmeter::parser::{Parser, UserLayout};
use anyhow::Result;
use tracing::{debug, warn};

type ParseFn<'a, T> = Box<dyn Fn(&str) -> ListingPage<T> + Send + Sync + 'a>;

/// Lazily fetched pages of one listing. Not restartable.
pub struct PageStream<'a, S: ?Sized, T> {
    session: &'a S,
    user_id: String,
    kind: ListingKind,
    parse: ParseFn<'a, T>,
    next_index: u32,
    max_pages: Option<u32>,
    done: bool,
}

impl<'a, S, T> PageStream<'a, S, T>
where
    S: BookmeterSession + ?Sized,
    T: Slot,
{
    /// Creates a stream over `kind` of `user_id`, parsing each page with `parse`.
    ///
    /// Fails with `InvalidSubject` for a malformed user id. An unauthenticated
    /// session yields an empty stream.
    pub fn new(
        session: &'a S,
        user_id: &str,
        kind: ListingKind,
        parse: impl Fn(&str) -> ListingPage<T> + Send + Sync + 'a,
    ) -> Result<Self> {
        validate_user_id(user_id)?;

        let done = !session.is_authenticated();
        if done {
            warn!("Not logged in; {} of user {} will be empty", kind, user_id);
        }

        Ok(Self {
            session,
            user_id: user_id.to_string(),
            kind,
            parse: Box::new(parse),
            next_index: 1,
            max_pages: None,
            done,
        })
    }

    /// Stops the stream after `max_pages` fetches.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> u32 {
        self.next_index - 1
    }

    /// Fetches the next page, or returns `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<ListingPage<T>>> {
        if self.done {
            return Ok(None);
        }

        if self.max_pages.is_some_and(|max| self.next_index > max) {
            debug!("Reached page limit for {} of user {}", self.kind, self.user_id);
            self.done = true;
            return Ok(None);
        }

        let index = self.next_index;
        let html = self.session.fetch_listing_page(&self.user_id, self.kind, index).await?;
        self.next_index += 1;

        let mut page = (self.parse)(&html);
        page.index = index;

        if index == 1 {
            if !page.has_entries {
                debug!("{} of user {} has no entries", self.kind, self.user_id);
                self.done = true;
                return Ok(None);
            }
            if !page.has_page_index {
                debug!("{} of user {} fits on a single page", self.kind, self.user_id);
                self.done = true;
                return Ok(Some(page));
            }
        }

        if page.record_count() == 0 {
            debug!("Page {} is empty, stopping", index);
            self.done = true;
            return Ok(None);
        }

        debug!("Page {} has {} records", index, page.record_count());
        Ok(Some(page))
    }

    /// Fetches every remaining page.
    pub async fn collect_all(mut self) -> Result<Vec<ListingPage<T>>> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(page);
        }
        Ok(pages)
    }
}

impl<'a, S> PageStream<'a, S, BookSlot>
where
    S: BookmeterSession + ?Sized,
{
    /// Stream over a book listing.
    pub fn books(session: &'a S, user_id: &str, kind: ListingKind) -> Result<Self> {
        let parser = Parser::new();
        let capacity = kind.page_capacity();
        Self::new(session, user_id, kind, move |html| parser.parse_book_listing(html, capacity))
    }
}

impl<'a, S> PageStream<'a, S, UserSlot>
where
    S: BookmeterSession + ?Sized,
{
    /// Stream over a follower or following listing in the given layout.
    pub fn users(
        session: &'a S,
        user_id: &str,
        kind: ListingKind,
        layout: UserLayout,
    ) -> Result<Self> {
        let parser = Parser::new();
        let capacity = kind.page_capacity();
        Self::new(session, user_id, kind, move |html| {
            parser.parse_user_listing(html, layout, capacity)
        })
    }
}
