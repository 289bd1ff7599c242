//! Month-windowed retrieval of read books.
//!
//! The read-books listing is sorted newest first, so every page covers an
//! older span of months than the one before it. For a target month each page
//! is compared against the months of its newest and oldest book, and the walk
//! stops as soon as no older page can hold a match.

use crate::bookmeter::cache::DetailCache;
use crate::bookmeter::client::BookmeterSession;
use crate::bookmeter::listings::absolute_uri;
use crate::bookmeter::models::{BookSlot, Books, ListingPage, YearMonth};
use crate::bookmeter::pagination::PageStream;
use crate::bookmeter::parser::Parser;
use anyhow::Result;
use tracing::{debug, trace, warn};

/// What to do with one page of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    /// Target is older than the whole page; look at the next one.
    Skip,
    /// Target lies strictly inside the page; nothing older can match.
    ExtractAndStop,
    /// Target is the page's oldest month; it may continue on the next page.
    ExtractAndContinue,
    /// Target is newer than the whole page; the window has been passed.
    Stop,
}

impl PageDecision {
    pub fn extracts(&self) -> bool {
        matches!(self, PageDecision::ExtractAndStop | PageDecision::ExtractAndContinue)
    }

    pub fn continues(&self) -> bool {
        matches!(self, PageDecision::Skip | PageDecision::ExtractAndContinue)
    }
}

/// Decides a page spanning `oldest..=newest` for `target`.
pub fn decide(target: YearMonth, newest: YearMonth, oldest: YearMonth) -> PageDecision {
    if target < oldest {
        PageDecision::Skip
    } else if target > newest {
        PageDecision::Stop
    } else if target > oldest {
        PageDecision::ExtractAndStop
    } else {
        PageDecision::ExtractAndContinue
    }
}

/// Walks `stream` and returns every book read or re-read in `target`.
pub async fn read_books_in_month<S>(
    stream: &mut PageStream<'_, S, BookSlot>,
    session: &S,
    parser: &Parser,
    cache: &mut DetailCache,
    target: YearMonth,
) -> Result<Books>
where
    S: BookmeterSession + ?Sized,
{
    let mut result = Books::new();

    while let Some(page) = stream.next_page().await? {
        let Some((newest, oldest)) = page_span(&page, session, parser, cache).await? else {
            warn!("Page {} has no dated books, skipping", page.index);
            continue;
        };

        let decision = decide(target, newest, oldest);
        debug!("Page {} spans {}..={}: {:?}", page.index, oldest, newest, decision);

        if decision.extracts() {
            let batch = books_read_in(&page, target, session, parser, cache).await?;
            debug!("Page {} has {} books read in {}", page.index, batch.len(), target);
            result.append(batch);
        }

        if !decision.continues() {
            break;
        }
    }

    debug!("Found {} books read in {}", result.len(), target);
    Ok(result)
}

/// Months of the newest and oldest dated book on the page.
///
/// The listing is ordered by each book's most recent read, so a book counts
/// at the month of its latest read or re-read.
async fn page_span<S>(
    page: &ListingPage<BookSlot>,
    session: &S,
    parser: &Parser,
    cache: &mut DetailCache,
) -> Result<Option<(YearMonth, YearMonth)>>
where
    S: BookmeterSession + ?Sized,
{
    let newest = first_dated(page.present(), session, parser, cache).await?;
    let oldest = first_dated(page.present().rev(), session, parser, cache).await?;
    Ok(newest.zip(oldest))
}

/// Month of the latest read of the first slot in `slots` that has one.
async fn first_dated<'p, S>(
    slots: impl Iterator<Item = &'p BookSlot>,
    session: &S,
    parser: &Parser,
    cache: &mut DetailCache,
) -> Result<Option<YearMonth>>
where
    S: BookmeterSession + ?Sized,
{
    for slot in slots {
        if let Some(date) = cache.get_or_fetch(session, parser, &slot.link).await?.latest_read() {
            return Ok(Some(YearMonth::from(date)));
        }
    }
    Ok(None)
}

/// Books on the page read or re-read in `target`, with all their read dates.
async fn books_read_in<S>(
    page: &ListingPage<BookSlot>,
    target: YearMonth,
    session: &S,
    parser: &Parser,
    cache: &mut DetailCache,
) -> Result<Books>
where
    S: BookmeterSession + ?Sized,
{
    let mut books = Books::new();
    for slot in page.present() {
        let detail = cache.get_or_fetch(session, parser, &slot.link).await?;
        if detail.read_months().contains(&target) {
            trace!("{} was read in {}", detail.name, target);
            books.push(detail.to_book(absolute_uri(&slot.link)));
        }
    }
    Ok(books)
}
