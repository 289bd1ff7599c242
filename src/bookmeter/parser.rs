//! HTML parser for Bookmeter listing, book and profile pages.

use crate::bookmeter::listings::absolute_uri;
use crate::bookmeter::models::{BookDetail, BookSlot, ListingPage, Profile, User, UserSlot};
use crate::bookmeter::selectors::{book, listing, profile, session, users};
use crate::error::ScraperError;
use anyhow::Result;
use chrono::NaiveDate;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static USER_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/u/(\d+)$").unwrap());

/// Which follow-page layout a user listing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLayout {
    /// The logged-in user's own follow pages
    Own,
    /// Anybody else's follow pages
    Other,
}

/// Parser for Bookmeter HTML pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Parses one page of a book listing into `capacity` slots.
    pub fn parse_book_listing(&self, html: &str, capacity: usize) -> ListingPage<BookSlot> {
        let document = Html::parse_document(html);

        let slots: Vec<BookSlot> = document
            .select(&listing::ROW)
            .skip(1)
            .take(capacity)
            .map(|row| match row.select(&listing::BOOK_LINK).next() {
                Some(a) => BookSlot {
                    name: text_of(a),
                    link: a.value().attr("href").unwrap_or_default().to_string(),
                },
                None => BookSlot::default(),
            })
            .collect();

        let mut page = ListingPage::new(slots, capacity);
        page.has_entries = document.select(&listing::ENTRIES_MARKER).next().is_some();
        page.has_page_index = document.select(&listing::NOW_PAGE).next().is_some();

        debug!(
            "Parsed {} books (has_entries: {}, has_page_index: {})",
            page.record_count(),
            page.has_entries,
            page.has_page_index
        );
        page
    }

    /// Parses one page of a follower/following listing into `capacity` slots.
    pub fn parse_user_listing(
        &self,
        html: &str,
        layout: UserLayout,
        capacity: usize,
    ) -> ListingPage<UserSlot> {
        let document = Html::parse_document(html);
        let link_selector: &Selector = match layout {
            UserLayout::Own => &users::OWN_LINK,
            UserLayout::Other => &users::OTHER_LINK,
        };

        let slots: Vec<UserSlot> = document
            .select(&users::ROW)
            .take(capacity)
            .map(|row| match row.select(link_selector).next() {
                Some(a) => UserSlot {
                    name: a.value().attr("title").unwrap_or_default().trim().to_string(),
                    link: a.value().attr("href").unwrap_or_default().to_string(),
                },
                None => UserSlot::default(),
            })
            .collect();

        let mut page = ListingPage::new(slots, capacity);
        page.has_entries = page.record_count() > 0;
        page.has_page_index = document.select(&listing::NOW_PAGE).next().is_some();

        debug!("Parsed {} users ({:?} layout)", page.record_count(), layout);
        page
    }

    /// Builds a user from a listing slot. Returns `None` if the link carries no user id.
    pub fn parse_user(&self, slot: &UserSlot) -> Option<User> {
        let id = match USER_LINK.captures(&slot.link) {
            Some(caps) => caps[1].to_string(),
            None => {
                warn!("Skipping user '{}' with unexpected link: {}", slot.name, slot.link);
                return None;
            }
        };

        trace!("Parsed user: {} ({})", slot.name, id);
        Some(User { name: slot.name.clone(), uri: absolute_uri(&format!("/u/{}", id)), id })
    }

    /// Parses a book's own page.
    pub fn parse_book_page(&self, html: &str) -> Result<BookDetail> {
        let document = Html::parse_document(html);

        let name = document
            .select(&book::TITLE)
            .next()
            .map(text_of)
            .ok_or(ScraperError::MissingField("title"))?;

        let author = document.select(&book::AUTHOR).next().map(text_of).unwrap_or_default();

        let image_uri = document
            .select(&book::IMAGE)
            .next()
            .and_then(|e| e.value().attr("src"))
            .unwrap_or_default()
            .to_string();

        let read_date = make_date(
            first_number(&document, &book::READ_YEAR),
            first_number(&document, &book::READ_MONTH),
            first_number(&document, &book::READ_DAY),
        );

        let reread_dates = document
            .select(&book::REREAD_FORM)
            .filter_map(|form| {
                let mut fields = form.select(&book::REREAD_SELECT).map(|select| {
                    select.select(&book::OPTION).next().and_then(|o| number_in(&text_of(o)))
                });
                let year = fields.next().flatten();
                let month = fields.next().flatten();
                let day = fields.next().flatten();
                make_date(year, month, day)
            })
            .collect();

        let detail = BookDetail { name, author, image_uri, read_date, reread_dates };
        trace!("Parsed book: {} ({:?})", detail.name, detail.read_dates());
        Ok(detail)
    }

    /// Parses a user's profile page.
    pub fn parse_profile(&self, html: &str) -> Result<Profile> {
        let document = Html::parse_document(html);

        let name = document
            .select(&profile::NAME)
            .next()
            .map(text_of)
            .ok_or(ScraperError::MissingField("name"))?;

        let block = document
            .select(&profile::BLOCK)
            .next()
            .ok_or(ScraperError::MissingField("profile"))?;

        let labels: HashMap<String, String> = block
            .select(&profile::ENTRY)
            .filter_map(|dl| {
                let label = dl.select(&profile::LABEL).next().map(text_of)?;
                let value = dl.select(&profile::VALUE).next().map(text_of).unwrap_or_default();
                Some((label, value))
            })
            .collect();

        debug!("Parsed profile of {} ({} attributes)", name, labels.len());
        Ok(Profile::from_labels(name, &labels))
    }

    /// Reads the logged-in user's id from any page carrying the site header.
    pub fn parse_login_user_id(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&session::LOGGED_IN_USER)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| USER_LINK.captures(href).map(|caps| caps[1].to_string()))
    }

    /// Reads the CSRF token from the login form, if it has one.
    pub fn parse_authenticity_token(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&session::AUTHENTICITY_TOKEN)
            .next()
            .and_then(|e| e.value().attr("value"))
            .map(String::from)
    }
}

fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts the first run of digits, e.g. "2023年" -> 2023.
fn number_in(text: &str) -> Option<u32> {
    DIGITS.find(text)?.as_str().parse().ok()
}

/// First `<option>` of a date select, as a number.
fn first_number(document: &Html, selector: &Selector) -> Option<u32> {
    document.select(selector).next().and_then(|o| number_in(&text_of(o)))
}

fn make_date(year: Option<u32>, month: Option<u32>, day: Option<u32>) -> Option<NaiveDate> {
    let year = i32::try_from(year?).ok()?;
    NaiveDate::from_ymd_opt(year, month?, day?)
}
