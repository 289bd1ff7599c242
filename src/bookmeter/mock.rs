//! In-memory Bookmeter session for tests.

use crate::bookmeter::client::BookmeterSession;
use crate::bookmeter::listings::ListingKind;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Book listing page linking to `links`, in the site's row layout.
pub(crate) fn book_listing_html(links: &[&str], paged: bool) -> String {
    let mut html = String::from(r#"<html><body><div id="main_left"><div><div>header</div>"#);
    for link in links {
        html.push_str(&format!(
            r#"<div><div><img src="thumb.jpg"></div><div><a href="{}">{}</a></div></div>"#,
            link,
            link.trim_start_matches("/b/")
        ));
    }
    html.push_str(r#"<center><a href="?p=2">next</a></center>"#);
    if paged {
        html.push_str(r#"<span class="now_page"><a>1</a></span>"#);
    }
    html.push_str("</div></div></body></html>");
    html
}

fn date_selects(date: NaiveDate, ids: Option<[&str; 3]>) -> String {
    use chrono::Datelike;
    let fields = [format!("{}年", date.year()), format!("{}月", date.month()), format!("{}日", date.day())];
    fields
        .iter()
        .enumerate()
        .map(|(i, text)| match ids {
            Some(ids) => format!(r#"<select id="{}"><option>{}</option></select>"#, ids[i], text),
            None => format!("<select><option>{}</option></select>", text),
        })
        .collect()
}

/// Book page with a primary read date and any number of re-reads.
pub(crate) fn book_page_html(name: &str, read: Option<NaiveDate>, rereads: &[NaiveDate]) -> String {
    let mut html = format!(
        r#"<html><body><h1 id="title">{}</h1><span id="author_name">Author of {}</span>
        <img id="book_image" src="https://img.example/{}.jpg">"#,
        name, name, name
    );
    if let Some(date) = read {
        html.push_str(r#"<div id="book_edit_area"><form><div></div><div>"#);
        html.push_str(&date_selects(date, Some(["read_date_y", "read_date_m", "read_date_d"])));
        html.push_str("</div></form></div>");
    }
    if !rereads.is_empty() {
        html.push_str(r#"<div class="reread_box">"#);
        for date in rereads {
            html.push_str("<form><div></div><div>");
            html.push_str(&date_selects(*date, None));
            html.push_str("</div></form>");
        }
        html.push_str("</div>");
    }
    html.push_str("</body></html>");
    html
}

/// A book on a synthetic shelf.
#[derive(Debug, Clone)]
pub(crate) struct MockBook {
    pub name: String,
    pub read: Option<NaiveDate>,
    pub rereads: Vec<NaiveDate>,
}

impl MockBook {
    pub fn path(&self) -> String {
        format!("/b/{}", self.name)
    }

    pub fn reread(mut self, date: &str) -> Self {
        self.rereads.push(parse_date(date));
        self
    }
}

/// A book read on `date` (`YYYY-MM-DD`).
pub(crate) fn book(name: &str, date: &str) -> MockBook {
    MockBook { name: name.to_string(), read: Some(parse_date(date)), rereads: Vec::new() }
}

pub(crate) fn parse_date(date: &str) -> NaiveDate {
    date.parse().unwrap()
}

/// Scripted session serving canned pages and counting fetches.
pub(crate) struct MockSession {
    listings: HashMap<ListingKind, Vec<String>>,
    book_pages: HashMap<String, String>,
    profile: Option<String>,
    user_id: Option<String>,
    fail_listings: bool,
    listing_calls: AtomicU32,
    book_calls: AtomicU32,
}

impl MockSession {
    /// A session logged in as user 1 with nothing on any listing.
    pub fn new() -> Self {
        Self {
            listings: HashMap::new(),
            book_pages: HashMap::new(),
            profile: None,
            user_id: Some("1".to_string()),
            fail_listings: false,
            listing_calls: AtomicU32::new(0),
            book_calls: AtomicU32::new(0),
        }
    }

    pub fn with_listing(mut self, kind: ListingKind, pages: Vec<String>) -> Self {
        self.listings.insert(kind, pages);
        self
    }

    pub fn with_book_page(mut self, path: &str, html: String) -> Self {
        self.book_pages.insert(path.to_string(), html);
        self
    }

    /// Read-books listing with the given pages, plus a page for every book.
    pub fn with_shelf(mut self, pages: Vec<Vec<MockBook>>) -> Self {
        let mut listing = Vec::new();
        for page in &pages {
            let paths: Vec<String> = page.iter().map(MockBook::path).collect();
            let links: Vec<&str> = paths.iter().map(String::as_str).collect();
            listing.push(book_listing_html(&links, true));
            for b in page {
                self.book_pages.insert(b.path(), book_page_html(&b.name, b.read, &b.rereads));
            }
        }
        self.listings.insert(ListingKind::ReadBooks, listing);
        self
    }

    pub fn with_profile(mut self, html: &str) -> Self {
        self.profile = Some(html.to_string());
        self
    }

    pub fn logged_out(mut self) -> Self {
        self.user_id = None;
        self
    }

    pub fn logged_in_as(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn failing_listings(mut self) -> Self {
        self.fail_listings = true;
        self
    }

    pub fn listing_calls(&self) -> u32 {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn book_calls(&self) -> u32 {
        self.book_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookmeterSession for MockSession {
    fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    fn log_in_user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    async fn fetch_listing_page(
        &self,
        _user_id: &str,
        kind: ListingKind,
        page: u32,
    ) -> Result<String> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listings {
            anyhow::bail!("connection reset");
        }
        Ok(self
            .listings
            .get(&kind)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned()
            .unwrap_or_else(|| "<html></html>".to_string()))
    }

    async fn fetch_book_page(&self, path: &str) -> Result<String> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        match self.book_pages.get(path) {
            Some(html) => Ok(html.clone()),
            None => anyhow::bail!("Request failed with status: 404 Not Found"),
        }
    }

    async fn fetch_profile_page(&self, _user_id: &str) -> Result<String> {
        match &self.profile {
            Some(html) => Ok(html.clone()),
            None => anyhow::bail!("Request failed with status: 404 Not Found"),
        }
    }
}
