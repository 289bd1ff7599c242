//! bookmeter-scraper - Scrape profiles, bookshelves and follow lists from Bookmeter
//!
//! Listings are fetched page by page through a logged-in session. Monthly
//! queries over the read-books listing stop as soon as the month has been
//! passed, so recent months cost only a page or two.

pub mod bookmeter;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;

pub use bookmeter::models::{Book, Books, Profile, User, YearMonth};
pub use bookmeter::{Collector, ListingKind};
pub use config::Config;
pub use error::ScraperError;
