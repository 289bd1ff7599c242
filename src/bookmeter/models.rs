//! Data models for Bookmeter books, users and profiles.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A book from one of a user's shelves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Book title
    pub name: String,
    /// Author as shown on the book page
    pub author: String,
    /// Primary read date followed by every re-read date
    pub read_dates: Vec<NaiveDate>,
    /// Absolute URI of the book page
    pub uri: String,
    /// Cover image URI
    pub image_uri: String,
}

impl Book {
    /// Returns true if this book has the same identity as `other`.
    pub fn same_book(&self, other: &Book) -> bool {
        self.name == other.name && self.author == other.author
    }

    /// Returns true if any read date falls in `month`.
    pub fn read_in(&self, month: YearMonth) -> bool {
        self.read_dates.iter().any(|d| YearMonth::from(*d) == month)
    }
}

/// A Bookmeter user, as listed among followers or followings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    /// Numeric user id
    pub id: String,
    /// Absolute URI of the user's page
    pub uri: String,
}

/// Canonical profile attributes and the labels Bookmeter shows for them.
pub(crate) const PROFILE_LABELS: &[(&str, &str)] = &[
    ("gender", "性別"),
    ("age", "年齢"),
    ("blood_type", "血液型"),
    ("job", "職業"),
    ("address", "現住所"),
    ("url", "URL / ブログ"),
    ("description", "自己紹介"),
    ("first_day", "記録初日"),
    ("elapsed_days", "経過日数"),
    ("read_books_count", "読んだ本"),
    ("read_pages_count", "読んだページ"),
    ("reviews_count", "感想/レビュー"),
    ("bookshelf_count", "本棚"),
];

/// A user's profile. Attributes the user did not fill in are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub blood_type: Option<String>,
    pub job: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub first_day: Option<String>,
    pub elapsed_days: Option<String>,
    pub read_books_count: Option<String>,
    pub read_pages_count: Option<String>,
    pub reviews_count: Option<String>,
    pub bookshelf_count: Option<String>,
}

impl Profile {
    /// Builds a profile from the page's label → value pairs.
    pub fn from_labels(name: impl Into<String>, labels: &HashMap<String, String>) -> Self {
        let get = |attribute: &str| {
            PROFILE_LABELS
                .iter()
                .find(|(a, _)| *a == attribute)
                .and_then(|(_, label)| labels.get(*label))
                .cloned()
        };

        Self {
            name: name.into(),
            gender: get("gender"),
            age: get("age"),
            blood_type: get("blood_type"),
            job: get("job"),
            address: get("address"),
            url: get("url"),
            description: get("description"),
            first_day: get("first_day"),
            elapsed_days: get("elapsed_days"),
            read_books_count: get("read_books_count"),
            read_pages_count: get("read_pages_count"),
            reviews_count: get("reviews_count"),
            bookshelf_count: get("bookshelf_count"),
        }
    }

    /// Returns the attributes in their canonical order, name first.
    pub fn attributes(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("name", Some(self.name.as_str())),
            ("gender", self.gender.as_deref()),
            ("age", self.age.as_deref()),
            ("blood_type", self.blood_type.as_deref()),
            ("job", self.job.as_deref()),
            ("address", self.address.as_deref()),
            ("url", self.url.as_deref()),
            ("description", self.description.as_deref()),
            ("first_day", self.first_day.as_deref()),
            ("elapsed_days", self.elapsed_days.as_deref()),
            ("read_books_count", self.read_books_count.as_deref()),
            ("read_pages_count", self.read_pages_count.as_deref()),
            ("reviews_count", self.reviews_count.as_deref()),
            ("bookshelf_count", self.bookshelf_count.as_deref()),
        ]
    }
}

/// A calendar month. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "YearMonthFields")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Deserialize)]
struct YearMonthFields {
    year: i32,
    month: u32,
}

impl TryFrom<YearMonthFields> for YearMonth {
    type Error = String;

    fn try_from(fields: YearMonthFields) -> Result<Self, Self::Error> {
        Self::new(fields.year, fields.month)
            .ok_or_else(|| format!("month {} is outside 1..=12", fields.month))
    }
}

impl YearMonth {
    /// Creates a year-month, returning `None` for months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }
}

impl FromStr for YearMonth {
    type Err = String;

    /// Accepts `YYYY-MM` or `YYYY/MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("Invalid month: '{}'. Use YYYY-MM, e.g. 2023-04", s);
        let (year, month) = s.trim().split_once(|c: char| c == '-' || c == '/').ok_or_else(err)?;
        let year = year.parse().map_err(|_| err())?;
        let month = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Order-preserving set of books keyed by (name, author).
///
/// The first occurrence of a book wins; later duplicates are dropped.
#[derive(Debug, Clone, Default)]
pub struct Books {
    books: Vec<Book>,
    seen: HashSet<(String, String)>,
}

impl Books {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every book in `batch` whose identity is not already present.
    pub fn append(&mut self, batch: impl IntoIterator<Item = Book>) {
        for book in batch {
            self.push(book);
        }
    }

    /// Appends a single book. Returns false if it was a duplicate.
    pub fn push(&mut self, book: Book) -> bool {
        let key = (book.name.clone(), book.author.clone());
        if !self.seen.insert(key) {
            return false;
        }
        self.books.push(book);
        true
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Book> {
        self.books.iter()
    }

    pub fn as_slice(&self) -> &[Book] {
        &self.books
    }

    /// Returns the books in insertion order.
    pub fn into_vec(self) -> Vec<Book> {
        self.books
    }
}

impl IntoIterator for Books {
    type Item = Book;
    type IntoIter = std::vec::IntoIter<Book>;

    fn into_iter(self) -> Self::IntoIter {
        self.books.into_iter()
    }
}

impl<'a> IntoIterator for &'a Books {
    type Item = &'a Book;
    type IntoIter = std::slice::Iter<'a, Book>;

    fn into_iter(self) -> Self::IntoIter {
        self.books.iter()
    }
}

/// One fixed position on a listing page.
pub trait Slot: Default {
    /// Returns true if the position holds a record.
    fn is_present(&self) -> bool;
}

/// A book entry on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSlot {
    pub name: String,
    /// Site-relative path of the book page
    pub link: String,
}

impl Slot for BookSlot {
    fn is_present(&self) -> bool {
        !self.link.is_empty()
    }
}

/// A user entry on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSlot {
    pub name: String,
    /// Site-relative path of the user page
    pub link: String,
}

impl Slot for UserSlot {
    fn is_present(&self) -> bool {
        !self.name.is_empty()
    }
}

/// One fetched page of a listing, padded to the listing's capacity.
#[derive(Debug, Clone)]
pub struct ListingPage<T> {
    /// 1-based page index
    pub index: u32,
    pub slots: Vec<T>,
    /// False when the listing reports no entries at all
    pub has_entries: bool,
    /// False when the page has no page-index marker (single-page listing)
    pub has_page_index: bool,
}

impl<T: Slot> ListingPage<T> {
    /// Creates a page with `slots` padded with empty slots up to `capacity`.
    pub fn new(mut slots: Vec<T>, capacity: usize) -> Self {
        slots.truncate(capacity);
        slots.resize_with(capacity, T::default);
        Self { index: 1, slots, has_entries: true, has_page_index: false }
    }

    /// Iterates the slots holding a record, in page order.
    pub fn present(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.slots.iter().filter(|s| s.is_present())
    }

    /// Number of slots holding a record.
    pub fn record_count(&self) -> usize {
        self.present().count()
    }

    /// Slots up to (not including) the first empty one.
    pub fn leading(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().take_while(|s| s.is_present())
    }
}

/// What a book's own page says about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDetail {
    pub name: String,
    pub author: String,
    pub image_uri: String,
    /// Primary read date, if one was recorded
    pub read_date: Option<NaiveDate>,
    pub reread_dates: Vec<NaiveDate>,
}

impl BookDetail {
    /// Primary read date (if any) followed by every re-read date.
    pub fn read_dates(&self) -> Vec<NaiveDate> {
        self.read_date.iter().chain(self.reread_dates.iter()).copied().collect()
    }

    /// Months in which the book was read or re-read.
    pub fn read_months(&self) -> Vec<YearMonth> {
        self.read_dates().into_iter().map(YearMonth::from).collect()
    }

    /// Most recent of the read and re-read dates.
    pub fn latest_read(&self) -> Option<NaiveDate> {
        self.read_dates().into_iter().max()
    }

    /// Builds the book record for the page at `uri`.
    pub fn to_book(&self, uri: impl Into<String>) -> Book {
        Book {
            name: self.name.clone(),
            author: self.author.clone(),
            read_dates: self.read_dates(),
            uri: uri.into(),
            image_uri: self.image_uri.clone(),
        }
    }
}
