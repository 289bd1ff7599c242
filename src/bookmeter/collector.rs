//! Record collection over a Bookmeter session.

use crate::bookmeter::cache::DetailCache;
use crate::bookmeter::client::BookmeterSession;
use crate::bookmeter::listings::{absolute_uri, validate_user_id, ListingKind};
use crate::bookmeter::models::{Books, Profile, User, YearMonth};
use crate::bookmeter::pagination::PageStream;
use crate::bookmeter::parser::{Parser, UserLayout};
use crate::bookmeter::window;
use crate::error::ScraperError;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Collects books, users and profiles for a subject through a session.
pub struct Collector<'a, S: ?Sized> {
    session: &'a S,
    parser: Parser,
    max_pages: Option<u32>,
}

impl<'a, S> Collector<'a, S>
where
    S: BookmeterSession + ?Sized,
{
    pub fn new(session: &'a S) -> Self {
        Self { session, parser: Parser::new(), max_pages: None }
    }

    /// Bounds the number of listing pages fetched per call.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Books read or re-read by `user_id` during `month`.
    pub async fn read_books_in_month(&self, user_id: &str, month: YearMonth) -> Result<Books> {
        info!("Collecting books read by {} in {}", user_id, month);

        let mut stream = PageStream::books(self.session, user_id, ListingKind::ReadBooks)?
            .with_max_pages(self.max_pages);
        let mut cache = DetailCache::new();

        let books =
            window::read_books_in_month(&mut stream, self.session, &self.parser, &mut cache, month)
                .await?;

        debug!(
            "Fetched {} listing pages and {} book pages",
            stream.pages_fetched(),
            cache.len()
        );
        Ok(books)
    }

    /// Every book on one of the user's book listings.
    pub async fn books(&self, user_id: &str, kind: ListingKind) -> Result<Books> {
        if !kind.is_books() {
            anyhow::bail!(ScraperError::InvalidListing { kind: kind.to_string(), expected: "books" });
        }

        info!("Collecting {} books of {}", kind, user_id);

        let mut stream =
            PageStream::books(self.session, user_id, kind)?.with_max_pages(self.max_pages);
        let mut cache = DetailCache::new();
        let mut books = Books::new();

        while let Some(page) = stream.next_page().await? {
            for slot in page.leading() {
                let detail = cache.get_or_fetch(self.session, &self.parser, &slot.link).await?;
                books.push(detail.to_book(absolute_uri(&slot.link)));
            }
        }

        info!("Collected {} books", books.len());
        Ok(books)
    }

    /// Users following `user_id`.
    pub async fn followers(&self, user_id: &str) -> Result<Vec<User>> {
        self.users(user_id, ListingKind::Followers, UserLayout::Other).await
    }

    /// Users `user_id` follows.
    pub async fn followings(&self, user_id: &str) -> Result<Vec<User>> {
        let layout = if self.session.log_in_user_id() == Some(user_id) {
            UserLayout::Own
        } else {
            UserLayout::Other
        };
        self.users(user_id, ListingKind::Followings, layout).await
    }

    async fn users(&self, user_id: &str, kind: ListingKind, layout: UserLayout) -> Result<Vec<User>> {
        info!("Collecting {} of {}", kind, user_id);

        let mut stream =
            PageStream::users(self.session, user_id, kind, layout)?.with_max_pages(self.max_pages);
        let mut users = Vec::new();

        while let Some(page) = stream.next_page().await? {
            users.extend(page.leading().filter_map(|slot| self.parser.parse_user(slot)));
        }

        info!("Collected {} users", users.len());
        Ok(users)
    }

    /// The profile of `user_id`. Requires a logged-in session.
    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        validate_user_id(user_id)?;
        if !self.session.is_authenticated() {
            anyhow::bail!(ScraperError::NotAuthenticated);
        }

        let html = self.session.fetch_profile_page(user_id).await?;
        self.parser
            .parse_profile(&html)
            .with_context(|| format!("Failed to parse profile of user {}", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmeter::mock::{book, book_listing_html, parse_date, MockBook, MockSession};
    use crate::error::scraper_error;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn names(books: &Books) -> Vec<&str> {
        books.iter().map(|b| b.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_month_inside_first_page_stops_early() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("may", "2023-05-20"), book("april", "2023-04-11"), book("march", "2023-03-02")],
            vec![book("feb", "2023-02-14"), book("jan", "2023-01-01")],
        ]);

        let books = Collector::new(&session).read_books_in_month("104", ym("2023-04")).await.unwrap();

        assert_eq!(names(&books), vec!["april"]);
        assert_eq!(books.as_slice()[0].read_dates, vec![parse_date("2023-04-11")]);
        assert_eq!(books.as_slice()[0].uri, "https://bookmeter.com/b/april");
        assert_eq!(session.listing_calls(), 1);
    }

    #[tokio::test]
    async fn test_reread_month_attaches_all_dates() {
        let session = MockSession::new().with_shelf(vec![vec![
            book("new", "2023-07-01"),
            book("classic", "2022-01-10").reread("2023-06-02"),
            book("old", "2021-05-05"),
        ]]);

        let books = Collector::new(&session).read_books_in_month("104", ym("2023-06")).await.unwrap();

        assert_eq!(names(&books), vec!["classic"]);
        assert_eq!(
            books.as_slice()[0].read_dates,
            vec![parse_date("2022-01-10"), parse_date("2023-06-02")]
        );
    }

    #[tokio::test]
    async fn test_month_straddling_pages() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2023-06-03"), book("b", "2023-05-30"), book("c", "2023-05-12")],
            vec![book("d", "2023-05-09"), book("e", "2023-05-01")],
            vec![book("f", "2023-05-01"), book("g", "2023-04-28")],
            vec![book("h", "2023-03-01")],
        ]);

        let books = Collector::new(&session).read_books_in_month("104", ym("2023-05")).await.unwrap();

        assert_eq!(names(&books), vec!["b", "c", "d", "e", "f"]);
        // Page 3 ends inside the window's lower edge, so page 4 is never needed
        assert_eq!(session.listing_calls(), 3);
    }

    #[tokio::test]
    async fn test_probes_one_page_past_boundary() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2023-08-01"), book("b", "2023-07-15")],
            vec![book("c", "2023-07-02"), book("d", "2023-07-01")],
            vec![book("e", "2023-06-30"), book("f", "2023-06-01")],
            vec![book("g", "2023-05-01")],
            vec![book("h", "2023-04-01")],
        ]);

        let books = Collector::new(&session).read_books_in_month("104", ym("2023-07")).await.unwrap();

        assert_eq!(names(&books), vec!["b", "c", "d"]);
        // Target only overlaps pages 1-2; page 3 is the single probe past it
        assert_eq!(session.listing_calls(), 3);
    }

    #[tokio::test]
    async fn test_skips_newer_pages() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2024-01-01"), book("b", "2023-12-01")],
            vec![book("c", "2023-11-20"), book("d", "2023-10-01")],
            vec![book("e", "2023-09-01"), book("f", "2023-08-01")],
            vec![book("g", "2023-07-01")],
        ]);

        let books = Collector::new(&session).read_books_in_month("104", ym("2023-08")).await.unwrap();

        assert_eq!(names(&books), vec!["f"]);
        // Pages 1-2 are skipped, page 3 ends on the target, page 4 confirms the end
        assert_eq!(session.listing_calls(), 4);
    }

    #[tokio::test]
    async fn test_month_with_no_matches() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2023-05-01"), book("b", "2023-03-01")],
            vec![book("c", "2023-01-01")],
        ]);

        let books = Collector::new(&session).read_books_in_month("104", ym("2023-04")).await.unwrap();
        assert!(books.is_empty());
        assert_eq!(session.listing_calls(), 1);

        let books = Collector::new(&session).read_books_in_month("104", ym("2030-01")).await.unwrap();
        assert!(books.is_empty());

        let books = Collector::new(&session).read_books_in_month("104", ym("1999-01")).await.unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_partition_invariance() {
        let shelf = vec![
            book("a", "2023-09-10"),
            book("b", "2023-09-01"),
            book("c", "2023-08-31"),
            book("d", "2023-08-15"),
            book("e", "2023-08-02"),
            book("f", "2023-08-01"),
            book("g", "2023-07-31"),
            book("h", "2023-07-04"),
            book("i", "2023-06-20"),
            book("j", "2023-06-19"),
        ];
        let months = ["2023-10", "2023-09", "2023-08", "2023-07", "2023-06", "2023-05"];

        for page_size in 1..=shelf.len() {
            let pages: Vec<Vec<_>> = shelf.chunks(page_size).map(|c| c.to_vec()).collect();
            let session = MockSession::new().with_shelf(pages);
            let collector = Collector::new(&session);

            for month in months {
                let target = ym(month);
                let books = collector.read_books_in_month("104", target).await.unwrap();

                let expected: Vec<&str> = shelf
                    .iter()
                    .filter(|b| b.read.map(YearMonth::from) == Some(target))
                    .map(|b| b.name.as_str())
                    .collect();
                assert_eq!(names(&books), expected, "page size {}, month {}", page_size, month);
                assert!(books.iter().all(|b| b.read_in(target)));
            }
        }
    }

    #[tokio::test]
    async fn test_partition_invariance_with_rereads() {
        // Ordered by each book's most recent read
        let shelf = vec![
            book("a", "2023-06-10"),
            book("x", "2022-01-10").reread("2023-05-20"),
            book("b", "2023-05-15"),
            book("y", "2021-03-03").reread("2023-04-28"),
            book("c", "2023-04-01"),
            book("d", "2023-03-09"),
        ];
        let months = ["2023-07", "2023-06", "2023-05", "2023-04", "2023-03", "2023-02"];

        for page_size in 1..=shelf.len() {
            let pages: Vec<Vec<_>> = shelf.chunks(page_size).map(|c| c.to_vec()).collect();
            let session = MockSession::new().with_shelf(pages);
            let collector = Collector::new(&session);

            for month in months {
                let target = ym(month);
                let books = collector.read_books_in_month("104", target).await.unwrap();

                let expected: Vec<&str> = shelf
                    .iter()
                    .filter(|b| {
                        b.read.iter().chain(&b.rereads).any(|d| YearMonth::from(*d) == target)
                    })
                    .map(|b| b.name.as_str())
                    .collect();
                assert_eq!(names(&books), expected, "page size {}, month {}", page_size, month);
            }
        }
    }

    #[tokio::test]
    async fn test_reread_at_page_edge_does_not_stop_walk() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2023-06-10"), book("x", "2022-01-10").reread("2023-05-20")],
            vec![book("b", "2023-05-15"), book("c", "2023-04-01")],
        ]);

        let books = Collector::new(&session).read_books_in_month("104", ym("2023-05")).await.unwrap();

        assert_eq!(names(&books), vec!["x", "b"]);
        assert_eq!(session.listing_calls(), 2);
    }

    #[tokio::test]
    async fn test_undated_page_is_skipped() {
        let undated = |name: &str| MockBook { name: name.to_string(), read: None, rereads: Vec::new() };
        let shelf = vec![
            vec![book("a", "2023-06-01"), book("b", "2023-05-20")],
            vec![undated("u1"), undated("u2")],
            vec![book("c", "2023-04-20"), book("d", "2023-03-01")],
            vec![book("e", "2023-02-01")],
        ];

        let session = MockSession::new().with_shelf(shelf.clone());
        let books = Collector::new(&session).read_books_in_month("104", ym("2023-04")).await.unwrap();
        assert_eq!(names(&books), vec!["c"]);
        assert_eq!(session.listing_calls(), 3);

        let session = MockSession::new().with_shelf(shelf);
        let books = Collector::new(&session).read_books_in_month("104", ym("2023-05")).await.unwrap();
        assert_eq!(names(&books), vec!["b"]);
        assert_eq!(session.listing_calls(), 3);
    }

    #[tokio::test]
    async fn test_detail_pages_fetched_once() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2023-05-20"), book("b", "2023-05-11"), book("c", "2023-04-02")],
        ]);

        Collector::new(&session).read_books_in_month("104", ym("2023-05")).await.unwrap();

        // Span lookup and extraction share the cache
        assert_eq!(session.book_calls(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_books_appear_once() {
        let session = MockSession::new()
            .with_shelf(vec![vec![book("a", "2023-05-20"), book("b", "2023-05-11")]])
            .with_listing(
                ListingKind::ReadBooks,
                vec![
                    book_listing_html(&["/b/a", "/b/b"], true),
                    book_listing_html(&["/b/a", "/b/b"], true),
                ],
            );

        let collector = Collector::new(&session);
        let books = collector.read_books_in_month("104", ym("2023-05")).await.unwrap();
        assert_eq!(names(&books), vec!["a", "b"]);

        let books = collector.books("104", ListingKind::ReadBooks).await.unwrap();
        assert_eq!(names(&books), vec!["a", "b"]);
        assert!(!books.as_slice()[0].same_book(&books.as_slice()[1]));
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let session = MockSession::new();
        let collector = Collector::new(&session);

        assert!(collector.books("104", ListingKind::ReadBooks).await.unwrap().is_empty());
        assert!(collector.read_books_in_month("104", ym("2023-01")).await.unwrap().is_empty());
        assert_eq!(session.book_calls(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_listings_are_empty() {
        let session = MockSession::new()
            .with_shelf(vec![vec![book("a", "2023-05-20")]])
            .logged_out();
        let collector = Collector::new(&session);

        assert!(collector.books("104", ListingKind::ReadBooks).await.unwrap().is_empty());
        assert!(collector.read_books_in_month("104", ym("2023-05")).await.unwrap().is_empty());
        assert!(collector.followers("104").await.unwrap().is_empty());
        assert_eq!(session.listing_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_subject() {
        let session = MockSession::new();
        let collector = Collector::new(&session);

        let err = collector.books("abc", ListingKind::ReadBooks).await.unwrap_err();
        assert_eq!(scraper_error(&err), Some(&ScraperError::InvalidSubject("abc".into())));

        let err = collector.read_books_in_month("", ym("2023-01")).await.unwrap_err();
        assert!(matches!(scraper_error(&err), Some(ScraperError::InvalidSubject(_))));

        let err = collector.profile("u104").await.unwrap_err();
        assert!(matches!(scraper_error(&err), Some(ScraperError::InvalidSubject(_))));
    }

    #[tokio::test]
    async fn test_all_books() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2023-05-20"), book("b", "2023-04-11").reread("2023-06-01")],
            vec![book("c", "2022-01-01")],
        ]);

        let books = Collector::new(&session).books("104", ListingKind::ReadBooks).await.unwrap();

        assert_eq!(names(&books), vec!["a", "b", "c"]);
        let b = &books.as_slice()[1];
        assert_eq!(b.author, "Author of b");
        assert_eq!(b.image_uri, "https://img.example/b.jpg");
        assert_eq!(b.read_dates, vec![parse_date("2023-04-11"), parse_date("2023-06-01")]);
    }

    #[tokio::test]
    async fn test_books_rejects_user_listing() {
        let session = MockSession::new();
        let err = Collector::new(&session).books("104", ListingKind::Followers).await.unwrap_err();
        assert_eq!(
            scraper_error(&err),
            Some(&ScraperError::InvalidListing { kind: "followers".into(), expected: "books" })
        );
    }

    #[tokio::test]
    async fn test_book_page_failure_propagates() {
        let session = MockSession::new()
            .with_listing(ListingKind::ReadBooks, vec![book_listing_html(&["/b/missing"], true)]);

        let result = Collector::new(&session).books("104", ListingKind::ReadBooks).await;
        assert!(result.unwrap_err().to_string().contains("404"));
    }

    fn other_users_html(users: &[(&str, &str)]) -> String {
        let mut html = String::from(r#"<div id="main_left"><div>"#);
        for (name, id) in users {
            html.push_str(&format!(
                r#"<div><div><div>icon</div><div><a title="{}" href="/u/{}">{}</a></div></div></div>"#,
                name, id, name
            ));
        }
        html.push_str(r#"<span class="now_page"><a>1</a></span></div></div>"#);
        html
    }

    fn own_users_html(users: &[(&str, &str)]) -> String {
        let mut html = String::from(r#"<div id="main_left"><div>"#);
        for (name, id) in users {
            html.push_str(&format!(r#"<div><a title="{}" href="/u/{}"><img></a></div>"#, name, id));
        }
        html.push_str("</div></div>");
        html
    }

    #[tokio::test]
    async fn test_followers_paginated() {
        let session = MockSession::new().with_listing(
            ListingKind::Followers,
            vec![
                other_users_html(&[("Alice", "11"), ("Bob", "22")]),
                other_users_html(&[("Carol", "33")]),
            ],
        );

        let users = Collector::new(&session).followers("104").await.unwrap();

        let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["11", "22", "33"]);
        assert_eq!(users[0].name, "Alice");
        assert_eq!(users[0].uri, "https://bookmeter.com/u/11");
        assert_eq!(session.listing_calls(), 3);
    }

    #[tokio::test]
    async fn test_followings_layout_follows_login() {
        let session = MockSession::new()
            .logged_in_as("104")
            .with_listing(ListingKind::Followings, vec![own_users_html(&[("Dave", "44")])]);
        let collector = Collector::new(&session);

        let own = collector.followings("104").await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, "44");

        // Someone else's follow page uses the other layout, which this markup lacks
        let other = collector.followings("105").await.unwrap();
        assert!(other.is_empty());
    }

    const PROFILE_HTML: &str = r#"<div id="side_left"><div class="inner">
        <h3>yuki</h3>
        <div class="profile">
            <dl><dt>性別</dt><dd>女</dd></dl>
            <dl><dt>現住所</dt><dd>東京都</dd></dl>
            <dl><dt>本棚</dt><dd>12</dd></dl>
        </div>
    </div></div>"#;

    #[tokio::test]
    async fn test_profile() {
        let session = MockSession::new().with_profile(PROFILE_HTML);

        let profile = Collector::new(&session).profile("104").await.unwrap();
        assert_eq!(profile.name, "yuki");
        assert_eq!(profile.address.as_deref(), Some("東京都"));
        assert_eq!(profile.bookshelf_count.as_deref(), Some("12"));
        assert!(profile.blood_type.is_none());
    }

    #[tokio::test]
    async fn test_profile_missing_name() {
        let session = MockSession::new().with_profile(
            r#"<div id="side_left"><div class="inner"><div class="profile"></div></div></div>"#,
        );

        let err = Collector::new(&session).profile("104").await.unwrap_err();
        assert_eq!(scraper_error(&err), Some(&ScraperError::MissingField("name")));
    }

    #[tokio::test]
    async fn test_profile_requires_login() {
        let session = MockSession::new().with_profile(PROFILE_HTML).logged_out();

        let err = Collector::new(&session).profile("104").await.unwrap_err();
        assert_eq!(scraper_error(&err), Some(&ScraperError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_max_pages_bounds_fetches() {
        let session = MockSession::new().with_shelf(vec![
            vec![book("a", "2023-05-01")],
            vec![book("b", "2023-04-01")],
            vec![book("c", "2023-03-01")],
        ]);

        let books = Collector::new(&session)
            .with_max_pages(Some(2))
            .read_books_in_month("104", ym("2023-03"))
            .await
            .unwrap();

        assert!(books.is_empty());
        assert_eq!(session.listing_calls(), 2);
    }
}
