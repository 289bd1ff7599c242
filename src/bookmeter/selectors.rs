//! CSS selectors for Bookmeter HTML parsing.
//!
//! Every page region the parser reads is named here. Update this file when
//! Bookmeter changes its markup, and add a fixture under `tests/fixtures/`.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for book listing pages (read, reading, tsundoku, wish).
pub mod listing {
    use super::*;

    /// Pager anchor; absent when the user has no books on the shelf at all.
    pub static ENTRIES_MARKER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#main_left > div > center > a").unwrap());

    /// Current page marker; absent on single-page listings.
    pub static NOW_PAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.now_page").unwrap());

    /// Rows of the listing. The first row is the listing header.
    pub static ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#main_left > div > div").unwrap());

    /// Book link inside a row.
    pub static BOOK_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div:nth-of-type(2) > a").unwrap());
}

/// Selectors for follower/following pages.
pub mod users {
    use super::*;

    /// User rows.
    pub static ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#main_left > div > div").unwrap());

    /// User link on someone else's follow pages.
    pub static OTHER_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div > div:nth-of-type(2) > a").unwrap());

    /// User link on the logged-in user's own follow pages.
    pub static OWN_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
}

/// Selectors for a single book's page.
pub mod book {
    use super::*;

    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#title").unwrap());

    pub static AUTHOR: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#author_name").unwrap());

    pub static IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#book_image").unwrap());

    /// Selected read date, one `<select>` per field.
    pub static READ_YEAR: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#read_date_y option").unwrap());

    pub static READ_MONTH: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#read_date_m option").unwrap());

    pub static READ_DAY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#read_date_d option").unwrap());

    /// One form per re-read event.
    pub static REREAD_FORM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.reread_box form").unwrap());

    /// Year, month and day selects inside a re-read form, in that order.
    pub static REREAD_SELECT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("select").unwrap());

    pub static OPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());
}

/// Selectors for a user's profile page.
pub mod profile {
    use super::*;

    /// User name heading.
    pub static NAME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#side_left > div.inner > h3").unwrap());

    /// Attribute block.
    pub static BLOCK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#side_left > div.inner > div.profile").unwrap());

    pub static ENTRY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl").unwrap());

    pub static LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt").unwrap());

    pub static VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());
}

/// Selectors for login and session state.
pub mod session {
    use super::*;

    /// CSRF token on the login form.
    pub static AUTHENTICITY_TOKEN: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("input[name='authenticity_token']").unwrap());

    /// Link to the logged-in user's own page in the site header.
    pub static LOGGED_IN_USER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#header a[href^='/u/']").unwrap());
}
