//! Error taxonomy for scraping operations.
//!
//! Functions return `anyhow::Result`; these variants are raised through it and
//! can be recovered with `downcast_ref::<ScraperError>()`.

use thiserror::Error;

/// Errors raised by the scraping core and its collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScraperError {
    /// Subject identifier is not a numeric Bookmeter user id.
    #[error("Invalid user id: '{0}'. Bookmeter user ids are numeric.")]
    InvalidSubject(String),

    /// The session has no valid login.
    #[error("Not logged in to Bookmeter")]
    NotAuthenticated,

    /// An expected page region was absent.
    #[error("Missing field on page: {0}")]
    MissingField(&'static str),

    /// A listing kind was used where it does not apply.
    #[error("Listing '{kind}' does not contain {expected}")]
    InvalidListing { kind: String, expected: &'static str },

    /// Login form was submitted but no logged-in user was found.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Rate limited by Bookmeter. Try increasing --delay or using a proxy.")]
    RateLimited,
}

/// Returns the scraper error carried by `err`, if any.
pub fn scraper_error(err: &anyhow::Error) -> Option<&ScraperError> {
    err.downcast_ref::<ScraperError>()
}
