//! Bookmeter-specific modules: session, parsing, pagination and collection.

pub mod cache;
pub mod client;
pub mod collector;
pub mod listings;
pub mod models;
pub mod pagination;
pub mod parser;
pub mod selectors;
pub mod window;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{BookmeterClient, BookmeterSession, Pacing};
pub use collector::Collector;
pub use listings::ListingKind;
pub use models::{Book, Books, Profile, User, YearMonth};
pub use parser::Parser;
