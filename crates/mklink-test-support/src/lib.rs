#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (options, managers, temp trees), mocks.rs (fake backend and privilege service), assert.rs (batch assertions).

pub mod assert;
pub mod fixtures;
pub mod mocks;
