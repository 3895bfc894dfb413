//! State module for tracking crawl progress
//!
//! `AccountState` tracks one account through a single run of the pipeline:
//! skip decision, fetch, parse, archive.

mod account_state;

pub use account_state::AccountState;
