//! Crawler module for profile fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Mirror failover with retry rounds
//! - Profile page parsing
//! - Overall crawl coordination and run modes

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{run_crawl, AccountResult, Coordinator, CrawlReport, RunMode, RunOutcome};
pub use fetcher::{build_http_client, fetch_from_mirror, FetchedPage, MirrorAttempt, MirrorClient};
pub use parser::{looks_like_profile_page, parse_profile, ParsedProfile};
