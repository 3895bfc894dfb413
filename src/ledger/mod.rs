//! Success ledger for persisting crawl results
//!
//! This module handles the append-only record of successful fetches:
//! - Profile record definition and legacy field compatibility
//! - Durable single-line appends
//! - Tolerant replay for resumption and export

mod jsonl;
mod record;
mod traits;

pub use jsonl::JsonlLedger;
pub use record::{source_now, LatestRecords, ProfileRecord, SOURCE_UTC_OFFSET_SECS};
pub use traits::Ledger;

#[cfg(test)]
pub(crate) use record::sample_record;
