//! Ledger trait
//!
//! The ledger is the single source of truth for which accounts have been
//! fetched. It is an append log: records are never rewritten or removed.

use crate::ledger::{LatestRecords, ProfileRecord};
use crate::ArchiverError;
use std::collections::HashSet;

/// Trait for success ledger backends
pub trait Ledger {
    /// Returns the identifiers of all accounts with at least one record
    ///
    /// Malformed entries are skipped and logged; a missing ledger is empty.
    fn load(&self) -> Result<HashSet<String>, ArchiverError>;

    /// Durably appends one record
    fn append(&mut self, record: &ProfileRecord) -> Result<(), ArchiverError>;

    /// Returns the most recent record per account
    fn replay_latest(&self) -> Result<LatestRecords, ArchiverError>;
}
