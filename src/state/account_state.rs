/// Account state definitions for tracking crawl progress
///
/// This module defines every state an account passes through during one run.
use crate::ArchiverError;
use std::fmt;

/// Represents the current state of an account in the crawl pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountState {
    // ===== Active States =====
    /// Account has not been looked at yet in this run
    Pending,

    /// Profile page is being requested from the mirror pool
    Fetching,

    /// Fetched page is being parsed
    Parsing,

    /// Images are being archived and the ledger entry written
    Archiving,

    // ===== Terminal Success State =====
    /// Profile was fetched, images archived, and the ledger entry written
    Succeeded,

    // ===== Terminal Skip State =====
    /// Account already has a ledger entry
    Skipped,

    // ===== Terminal Error States =====
    /// Every mirror failed for every retry round
    FetchFailed,

    /// Page was fetched but held no usable profile
    ParseFailed,
}

impl AccountState {
    /// Returns true if this is a terminal state (control returns to the loop)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Skipped | Self::FetchFailed | Self::ParseFailed
        )
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::ParseFailed)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// ```text
    /// Pending -> Skipped | Fetching
    /// Fetching -> FetchFailed | Parsing
    /// Parsing -> ParseFailed | Archiving
    /// Archiving -> Succeeded
    /// ```
    pub fn can_transition_to(&self, next: AccountState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Skipped)
                | (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetching, Self::Parsing)
                | (Self::Parsing, Self::ParseFailed)
                | (Self::Parsing, Self::Archiving)
                | (Self::Archiving, Self::Succeeded)
        )
    }

    /// Moves to `next`, rejecting transitions the pipeline does not allow
    pub fn advance(self, next: AccountState) -> Result<AccountState, ArchiverError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ArchiverError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Archiving => "archiving",
            Self::Succeeded => "succeeded",
            Self::Skipped => "skipped",
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
        }
    }

    /// Returns all possible account states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Fetching,
            Self::Parsing,
            Self::Archiving,
            Self::Succeeded,
            Self::Skipped,
            Self::FetchFailed,
            Self::ParseFailed,
        ]
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
