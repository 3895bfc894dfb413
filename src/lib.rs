//! Followings-Archiver: a resumable profile crawler for followed accounts
//!
//! This crate reads the following list from an account archive, fetches each
//! account's public profile through a pool of mirror front-ends, archives the
//! profile and banner images, and keeps an append-only success ledger that
//! drives both resumption and the Cosense page export.

pub mod config;
pub mod crawler;
pub mod export;
pub mod images;
pub mod ledger;
pub mod source;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Followings-Archiver operations
#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Account archive is unusable: {0}")]
    SourceFormat(String),

    #[error("All mirrors failed for account {account_id} after {rounds} round(s)")]
    FetchExhausted { account_id: String, rounds: u32 },

    #[error("Profile parse error for account {account_id}: {message}")]
    Parse { account_id: String, message: String },

    #[error("Image download failed for {url}: {message}")]
    ImageDownload { url: String, message: String },

    #[error("Corrupt ledger line {line}: {message}")]
    LedgerCorruptLine { line: usize, message: String },

    #[error("Ledger file error at {path}: {source}")]
    Ledger {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::AccountState,
        to: state::AccountState,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid mirror URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Followings-Archiver operations
pub type Result<T> = std::result::Result<T, ArchiverError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, RunMode};
pub use ledger::{JsonlLedger, Ledger, ProfileRecord};
pub use state::AccountState;
pub use url::{canonical_image_url, repair_image_url};
