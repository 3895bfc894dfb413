//! Configuration module for Followings-Archiver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a configuration file is valid.
//!
//! # Example
//!
//! ```no_run
//! use followings_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("followings.toml")).unwrap();
//! println!("Retry rounds: {}", config.crawler.retry_rounds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ExportConfig, MirrorConfig, PathsConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
