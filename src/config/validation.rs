use crate::config::types::{Config, CrawlerConfig, MirrorConfig, PathsConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_mirror_config(&config.mirrors)?;
    validate_paths_config(&config.paths)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.retry_rounds < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_rounds must be >= 1, got {}",
            config.retry_rounds
        )));
    }

    if config.pause_min_ms > config.pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "pause_min_ms ({}) must not exceed pause_max_ms ({})",
            config.pause_min_ms, config.pause_max_ms
        )));
    }

    Ok(())
}

/// Validates the mirror pool
fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    if config.hosts.is_empty() {
        return Err(ConfigError::Validation(
            "at least one mirror host is required".to_string(),
        ));
    }

    for host in &config.hosts {
        let url = Url::parse(host)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid mirror '{}': {}", host, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::InvalidUrl(format!(
                "Mirror '{}' must use HTTP or HTTPS",
                host
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Mirror '{}' has no host",
                host
            )));
        }
    }

    if !config.profile_path.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "profile_path must contain the {{id}} placeholder, got '{}'",
            config.profile_path
        )));
    }

    Ok(())
}

/// Validates file locations
fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("source", &config.source),
        ("ledger", &config.ledger),
        ("images", &config.images),
        ("export", &config.export),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!(
                "paths.{} cannot be empty",
                name
            )));
        }
    }

    Ok(())
}
