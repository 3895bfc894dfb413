//! Mirror client implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Fetching profile pages from a rotating pool of mirrors
//! - Failover between mirrors and backoff between retry rounds
//! - Downloading image bytes

use crate::config::{Config, CrawlerConfig, MirrorConfig, UserAgentConfig};
use crate::crawler::parser::looks_like_profile_page;
use crate::ArchiverError;
use reqwest::Client;
use std::time::Duration;

/// Result of a single request to one mirror
#[derive(Debug)]
pub enum MirrorAttempt {
    /// The mirror returned a profile page
    Success {
        /// Page body content
        body: String,
    },

    /// The mirror answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },

    /// The mirror answered 2xx but the body is not a profile page
    InvalidBody {
        /// Why the body was rejected
        reason: String,
    },
}

/// A profile page together with the mirror that served it
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Base URL of the mirror that answered
    pub host: String,

    /// Full URL that was requested
    pub url: String,

    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use followings_archiver::config::{CrawlerConfig, UserAgentConfig};
/// use followings_archiver::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format!("{}/{}", user_agent.name, user_agent.version))
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a profile page from a single mirror
///
/// # Outcome Mapping
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with a profile page | Success |
/// | non-2xx status | HttpError |
/// | timeout / connect failure / body read failure | NetworkError |
/// | 2xx with empty or non-profile body | InvalidBody |
pub async fn fetch_from_mirror(client: &Client, url: &str) -> MirrorAttempt {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return MirrorAttempt::NetworkError { error };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return MirrorAttempt::HttpError {
            status_code: status.as_u16(),
        };
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return MirrorAttempt::NetworkError {
                error: e.to_string(),
            }
        }
    };

    if body.trim().is_empty() {
        return MirrorAttempt::InvalidBody {
            reason: "empty body".to_string(),
        };
    }

    if !looks_like_profile_page(&body) {
        return MirrorAttempt::InvalidBody {
            reason: "no profile card in page".to_string(),
        };
    }

    MirrorAttempt::Success { body }
}

/// Client for a rotating pool of mirror hosts
///
/// Each account is tried against every host, starting one host further along
/// the pool than the previous account. A full pass with no success is one
/// round; rounds are separated by a backoff wait and capped by `retry_rounds`.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    client: Client,
    hosts: Vec<String>,
    profile_path: String,
    retry_rounds: u32,
    retry_backoff: Duration,
    next_start: usize,
}

impl MirrorClient {
    /// Creates a mirror client from an existing HTTP client
    pub fn new(client: Client, mirrors: &MirrorConfig, crawler: &CrawlerConfig) -> Self {
        Self {
            client,
            hosts: mirrors
                .hosts
                .iter()
                .map(|h| h.trim_end_matches('/').to_string())
                .collect(),
            profile_path: mirrors.profile_path.clone(),
            retry_rounds: crawler.retry_rounds.max(1),
            retry_backoff: Duration::from_millis(crawler.retry_backoff_ms),
            next_start: 0,
        }
    }

    /// Builds the HTTP client and mirror pool from configuration
    pub fn from_config(config: &Config) -> Result<Self, ArchiverError> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;
        Ok(Self::new(client, &config.mirrors, &config.crawler))
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Profile page URL for `account_id` on `host`
    pub fn profile_url(&self, host: &str, account_id: &str) -> String {
        let path = self
            .profile_path
            .replace("{id}", &urlencoding::encode(account_id));
        format!("{}{}", host, path)
    }

    /// Fetches the profile page for one account with failover and retry
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - Page body and the mirror that served it
    /// * `Err(ArchiverError::FetchExhausted)` - No mirror succeeded in any round
    pub async fn fetch(&mut self, account_id: &str) -> Result<FetchedPage, ArchiverError> {
        if self.hosts.is_empty() {
            return Err(ArchiverError::FetchExhausted {
                account_id: account_id.to_string(),
                rounds: 0,
            });
        }

        let start = self.next_start % self.hosts.len();
        self.next_start = (start + 1) % self.hosts.len();

        for round in 1..=self.retry_rounds {
            for offset in 0..self.hosts.len() {
                let host = &self.hosts[(start + offset) % self.hosts.len()];
                let url = self.profile_url(host, account_id);
                tracing::debug!("Fetching {} (round {})", url, round);

                match fetch_from_mirror(&self.client, &url).await {
                    MirrorAttempt::Success { body } => {
                        return Ok(FetchedPage {
                            host: host.clone(),
                            url,
                            body,
                        });
                    }
                    MirrorAttempt::HttpError { status_code } => {
                        tracing::warn!("{}: HTTP {}", host, status_code);
                    }
                    MirrorAttempt::NetworkError { error } => {
                        tracing::warn!("{}: {}", host, error);
                    }
                    MirrorAttempt::InvalidBody { reason } => {
                        tracing::warn!("{}: {}", host, reason);
                    }
                }
            }

            if round < self.retry_rounds {
                tracing::info!(
                    "All {} mirrors failed for {} (round {}/{}), retrying in {:?}",
                    self.hosts.len(),
                    account_id,
                    round,
                    self.retry_rounds,
                    self.retry_backoff
                );
                tokio::time::sleep(self.retry_backoff).await;
            }
        }

        Err(ArchiverError::FetchExhausted {
            account_id: account_id.to_string(),
            rounds: self.retry_rounds,
        })
    }

    /// Downloads raw bytes from `url`
    ///
    /// Non-success statuses and empty bodies are reported as `ImageDownload` errors.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ArchiverError> {
        let download_error = |message: String| ArchiverError::ImageDownload {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        if bytes.is_empty() {
            return Err(download_error("empty body".to_string()));
        }

        Ok(bytes.to_vec())
    }
}
