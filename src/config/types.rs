use serde::Deserialize;

/// Main configuration structure for Followings-Archiver
///
/// Every section is optional; missing sections and keys fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub mirrors: MirrorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub paths: PathsConfig,
    pub export: ExportConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Total timeout for a single mirror request or image download (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Number of full passes over the mirror pool before an account is given up
    #[serde(rename = "retry-rounds")]
    pub retry_rounds: u32,

    /// Wait between two passes over the mirror pool (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Lower bound of the pause between two accounts (milliseconds)
    #[serde(rename = "pause-min-ms")]
    pub pause_min_ms: u64,

    /// Upper bound of the pause between two accounts (milliseconds)
    #[serde(rename = "pause-max-ms")]
    pub pause_max_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            retry_rounds: 3,
            retry_backoff_ms: 5000,
            pause_min_ms: 700,
            pause_max_ms: 1500,
        }
    }
}

/// Mirror pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Mirror base URLs, tried in order (rotating per account)
    pub hosts: Vec<String>,

    /// Profile page path; `{id}` is replaced with the account identifier
    #[serde(rename = "profile-path")]
    pub profile_path: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            hosts: vec![
                "https://nitter.tiekoetter.com".to_string(),
                "https://xcancel.com".to_string(),
                "https://lightbrd.com".to_string(),
                "https://nitter.space".to_string(),
                "https://nuku.trabun.org".to_string(),
            ],
            profile_path: "/i/user/{id}".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name sent in the User-Agent header
    pub name: String,

    /// Version sent in the User-Agent header
    pub version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// File locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Account archive holding the following list
    pub source: String,

    /// Append-only success ledger (newline-delimited JSON)
    pub ledger: String,

    /// Root directory of the image archive
    pub images: String,

    /// Cosense page JSON written by the exporter
    pub export: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "data/following.js".to_string(),
            ledger: "logs/success.jsonl".to_string(),
            images: "images".to_string(),
            export: "output/cosense_followings.json".to_string(),
        }
    }
}

/// Cosense export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Tag line closing every page; omitted when empty
    #[serde(rename = "tag-line")]
    pub tag_line: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            tag_line: "#twitter #followings".to_string(),
        }
    }
}
