use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Offset of the timezone used for ledger timestamps and image file names (JST)
pub const SOURCE_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// Returns the current time in the source timezone, truncated to whole seconds
pub fn source_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(SOURCE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    let now = Utc::now().with_timezone(&offset);
    now.with_nanosecond(0).unwrap_or(now)
}

/// One successful profile fetch, as stored in the ledger
///
/// Field aliases accept the key names written by earlier versions of the
/// tool, so old ledgers replay unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub account_id: String,

    #[serde(default)]
    pub screen_name: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub joined: Option<String>,

    /// Canonical profile image URL on the image host
    #[serde(default, alias = "profile_pic")]
    pub profile_image_url: Option<String>,

    /// Canonical banner image URL on the image host
    #[serde(default, alias = "profile_banner")]
    pub banner_image_url: Option<String>,

    /// Profile image URL as proxied by the mirror that served the page
    #[serde(default, alias = "profile_pic_nitter")]
    pub profile_image_mirror_url: Option<String>,

    /// Banner image URL as proxied by the mirror that served the page
    #[serde(default, alias = "profile_banner_nitter")]
    pub banner_image_mirror_url: Option<String>,

    pub fetched_at: DateTime<FixedOffset>,

    /// Base URL of the mirror that answered
    pub fetched_from: String,
}

impl ProfileRecord {
    /// Timestamp formatted the way it appears in exports
    pub fn fetched_at_display(&self) -> String {
        self.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

/// Most recent record per account, in order of first appearance in the ledger
#[derive(Debug, Clone, Default)]
pub struct LatestRecords {
    order: Vec<String>,
    by_id: HashMap<String, ProfileRecord>,
}

impl LatestRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `record` as the latest for its account; later inserts win
    pub fn insert(&mut self, record: ProfileRecord) {
        if !self.by_id.contains_key(&record.account_id) {
            self.order.push(record.account_id.clone());
        }
        self.by_id.insert(record.account_id.clone(), record);
    }

    pub fn get(&self, account_id: &str) -> Option<&ProfileRecord> {
        self.by_id.get(account_id)
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.by_id.contains_key(account_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates records in order of first appearance
    pub fn iter(&self) -> impl Iterator<Item = &ProfileRecord> {
        self.order.iter().filter_map(move |id| self.by_id.get(id))
    }
}

#[cfg(test)]
pub(crate) fn sample_record(account_id: &str, screen_name: &str) -> ProfileRecord {
    let fetched_at = DateTime::parse_from_rfc3339("2025-01-02T03:04:05+09:00").unwrap();
    ProfileRecord {
        account_id: account_id.to_string(),
        screen_name: screen_name.to_string(),
        name: Some(format!("{} name", screen_name)),
        bio: None,
        location: None,
        joined: None,
        profile_image_url: None,
        banner_image_url: None,
        profile_image_mirror_url: None,
        banner_image_mirror_url: None,
        fetched_at,
        fetched_from: "https://mirror.example".to_string(),
    }
}
