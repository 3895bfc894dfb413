//! Account source reader
//!
//! Reads the following list out of an account archive export. The archive is a
//! JavaScript file whose payload is a JSON array assigned to a variable:
//!
//! ```text
//! window.YTD.following.part0 = [
//!   { "following": { "accountId": "12", "userLink": "..." } },
//!   ...
//! ]
//! ```

use crate::ArchiverError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ArchiveEntry {
    following: Option<FollowingEntry>,
}

#[derive(Debug, Deserialize)]
struct FollowingEntry {
    #[serde(rename = "accountId")]
    account_id: Option<String>,
}

/// Reads and parses the account archive at `path`
///
/// Any failure, including an unreadable file, is a `SourceFormat` error.
pub fn load_following_archive(path: &Path) -> Result<Vec<String>, ArchiverError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ArchiverError::SourceFormat(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_following_archive(&content)
}

/// Extracts account identifiers from raw archive content, in archive order
///
/// The assignment prefix and a UTF-8 byte order mark are stripped before the
/// embedded array is parsed. Entries without an `accountId` are ignored and
/// duplicates keep their first position.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Account identifiers in archive order
/// * `Err(ArchiverError::SourceFormat)` - No identifier list could be located
///
/// # Example
///
/// ```
/// use followings_archiver::source::parse_following_archive;
///
/// let raw = r#"window.YTD.following.part0 = [{"following":{"accountId":"42"}}]"#;
/// assert_eq!(parse_following_archive(raw).unwrap(), vec!["42".to_string()]);
/// ```
pub fn parse_following_archive(content: &str) -> Result<Vec<String>, ArchiverError> {
    let content = content.trim_start_matches('\u{feff}');

    let start = content
        .find('[')
        .ok_or_else(|| ArchiverError::SourceFormat("no JSON array found in archive".to_string()))?;
    let payload = content[start..].trim_end().trim_end_matches(';');

    let entries: Vec<ArchiveEntry> = serde_json::from_str(payload)
        .map_err(|e| ArchiverError::SourceFormat(format!("invalid archive JSON: {}", e)))?;

    let mut seen = HashSet::new();
    let ids: Vec<String> = entries
        .into_iter()
        .filter_map(|entry| entry.following.and_then(|f| f.account_id))
        .filter(|id| {
            let usable = is_usable_account_id(id);
            if !usable {
                tracing::warn!("Ignoring account identifier {:?}: not a plain identifier", id);
            }
            usable
        })
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if ids.is_empty() {
        return Err(ArchiverError::SourceFormat(
            "archive contains no account identifiers".to_string(),
        ));
    }

    tracing::debug!("Read {} account identifiers from archive", ids.len());
    Ok(ids)
}

/// Identifiers name directories under the image archive, so only plain
/// alphanumeric tokens (plus `_` and `-`) are accepted
fn is_usable_account_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
