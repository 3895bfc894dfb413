//! Cosense page generation
//!
//! This module turns the latest ledger record of each account into one
//! Cosense page and writes the importable `{"pages": [...]}` document.

use crate::ledger::{LatestRecords, ProfileRecord};
use crate::url::repair_image_url;
use crate::ArchiverError;
use serde::Serialize;
use std::path::Path;

/// One page in the Cosense import format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CosensePage {
    pub title: String,
    pub lines: Vec<String>,
}

/// The complete import document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CosenseExport {
    pub pages: Vec<CosensePage>,
}

/// Builds the page for one record
///
/// Returns `None` for records without a screen name, which cannot be titled.
///
/// # Page Layout
///
/// ```text
/// @<screen_name>
///
/// [/icons/x.icon] [@<screen_name> https://x.com/<screen_name>]
///
/// Name: ... / Bio: ... / Location: ... / Joined: ...
///
/// Profile Image: [<url>]
/// Profile Banner: [<url>]
///
/// Last Updated: <fetched_at>
/// Fetched From: <mirror>
///
/// <tag line, when configured>
/// ```
pub fn build_page(record: &ProfileRecord, tag_line: &str) -> Option<CosensePage> {
    let sn = record.screen_name.trim();
    if sn.is_empty() {
        return None;
    }

    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    let image = |value: &Option<String>| {
        value
            .as_deref()
            .map(repair_image_url)
            .unwrap_or_default()
    };

    let mut lines = vec![
        format!("@{}", sn),
        String::new(),
        format!("[/icons/x.icon] [@{} https://x.com/{}]", sn, sn),
        String::new(),
        format!("Name: {}", field(&record.name)),
        format!("Bio: {}", field(&record.bio)),
        format!("Location: {}", field(&record.location)),
        format!("Joined: {}", field(&record.joined)),
        String::new(),
        format!("Profile Image: [{}]", image(&record.profile_image_url)),
        format!("Profile Banner: [{}]", image(&record.banner_image_url)),
        String::new(),
        format!("Last Updated: {}", record.fetched_at_display()),
        format!("Fetched From: {}", record.fetched_from),
        String::new(),
    ];

    if !tag_line.trim().is_empty() {
        lines.push(tag_line.trim().to_string());
    }

    Some(CosensePage {
        title: format!("@{}", sn),
        lines,
    })
}

/// Builds one page per account, in ledger order
pub fn build_export(latest: &LatestRecords, tag_line: &str) -> CosenseExport {
    let mut skipped = 0usize;
    let pages = latest
        .iter()
        .filter_map(|record| {
            let page = build_page(record, tag_line);
            if page.is_none() {
                skipped += 1;
            }
            page
        })
        .collect();

    if skipped > 0 {
        tracing::warn!("{} record(s) without screen name left out of export", skipped);
    }

    CosenseExport { pages }
}

/// Serializes the export as pretty-printed JSON with non-ASCII text kept as-is
pub fn render_export(export: &CosenseExport) -> Result<String, ArchiverError> {
    Ok(serde_json::to_string_pretty(export)?)
}

/// Writes the export to `output_path`, creating parent directories
pub fn write_export(export: &CosenseExport, output_path: &Path) -> Result<(), ArchiverError> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, render_export(export)?)?;
    Ok(())
}
