//! Differential image archiving
//!
//! Layout under the archive root:
//!
//! ```text
//! <account>/<kind>/<YYYYmmdd-HHMMSS>_<file>   history, one file per stored asset
//! <account>/<kind>.<ext>                      latest alias (symlink or copy)
//! <account>/<kind>.url                        source URL of the latest asset
//! ```

use crate::crawler::MirrorClient;
use crate::images::ImageKind;
use crate::ledger::source_now;
use crate::url::image_filename;
use crate::ArchiverError;
use chrono::{DateTime, FixedOffset};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A stored image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub account_id: String,
    pub kind: ImageKind,
    pub source_url: String,
    pub stored_path: PathBuf,
    pub timestamp: DateTime<FixedOffset>,
}

/// What happened to one (account, kind, url) archive request
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// The profile has no image of this kind
    NoUrl,

    /// The URL matches the latest stored asset; nothing was downloaded
    Unchanged,

    /// A new asset was downloaded and the latest alias now points at it
    Stored(ImageAsset),

    /// Download or write failed; the last-known URL was not advanced
    Failed(ArchiverError),
}

/// Stores profile and banner images, keeping one history entry per distinct URL
#[derive(Debug, Clone)]
pub struct ImageArchiver {
    root: PathBuf,
}

impl ImageArchiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the history for one account and kind
    pub fn history_dir(&self, account_id: &str, kind: ImageKind) -> PathBuf {
        self.root.join(account_id).join(kind.as_str())
    }

    fn marker_path(&self, account_id: &str, kind: ImageKind) -> PathBuf {
        self.root
            .join(account_id)
            .join(format!("{}.url", kind.as_str()))
    }

    /// Source URL of the most recently stored asset, if any
    pub fn last_known_url(&self, account_id: &str, kind: ImageKind) -> Option<String> {
        let path = self.marker_path(account_id, kind);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Path of the current latest alias, if one exists
    pub fn latest_alias(&self, account_id: &str, kind: ImageKind) -> Option<PathBuf> {
        self.alias_candidates(account_id, kind).into_iter().next()
    }

    /// Archives one image if its URL differs from the latest stored one
    ///
    /// The bytes come from the mirror-proxied `mirror_url`; the canonical
    /// `source_url` is only downloaded when no mirror copy is known. The
    /// canonical URL is always the deduplication key. Failures are returned as
    /// `ArchiveOutcome::Failed` rather than as errors, since they never abort
    /// the account.
    pub async fn archive(
        &self,
        client: &MirrorClient,
        account_id: &str,
        kind: ImageKind,
        source_url: Option<&str>,
        mirror_url: Option<&str>,
    ) -> ArchiveOutcome {
        let source_url = match source_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => return ArchiveOutcome::NoUrl,
        };

        if self.last_known_url(account_id, kind).as_deref() == Some(source_url) {
            tracing::debug!("{} {} image unchanged", account_id, kind);
            return ArchiveOutcome::Unchanged;
        }

        let download_url = mirror_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(source_url);

        tracing::info!("[IMG FETCH] {} {} {}", account_id, kind, download_url);
        let bytes = match client.download(download_url).await {
            Ok(bytes) => bytes,
            Err(e) => return ArchiveOutcome::Failed(e),
        };

        match self.store(account_id, kind, source_url, &bytes, source_now()) {
            Ok(asset) => ArchiveOutcome::Stored(asset),
            Err(e) => ArchiveOutcome::Failed(e),
        }
    }

    /// Writes a downloaded image into the history and repoints the latest alias
    ///
    /// The last-known URL marker is written last, so an interrupted store is
    /// retried on the next crawl.
    pub fn store(
        &self,
        account_id: &str,
        kind: ImageKind,
        source_url: &str,
        bytes: &[u8],
        timestamp: DateTime<FixedOffset>,
    ) -> Result<ImageAsset, ArchiverError> {
        let filename = image_filename(source_url).unwrap_or_else(|| "image.jpg".to_string());
        let history_name = format!("{}_{}", timestamp.format("%Y%m%d-%H%M%S"), filename);

        let dir = self.history_dir(account_id, kind);
        std::fs::create_dir_all(&dir)?;
        let stored_path = dir.join(&history_name);
        std::fs::write(&stored_path, bytes)?;

        let ext = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        self.update_alias(account_id, kind, &history_name, ext)?;

        std::fs::write(
            self.marker_path(account_id, kind),
            format!("{}\n", source_url),
        )?;

        tracing::info!("[IMG OK] {}", stored_path.display());
        Ok(ImageAsset {
            account_id: account_id.to_string(),
            kind,
            source_url: source_url.to_string(),
            stored_path,
            timestamp,
        })
    }

    /// Replaces every alias of `kind` with one pointing at `history_name`
    fn update_alias(
        &self,
        account_id: &str,
        kind: ImageKind,
        history_name: &str,
        ext: &str,
    ) -> Result<(), ArchiverError> {
        for stale in self.alias_candidates(account_id, kind) {
            std::fs::remove_file(&stale)?;
        }

        let alias = self
            .root
            .join(account_id)
            .join(format!("{}.{}", kind.as_str(), ext));
        let relative_target = Path::new(kind.as_str()).join(history_name);

        #[cfg(unix)]
        {
            match std::os::unix::fs::symlink(&relative_target, &alias) {
                Ok(()) => return Ok(()),
                Err(e) => tracing::debug!("symlink failed ({}), copying instead", e),
            }
        }

        let target = self.history_dir(account_id, kind).join(history_name);
        std::fs::copy(&target, &alias)?;
        Ok(())
    }

    /// Existing `<kind>.<ext>` entries (files or links) for an account
    fn alias_candidates(&self, account_id: &str, kind: ImageKind) -> Vec<PathBuf> {
        let dir = self.root.join(account_id);
        let prefix = format!("{}.", kind.as_str());

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut aliases: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with(&prefix) && !name.ends_with(".url")
            })
            .filter(|entry| {
                entry
                    .file_type()
                    .map(|t| t.is_file() || t.is_symlink())
                    .unwrap_or(false)
            })
            .map(|entry| entry.path())
            .collect();
        aliases.sort();
        aliases
    }
}
