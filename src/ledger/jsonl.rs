//! Newline-delimited JSON ledger file

use crate::ledger::{LatestRecords, Ledger, ProfileRecord};
use crate::ArchiverError;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Ledger stored as one JSON record per line
///
/// Each append writes a single fully serialized line and syncs it, so a crash
/// leaves at worst one truncated trailing line, which replay skips.
#[derive(Debug, Clone)]
pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    /// Creates a ledger backed by `path`; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses every well-formed record in file order
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ProfileRecord>)` - Records in the order they were appended
    /// * `Err(ArchiverError::Ledger)` - The file exists but cannot be read
    pub fn replay(&self) -> Result<Vec<ProfileRecord>, ArchiverError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No ledger at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut records = Vec::new();
        let mut corrupt = 0usize;

        // Lines are split as bytes: a crash mid-character must only cost that line
        for (index, line) in content.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<ProfileRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    corrupt += 1;
                    let err = ArchiverError::LedgerCorruptLine {
                        line: index + 1,
                        message: e.to_string(),
                    };
                    tracing::warn!("Skipping ledger entry: {}", err);
                }
            }
        }

        if corrupt > 0 {
            tracing::warn!(
                "Ledger {}: {} corrupt line(s) skipped",
                self.path.display(),
                corrupt
            );
        }

        Ok(records)
    }

    /// Returns true if the file is non-empty and its last byte is not a newline
    fn has_unterminated_tail(file: &mut File) -> std::io::Result<bool> {
        if file.metadata()?.len() == 0 {
            return Ok(false);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }

    fn io_error(&self, source: std::io::Error) -> ArchiverError {
        ArchiverError::Ledger {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl Ledger for JsonlLedger {
    fn load(&self) -> Result<HashSet<String>, ArchiverError> {
        Ok(self
            .replay()?
            .into_iter()
            .map(|record| record.account_id)
            .collect())
    }

    fn append(&mut self, record: &ProfileRecord) -> Result<(), ArchiverError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let mut line = String::new();
        // A previous crash may have left a partial line; start on a fresh one
        if Self::has_unterminated_tail(&mut file).map_err(|e| self.io_error(e))? {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(record)?);
        line.push('\n');

        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(
            "Ledger append: {} @{}",
            record.account_id,
            record.screen_name
        );
        Ok(())
    }

    fn replay_latest(&self) -> Result<LatestRecords, ArchiverError> {
        let mut latest = LatestRecords::new();
        for record in self.replay()? {
            latest.insert(record);
        }
        Ok(latest)
    }
}
