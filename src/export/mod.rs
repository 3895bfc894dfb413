//! Export module for generating Cosense pages
//!
//! This module handles:
//! - Replaying the ledger down to the latest record per account
//! - Repairing stored image URLs
//! - Writing the Cosense import JSON

mod cosense;

pub use cosense::{
    build_export, build_page, render_export, write_export, CosenseExport, CosensePage,
};

use crate::config::ExportConfig;
use crate::ledger::Ledger;
use crate::ArchiverError;
use std::path::Path;

/// Exports the ledger to `output_path`
///
/// Running this twice on an unchanged ledger produces byte-identical output.
///
/// # Returns
///
/// * `Ok(usize)` - Number of pages written
/// * `Err(ArchiverError)` - The ledger could not be read or the output written
pub fn export_cosense(
    ledger: &dyn Ledger,
    config: &ExportConfig,
    output_path: &Path,
) -> Result<usize, ArchiverError> {
    let latest = ledger.replay_latest()?;
    tracing::info!("Exporting {} account(s) from ledger", latest.len());

    let export = build_export(&latest, &config.tag_line);
    write_export(&export, output_path)?;

    tracing::info!(
        "Wrote {} Cosense page(s) to {}",
        export.pages.len(),
        output_path.display()
    );
    Ok(export.pages.len())
}
