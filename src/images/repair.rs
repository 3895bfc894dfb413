use crate::images::ImageKind;
use std::path::Path;

/// Appends `.jpg` to history files stored without an extension
///
/// Early archives saved banners as `<timestamp>_1500x500`. Files are renamed
/// in place to `<timestamp>_1500x500.jpg`; names without a `<timestamp>_`
/// prefix are left alone.
///
/// # Returns
///
/// The number of renamed files. A missing archive root renames nothing.
pub fn repair_extensions(root: &Path) -> std::io::Result<usize> {
    if !root.exists() {
        tracing::warn!("Image archive {} does not exist", root.display());
        return Ok(0);
    }

    let mut count = 0;

    for account_dir in std::fs::read_dir(root)? {
        let account_dir = account_dir?.path();
        if !account_dir.is_dir() {
            continue;
        }

        for kind in ImageKind::all() {
            let history = account_dir.join(kind.as_str());
            if !history.is_dir() {
                continue;
            }

            for file in std::fs::read_dir(&history)? {
                let file = file?.path();
                if !file.is_file() {
                    continue;
                }

                let name = match file.file_name().and_then(|n| n.to_str()) {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                let (timestamp, original) = match name.split_once('_') {
                    Some(parts) => parts,
                    None => continue,
                };

                if !original.contains('.') {
                    let renamed = file.with_file_name(format!("{}_{}.jpg", timestamp, original));
                    tracing::info!("[RENAME] {} -> {}", file.display(), renamed.display());
                    std::fs::rename(&file, &renamed)?;
                    count += 1;
                }
            }
        }
    }

    Ok(count)
}
