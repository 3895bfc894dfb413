//! Image URL handling for Followings-Archiver
//!
//! Mirrors proxy profile images through their own `/pic/` endpoint. This module
//! maps those proxied URLs back to the image host, rewrites size variants to a
//! single canonical form, and repairs the malformed URLs found in older ledgers.

mod canonical;
mod repair;

// Re-export main functions
pub use canonical::{canonical_image_url, image_filename};
pub use repair::repair_image_url;

/// Host serving profile and banner images
pub const IMAGE_HOST: &str = "pbs.twimg.com";

/// Size suffix used for canonical profile images
pub const CANONICAL_AVATAR_SUFFIX: &str = "_400x400";

/// Size segment used for canonical banner images
pub const CANONICAL_BANNER_SIZE: &str = "1500x500";

/// Strips any chain of URL schemes and image-host prefixes from the front of `path`
///
/// Repeated prefixes such as `https://pbs.twimg.com/https://pbs.twimg.com/` are
/// collapsed until only the host-relative path remains.
pub(crate) fn strip_host_prefixes(mut path: &str) -> &str {
    let host_prefix = format!("{}/", IMAGE_HOST);

    loop {
        let before = path.len();

        for scheme in ["https://", "http://"] {
            if let Some(rest) = path.strip_prefix(scheme) {
                path = rest;
            }
        }
        if let Some(rest) = path.strip_prefix(host_prefix.as_str()) {
            path = rest;
        }
        path = path.trim_start_matches('/');

        if path.len() == before {
            return path;
        }
    }
}

/// Removes query string and fragment from a URL or path
pub(crate) fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
