use super::{
    strip_host_prefixes, strip_query, CANONICAL_AVATAR_SUFFIX, CANONICAL_BANNER_SIZE, IMAGE_HOST,
};
use ::url::Url;

/// Size suffixes the image host appends to profile image file stems
const AVATAR_SIZE_SUFFIXES: &[&str] = &[
    "_normal",
    "_bigger",
    "_mini",
    "_reasonably_small",
    "_x96",
    "_200x200",
    "_400x400",
];

/// Converts a mirror-proxied or direct image URL into its canonical image-host form
///
/// # Canonicalization Steps
///
/// 1. Take the part after `/pic/` for mirror-proxied URLs and percent-decode it
/// 2. Drop query string and fragment
/// 3. Drop any chain of schemes and image-host prefixes
/// 4. Rewrite size variants to the large form (`_400x400` avatars, `1500x500` banners)
/// 5. Prefix `https://pbs.twimg.com/`
///
/// Two crawls of an unchanged image always produce the same string, and the
/// function is idempotent on its own output.
///
/// # Returns
///
/// * `Some(String)` - The canonical URL
/// * `None` - The input is empty or does not reference the image host
///
/// # Examples
///
/// ```
/// use followings_archiver::url::canonical_image_url;
///
/// let url = canonical_image_url(
///     "https://nitter.example/pic/pbs.twimg.com%2Fprofile_images%2F1%2Fabc_normal.jpg",
/// );
/// assert_eq!(
///     url.as_deref(),
///     Some("https://pbs.twimg.com/profile_images/1/abc_400x400.jpg")
/// );
/// ```
pub fn canonical_image_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let decoded = if let Some((_, proxied)) = raw.split_once("/pic/") {
        urlencoding::decode(proxied)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| proxied.to_string())
    } else if raw.contains(IMAGE_HOST) {
        raw.to_string()
    } else {
        return None;
    };

    let path = strip_host_prefixes(strip_query(&decoded));
    let path = path.strip_prefix("orig/").unwrap_or(path);
    if path.is_empty() {
        return None;
    }

    let path = if path.starts_with("profile_images/") {
        canonical_avatar_path(path)
    } else if path.starts_with("profile_banners/") {
        canonical_banner_path(path)
    } else {
        path.to_string()
    };

    Some(format!("https://{}/{}", IMAGE_HOST, path))
}

/// Rewrites the size suffix of a profile image file stem
fn canonical_avatar_path(path: &str) -> String {
    let (dir, file) = match path.rsplit_once('/') {
        Some(parts) => parts,
        None => return path.to_string(),
    };
    let (stem, ext) = match file.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (file, None),
    };

    let base = AVATAR_SIZE_SUFFIXES
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .map(|base| format!("{}{}", base, CANONICAL_AVATAR_SUFFIX));

    match (base, ext) {
        (Some(stem), Some(ext)) => format!("{}/{}.{}", dir, stem, ext),
        (Some(stem), None) => format!("{}/{}", dir, stem),
        (None, _) => path.to_string(),
    }
}

/// Rewrites the trailing size segment of a banner path
///
/// Banner paths look like `profile_banners/<user>/<version>[/<size>]`.
fn canonical_banner_path(path: &str) -> String {
    let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    match segments.len() {
        3 => format!("{}/{}", segments.join("/"), CANONICAL_BANNER_SIZE),
        n if n >= 4 => format!("{}/{}", segments[..3].join("/"), CANONICAL_BANNER_SIZE),
        _ => path.to_string(),
    }
}

/// Returns the file name used when archiving an image URL
///
/// The name is the last path segment; `.jpg` is appended when it carries no
/// extension (banner URLs end in a bare size segment such as `1500x500`).
pub fn image_filename(image_url: &str) -> Option<String> {
    let parsed = Url::parse(image_url).ok()?;
    let name = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;

    if name.contains('.') {
        Some(name.to_string())
    } else {
        Some(format!("{}.jpg", name))
    }
}
