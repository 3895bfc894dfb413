use super::{strip_host_prefixes, strip_query, IMAGE_HOST};

/// Repairs a stored image URL before it is exported
///
/// Older ledgers contain URLs with a duplicated image-host prefix
/// (`https://pbs.twimg.com/https://pbs.twimg.com/...`), a bare host without
/// scheme, or a trailing query string. The repaired form keeps the path as-is
/// (sizes are not rewritten) and the function is a no-op on clean input.
///
/// URLs that do not reference the image host only lose their query string.
///
/// # Examples
///
/// ```
/// use followings_archiver::url::repair_image_url;
///
/// assert_eq!(
///     repair_image_url("https://pbs.twimg.com/https://pbs.twimg.com/profile_images/1/a.jpg"),
///     "https://pbs.twimg.com/profile_images/1/a.jpg"
/// );
/// ```
pub fn repair_image_url(url: &str) -> String {
    let url = strip_query(url.trim());
    if url.is_empty() {
        return String::new();
    }

    let host_prefix = format!("{}/", IMAGE_HOST);
    let references_host = url.starts_with(&host_prefix)
        || url.starts_with(&format!("https://{}", host_prefix))
        || url.starts_with(&format!("http://{}", host_prefix));

    if !references_host {
        return url.to_string();
    }

    format!("https://{}/{}", IMAGE_HOST, strip_host_prefixes(url))
}
