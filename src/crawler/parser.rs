//! Profile page parser
//!
//! This module extracts profile fields from a mirror's profile page:
//! - Screen name, display name, bio, location, join date
//! - Avatar and banner image URLs, canonicalized for deduplication

use crate::ledger::ProfileRecord;
use crate::url::canonical_image_url;
use crate::ArchiverError;
use chrono::{DateTime, FixedOffset};
use scraper::{ElementRef, Html, Selector};

const SCREEN_NAME_SELECTORS: &[&str] = &["a.profile-card-username", "a.username"];
const NAME_SELECTORS: &[&str] = &["a.profile-card-fullname"];
const BIO_SELECTORS: &[&str] = &["div.profile-bio"];
const LOCATION_SELECTORS: &[&str] = &["div.profile-location span:last-child"];
const JOINED_SELECTORS: &[&str] = &["div.profile-joindate"];
const AVATAR_SELECTORS: &[&str] = &[
    "a.profile-card-avatar img",
    "img.profile-avatar",
    "img.avatar",
    "img.rounded",
];
const BANNER_SELECTORS: &[&str] = &["div.profile-banner img"];

/// Profile fields extracted from one page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProfile {
    pub screen_name: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub joined: Option<String>,

    /// Canonical avatar URL on the image host
    pub profile_image_url: Option<String>,

    /// Canonical banner URL on the image host
    pub banner_image_url: Option<String>,

    /// Avatar URL as it appears on the mirror, made absolute
    pub profile_image_mirror_url: Option<String>,

    /// Banner URL as it appears on the mirror, made absolute
    pub banner_image_mirror_url: Option<String>,
}

impl ParsedProfile {
    /// Completes the parsed fields into a ledger record
    pub fn into_record(
        self,
        account_id: &str,
        fetched_from: &str,
        fetched_at: DateTime<FixedOffset>,
    ) -> ProfileRecord {
        ProfileRecord {
            account_id: account_id.to_string(),
            screen_name: self.screen_name,
            name: self.name,
            bio: self.bio,
            location: self.location,
            joined: self.joined,
            profile_image_url: self.profile_image_url,
            banner_image_url: self.banner_image_url,
            profile_image_mirror_url: self.profile_image_mirror_url,
            banner_image_mirror_url: self.banner_image_mirror_url,
            fetched_at,
            fetched_from: fetched_from.to_string(),
        }
    }
}

/// Cheap check that a body is a profile page rather than an error or
/// anti-bot interstitial
pub fn looks_like_profile_page(body: &str) -> bool {
    body.contains("profile-card")
}

/// Parses a profile page
///
/// # Arguments
///
/// * `html` - The page content
/// * `base_url` - Mirror base URL, used to resolve relative image paths
/// * `account_id` - Account being parsed (for error reporting)
///
/// # Returns
///
/// * `Ok(ParsedProfile)` - Parsed fields; bio, location, and join date may be absent
/// * `Err(ArchiverError::Parse)` - The page has no screen name
///
/// # Example
///
/// ```
/// use followings_archiver::crawler::parse_profile;
///
/// let html = r#"<div class="profile-card"><a class="profile-card-username">@alice</a></div>"#;
/// let parsed = parse_profile(html, "https://mirror.example", "1").unwrap();
/// assert_eq!(parsed.screen_name, "alice");
/// ```
pub fn parse_profile(
    html: &str,
    base_url: &str,
    account_id: &str,
) -> Result<ParsedProfile, ArchiverError> {
    let document = Html::parse_document(html);

    let screen_name = select_text(&document, SCREEN_NAME_SELECTORS)
        .map(|s| s.trim_start_matches('@').trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ArchiverError::Parse {
            account_id: account_id.to_string(),
            message: "no screen name on page".to_string(),
        })?;

    let profile_image_mirror_url =
        select_attr(&document, AVATAR_SELECTORS, "src").map(|src| resolve_src(&src, base_url));
    let banner_image_mirror_url =
        select_attr(&document, BANNER_SELECTORS, "src").map(|src| resolve_src(&src, base_url));

    Ok(ParsedProfile {
        screen_name,
        name: select_text(&document, NAME_SELECTORS),
        bio: select_text(&document, BIO_SELECTORS),
        location: select_text(&document, LOCATION_SELECTORS),
        joined: select_text(&document, JOINED_SELECTORS),
        profile_image_url: profile_image_mirror_url
            .as_deref()
            .and_then(canonical_image_url),
        banner_image_url: banner_image_mirror_url
            .as_deref()
            .and_then(canonical_image_url),
        profile_image_mirror_url,
        banner_image_mirror_url,
    })
}

/// Returns the first element matching any of `selectors`, in selector order
fn select_first<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        document.select(&selector).next()
    })
}

/// Trimmed text of the first matching element; empty text counts as absent
fn select_text(document: &Html, selectors: &[&str]) -> Option<String> {
    select_first(document, selectors)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Attribute of the first matching element that carries it
fn select_attr(document: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        document
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Makes an image `src` absolute against the mirror base URL
fn resolve_src(src: &str, base_url: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_string()
    } else if let Some(rest) = src.strip_prefix("//") {
        format!("https://{}", rest)
    } else if src.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), src)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), src)
    }
}
