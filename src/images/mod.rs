//! Image archive for profile and banner pictures
//!
//! Images are deduplicated by canonical URL: a new file is only downloaded
//! when the URL differs from the last one stored for the same account and kind.

mod archiver;
mod repair;

pub use archiver::{ArchiveOutcome, ImageArchiver, ImageAsset};
pub use repair::repair_extensions;

use std::fmt;

/// Which profile picture an asset is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Profile,
    Banner,
}

impl ImageKind {
    /// Directory and alias name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Banner => "banner",
        }
    }

    pub fn all() -> [Self; 2] {
        [Self::Profile, Self::Banner]
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
