//! Provider-qualified media references and URL parsing.
//!
//! Only the reference is extracted here. Titles and thumbnails come from the
//! external metadata resolver and are handed to the engine already resolved.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Accepted YouTube URL shapes. Capture group 5 is the 11-character video id.
static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/(watch\?v=|embed/|v/|.+\?v=)?([a-zA-Z0-9_-]{11})$",
    )
    .expect("static regex is valid")
});

/// Maximum accepted URL length.
pub const MAX_URL_LEN: usize = 2048;

/// Media providers the queue can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Youtube,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(Provider::Youtube),
            other => Err(CoreError::Validation(format!("Unknown provider '{other}'"))),
        }
    }
}

/// Identity of a piece of media: which provider, and that provider's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub provider: Provider,
    pub external_id: String,
}

impl SourceRef {
    pub fn youtube(external_id: impl Into<String>) -> Self {
        Self {
            provider: Provider::Youtube,
            external_id: external_id.into(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.external_id)
    }
}

/// Parse a raw media URL into a [`SourceRef`].
pub fn parse_media_url(url: &str) -> Result<SourceRef, CoreError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CoreError::Validation("Media URL is required".into()));
    }
    if url.len() > MAX_URL_LEN {
        return Err(CoreError::Validation(format!(
            "Media URL must be at most {MAX_URL_LEN} characters"
        )));
    }

    YOUTUBE_URL
        .captures(url)
        .and_then(|caps| caps.get(5))
        .map(|id| SourceRef::youtube(id.as_str()))
        .ok_or_else(|| CoreError::Validation("Invalid YouTube URL".into()))
}
