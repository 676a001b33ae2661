use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// A published item eligible for homepage placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Internal immutable identifier
    pub id: Uuid,

    pub title: String,

    pub language: Language,

    pub is_published: bool,

    /// Shown in the banner carousel (needs a banner image to render)
    pub is_banner: bool,

    /// Shown in the new-launch grid (needs a tile image to render)
    pub is_new_launch: bool,

    /// Position in the ranked list. Unique by convention only.
    pub homepage_rank: Option<u32>,

    /// Position in the new-launch grid
    pub new_launch_rank: Option<u32>,

    pub banner_image_url: Option<String>,

    pub tile_image_url: Option<String>,

    /// Only used for completeness scoring
    pub description: Option<String>,

    /// Only used for completeness scoring
    pub cover_image_url: Option<String>,

    /// Number of episodes, supplied by the store on every load
    pub episode_count: u32,

    pub created_at: DateTime<Utc>,
}

/// Language tag of a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "ta")]
    Tamil,
}

/// Partial field update sent to the story store.
///
/// `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_banner: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_launch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage_rank: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_launch_rank: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_image_url: Option<Option<String>>,
}

impl Story {
    /// Create a new story: unpublished, no homepage configuration
    pub fn new(title: String, language: Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            language,
            is_published: false,
            is_banner: false,
            is_new_launch: false,
            homepage_rank: None,
            new_launch_rank: None,
            banner_image_url: None,
            tile_image_url: None,
            description: None,
            cover_image_url: None,
            episode_count: 0,
            created_at: Utc::now(),
        }
    }

    /// True when the story carries any homepage placement
    pub fn has_homepage_config(&self) -> bool {
        self.is_banner || self.is_new_launch || self.homepage_rank.is_some()
    }

    pub fn has_banner_image(&self) -> bool {
        has_text(&self.banner_image_url)
    }

    pub fn has_tile_image(&self) -> bool {
        has_text(&self.tile_image_url)
    }

    /// Apply a partial update in place
    pub fn apply_patch(&mut self, patch: &StoryPatch) {
        if let Some(published) = patch.is_published {
            self.is_published = published;
        }
        if let Some(banner) = patch.is_banner {
            self.is_banner = banner;
        }
        if let Some(new_launch) = patch.is_new_launch {
            self.is_new_launch = new_launch;
        }
        if let Some(rank) = patch.homepage_rank {
            self.homepage_rank = rank;
        }
        if let Some(rank) = patch.new_launch_rank {
            self.new_launch_rank = rank;
        }
        if let Some(url) = &patch.banner_image_url {
            self.banner_image_url = url.clone();
        }
        if let Some(url) = &patch.tile_image_url {
            self.tile_image_url = url.clone();
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Tamil];

    /// Stable short tag used by the store and the UI
    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::English),
            "hi" => Ok(Language::Hindi),
            "ta" => Ok(Language::Tamil),
            other => Err(DomainError::InvariantViolation(format!(
                "Unknown language tag: {}",
                other
            ))),
        }
    }
}
