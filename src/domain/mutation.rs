// src/domain/mutation.rs
//
// Field-level mutations of a Story.
//
// Every mutation touches exactly one StoryField. The coordinator snapshots
// that single field before applying, so a rollback never overwrites anything
// else.

use serde::{Deserialize, Serialize};

use crate::domain::story::{Story, StoryPatch};
use crate::domain::DomainError;

/// Story fields the curation engine is allowed to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryField {
    Published,
    Banner,
    NewLaunch,
    HomepageRank,
    NewLaunchRank,
    BannerImage,
    TileImage,
}

/// Which ordering a rank belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankSlot {
    Homepage,
    NewLaunch,
}

/// Which image an upload fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Banner,
    Tile,
}

/// A single field-level change requested by an editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    PublishToggle { enabled: bool },
    BannerToggle { enabled: bool },
    NewLaunchToggle { enabled: bool },
    RankAssign { slot: RankSlot, rank: Option<u32> },
    ImageAssign { slot: ImageSlot, url: Option<String> },
}

/// Value of one StoryField
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Flag(bool),
    Rank(Option<u32>),
    Url(Option<String>),
}

/// Prior value of the single field a mutation touched.
/// Only `Mutation::snapshot` builds one, so the value always fits the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    field: StoryField,
    value: FieldValue,
}

impl StoryField {
    pub fn read(&self, story: &Story) -> FieldValue {
        match self {
            StoryField::Published => FieldValue::Flag(story.is_published),
            StoryField::Banner => FieldValue::Flag(story.is_banner),
            StoryField::NewLaunch => FieldValue::Flag(story.is_new_launch),
            StoryField::HomepageRank => FieldValue::Rank(story.homepage_rank),
            StoryField::NewLaunchRank => FieldValue::Rank(story.new_launch_rank),
            StoryField::BannerImage => FieldValue::Url(story.banner_image_url.clone()),
            StoryField::TileImage => FieldValue::Url(story.tile_image_url.clone()),
        }
    }

    /// Build the one-field patch the store receives.
    /// Callers pair a field with its own `read` value or `Mutation::value`.
    fn patch(&self, value: &FieldValue) -> StoryPatch {
        let mut patch = StoryPatch::default();
        match (self, value) {
            (StoryField::Published, FieldValue::Flag(v)) => patch.is_published = Some(*v),
            (StoryField::Banner, FieldValue::Flag(v)) => patch.is_banner = Some(*v),
            (StoryField::NewLaunch, FieldValue::Flag(v)) => patch.is_new_launch = Some(*v),
            (StoryField::HomepageRank, FieldValue::Rank(v)) => patch.homepage_rank = Some(*v),
            (StoryField::NewLaunchRank, FieldValue::Rank(v)) => patch.new_launch_rank = Some(*v),
            (StoryField::BannerImage, FieldValue::Url(v)) => patch.banner_image_url = Some(v.clone()),
            (StoryField::TileImage, FieldValue::Url(v)) => patch.tile_image_url = Some(v.clone()),
            (field, value) => {
                log::error!("Value {:?} does not fit field {}", value, field);
            }
        }
        patch
    }

    fn write(&self, story: &mut Story, value: &FieldValue) {
        story.apply_patch(&self.patch(value));
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryField::Published => "is_published",
            StoryField::Banner => "is_banner",
            StoryField::NewLaunch => "is_new_launch",
            StoryField::HomepageRank => "homepage_rank",
            StoryField::NewLaunchRank => "new_launch_rank",
            StoryField::BannerImage => "banner_image_url",
            StoryField::TileImage => "tile_image_url",
        }
    }
}

impl std::fmt::Display for StoryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl RankSlot {
    pub fn field(&self) -> StoryField {
        match self {
            RankSlot::Homepage => StoryField::HomepageRank,
            RankSlot::NewLaunch => StoryField::NewLaunchRank,
        }
    }

    pub fn set_rank(&self, story: &mut Story, rank: Option<u32>) {
        match self {
            RankSlot::Homepage => story.homepage_rank = rank,
            RankSlot::NewLaunch => story.new_launch_rank = rank,
        }
    }

    pub fn rank_of(&self, story: &Story) -> Option<u32> {
        match self {
            RankSlot::Homepage => story.homepage_rank,
            RankSlot::NewLaunch => story.new_launch_rank,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankSlot::Homepage => "Homepage",
            RankSlot::NewLaunch => "New launch",
        }
    }
}

impl ImageSlot {
    pub fn field(&self) -> StoryField {
        match self {
            ImageSlot::Banner => StoryField::BannerImage,
            ImageSlot::Tile => StoryField::TileImage,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageSlot::Banner => "Banner",
            ImageSlot::Tile => "Tile",
        }
    }
}

impl std::str::FromStr for RankSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "homepage" => Ok(RankSlot::Homepage),
            "new_launch" | "newLaunch" => Ok(RankSlot::NewLaunch),
            other => Err(DomainError::InvalidSlot(format!("unknown rank slot '{}'", other))),
        }
    }
}

impl std::str::FromStr for ImageSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "banner" => Ok(ImageSlot::Banner),
            "tile" => Ok(ImageSlot::Tile),
            other => Err(DomainError::InvalidSlot(format!("unknown image slot '{}'", other))),
        }
    }
}

impl Mutation {
    /// The single field this mutation changes
    pub fn field(&self) -> StoryField {
        match self {
            Mutation::PublishToggle { .. } => StoryField::Published,
            Mutation::BannerToggle { .. } => StoryField::Banner,
            Mutation::NewLaunchToggle { .. } => StoryField::NewLaunch,
            Mutation::RankAssign { slot, .. } => slot.field(),
            Mutation::ImageAssign { slot, .. } => slot.field(),
        }
    }

    /// The value the field takes once applied. Blank URLs clear the image.
    pub fn value(&self) -> FieldValue {
        match self {
            Mutation::PublishToggle { enabled }
            | Mutation::BannerToggle { enabled }
            | Mutation::NewLaunchToggle { enabled } => FieldValue::Flag(*enabled),
            Mutation::RankAssign { rank, .. } => FieldValue::Rank(*rank),
            Mutation::ImageAssign { url, .. } => FieldValue::Url(
                url.as_ref()
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty()),
            ),
        }
    }

    /// Capture the prior value of the touched field
    pub fn snapshot(&self, story: &Story) -> FieldSnapshot {
        let field = self.field();
        FieldSnapshot {
            field,
            value: field.read(story),
        }
    }

    pub fn apply(&self, story: &mut Story) {
        self.field().write(story, &self.value());
    }

    pub fn to_patch(&self) -> StoryPatch {
        self.field().patch(&self.value())
    }

    /// Notification text shown once the store confirms the write
    pub fn success_message(&self) -> String {
        match self {
            Mutation::PublishToggle { enabled: true } => "Story published".to_string(),
            Mutation::PublishToggle { enabled: false } => {
                "Story archived (unpublished)".to_string()
            }
            Mutation::BannerToggle { enabled: true } => "Story added to banner".to_string(),
            Mutation::BannerToggle { enabled: false } => "Story removed from banner".to_string(),
            Mutation::NewLaunchToggle { enabled: true } => {
                "Story added to new launches".to_string()
            }
            Mutation::NewLaunchToggle { enabled: false } => {
                "Story removed from new launches".to_string()
            }
            Mutation::RankAssign { slot, rank } => format!(
                "{} rank updated to {}",
                slot.label(),
                rank.map(|r| r.to_string())
                    .unwrap_or_else(|| "unranked".to_string())
            ),
            Mutation::ImageAssign { slot, .. } => format!("{} image uploaded", slot.label()),
        }
    }
}

impl FieldSnapshot {
    pub fn field(&self) -> StoryField {
        self.field
    }

    /// Put the captured value back, leaving every other field as it is now
    pub fn restore(&self, story: &mut Story) {
        self.field.write(story, &self.value);
    }
}
