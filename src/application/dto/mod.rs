// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are UI-friendly representations
// - DTOs are simple, serializable structs
// - Conversion FROM domain types, except filters which are parsed TO them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DomainResult, HomepageLayout, LanguageFilter, RankCollisions, SafetyWarning, StatusFilter,
    StoryFilter, StoryWarning, VisibilityFilter, WarningSeverity,
};
use crate::services::{
    CuratedStory, CurationSnapshot, MutationOutcome, MutationReceipt, RankConflict,
};

// ============================================================================
// STORY DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDto {
    pub id: String,
    pub title: String,
    pub language: String,
    pub language_label: String,
    pub is_published: bool,
    pub is_banner: bool,
    pub is_new_launch: bool,
    pub homepage_rank: Option<u32>,
    pub new_launch_rank: Option<u32>,
    pub banner_image_url: Option<String>,
    pub tile_image_url: Option<String>,
    pub episode_count: u32,
    pub created_at: String,
    pub content_state: String,
    /// Tooltip text for the state badge
    pub content_state_description: String,
    pub warnings: Vec<String>,
    /// Fields with a write in flight; the UI disables their controls
    pub busy_fields: Vec<String>,
}

impl From<CuratedStory> for StoryDto {
    fn from(curated: CuratedStory) -> Self {
        let story = curated.story;
        Self {
            id: story.id.to_string(),
            title: story.title,
            language: story.language.tag().to_string(),
            language_label: story.language.label().to_string(),
            is_published: story.is_published,
            is_banner: story.is_banner,
            is_new_launch: story.is_new_launch,
            homepage_rank: story.homepage_rank,
            new_launch_rank: story.new_launch_rank,
            banner_image_url: story.banner_image_url,
            tile_image_url: story.tile_image_url,
            episode_count: story.episode_count,
            created_at: story.created_at.to_rfc3339(),
            content_state: curated.content_state.label().to_string(),
            content_state_description: curated.content_state.description().to_string(),
            warnings: curated.warnings.iter().map(|w| warning_text(*w).to_string()).collect(),
            busy_fields: curated.busy_fields.iter().map(|f| f.as_str().to_string()).collect(),
        }
    }
}

fn warning_text(warning: StoryWarning) -> &'static str {
    match warning {
        StoryWarning::BannerMissingImage => "Banner story is missing a banner image",
        StoryWarning::NewLaunchMissingTile => "New launch is missing a tile image",
        StoryWarning::PublishedWithoutEpisodes => "Published without episodes",
        StoryWarning::DeadHomepageConfig => "Unpublished but still configured for the homepage",
    }
}

/// Query-string style filter as sent by the list view.
/// Missing fields mean "all".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterDto {
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub language: Option<String>,
}

impl FilterDto {
    pub fn to_filter(&self) -> DomainResult<StoryFilter> {
        Ok(StoryFilter {
            status: match &self.status {
                Some(tag) => tag.parse()?,
                None => StatusFilter::All,
            },
            visibility: match &self.visibility {
                Some(tag) => tag.parse()?,
                None => VisibilityFilter::All,
            },
            language: match &self.language {
                Some(tag) => tag.parse()?,
                None => LanguageFilter::All,
            },
        })
    }
}

// ============================================================================
// HOMEPAGE DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomepageEntryDto {
    pub id: String,
    pub title: String,
    pub rank: Option<u32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomepageDto {
    pub banner: Vec<HomepageEntryDto>,
    pub ranked: Vec<HomepageEntryDto>,
    pub new_launches: Vec<HomepageEntryDto>,
}

impl From<HomepageLayout> for HomepageDto {
    fn from(layout: HomepageLayout) -> Self {
        Self {
            banner: layout
                .banner
                .into_iter()
                .map(|s| entry(s.id, s.title, None, s.banner_image_url))
                .collect(),
            ranked: layout
                .ranked
                .into_iter()
                .map(|s| entry(s.id, s.title, s.homepage_rank, s.cover_image_url))
                .collect(),
            new_launches: layout
                .new_launches
                .into_iter()
                .map(|s| entry(s.id, s.title, s.new_launch_rank, s.tile_image_url))
                .collect(),
        }
    }
}

fn entry(id: Uuid, title: String, rank: Option<u32>, image_url: Option<String>) -> HomepageEntryDto {
    HomepageEntryDto {
        id: id.to_string(),
        title,
        rank,
        image_url,
    }
}

// ============================================================================
// REPORT DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionDto {
    pub rank: u32,
    pub titles: Vec<String>,
}

pub fn collisions_to_dto(collisions: RankCollisions) -> Vec<CollisionDto> {
    collisions
        .into_iter()
        .map(|(rank, titles)| CollisionDto { rank, titles })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyWarningDto {
    pub severity: String,
    pub message: String,
    pub count: usize,
}

impl From<SafetyWarning> for SafetyWarningDto {
    fn from(warning: SafetyWarning) -> Self {
        let severity = match warning.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };

        Self {
            severity: severity.to_string(),
            message: warning.message,
            count: warning.count,
        }
    }
}

/// Read-only summary printed by the report binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationReportDto {
    pub story_count: usize,
    /// Stories per lifecycle state label
    pub state_counts: BTreeMap<String, usize>,
    pub homepage: HomepageDto,
    pub collisions: Vec<CollisionDto>,
    pub safety_warnings: Vec<SafetyWarningDto>,
}

impl From<CurationSnapshot> for CurationReportDto {
    fn from(snapshot: CurationSnapshot) -> Self {
        let mut state_counts = BTreeMap::new();
        for curated in &snapshot.stories {
            *state_counts
                .entry(curated.content_state.label().to_string())
                .or_insert(0) += 1;
        }

        Self {
            story_count: snapshot.stories.len(),
            state_counts,
            homepage: snapshot.homepage.into(),
            collisions: collisions_to_dto(snapshot.collisions),
            safety_warnings: snapshot
                .safety_warnings
                .into_iter()
                .map(SafetyWarningDto::from)
                .collect(),
        }
    }
}

// ============================================================================
// MUTATION DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConflictDto {
    pub proposal_id: String,
    pub story_id: String,
    pub slot: String,
    pub rank: u32,
    pub conflicting_titles: Vec<String>,
    pub prompt: String,
}

impl From<RankConflict> for RankConflictDto {
    fn from(conflict: RankConflict) -> Self {
        Self {
            prompt: conflict.prompt(),
            proposal_id: conflict.proposal_id.to_string(),
            story_id: conflict.story_id.to_string(),
            slot: conflict.slot.label().to_string(),
            rank: conflict.rank,
            conflicting_titles: conflict.conflicting_titles,
        }
    }
}

/// Result of a write command: either a success notice, or a question
/// the editor must answer before anything is written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResultDto {
    pub committed: bool,
    pub message: Option<String>,
    pub confirmation: Option<RankConflictDto>,
}

impl From<MutationReceipt> for MutationResultDto {
    fn from(receipt: MutationReceipt) -> Self {
        Self {
            committed: true,
            message: Some(receipt.message),
            confirmation: None,
        }
    }
}

impl From<MutationOutcome> for MutationResultDto {
    fn from(outcome: MutationOutcome) -> Self {
        match outcome {
            MutationOutcome::Committed(receipt) => receipt.into(),
            MutationOutcome::AwaitingConfirmation(conflict) => Self {
                committed: false,
                message: None,
                confirmation: Some(conflict.into()),
            },
        }
    }
}
