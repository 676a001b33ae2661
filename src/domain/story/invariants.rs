use serde::{Deserialize, Serialize};

use super::entity::Story;
use crate::domain::{DomainError, DomainResult};

/// Soft invariant violated by a single story.
///
/// These never block an operation; they are surfaced to editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryWarning {
    /// Flagged for the banner carousel but has no banner image
    BannerMissingImage,
    /// Flagged as a new launch but has no tile image
    NewLaunchMissingTile,
    /// Published with zero episodes
    PublishedWithoutEpisodes,
    /// Unpublished but still carries rank/banner/new-launch configuration
    DeadHomepageConfig,
}

/// Validates the hard invariants of a Story
pub fn validate_story(story: &Story) -> DomainResult<()> {
    if story.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Story title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Collect the soft invariant violations of one story
pub fn story_warnings(story: &Story) -> Vec<StoryWarning> {
    let mut warnings = Vec::new();

    if story.is_banner && !story.has_banner_image() {
        warnings.push(StoryWarning::BannerMissingImage);
    }
    if story.is_new_launch && !story.has_tile_image() {
        warnings.push(StoryWarning::NewLaunchMissingTile);
    }
    if story.is_published && story.episode_count == 0 {
        warnings.push(StoryWarning::PublishedWithoutEpisodes);
    }
    if !story.is_published && story.has_homepage_config() {
        warnings.push(StoryWarning::DeadHomepageConfig);
    }

    warnings
}

/// Parse a rank typed by an editor.
///
/// Empty input means "unranked". Negative or non-numeric input is rejected.
pub fn parse_rank_input(input: &str) -> DomainResult<Option<u32>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<i64>() {
        Ok(value) if value < 0 => Err(DomainError::InvalidRank(format!(
            "Rank cannot be negative: {}",
            value
        ))),
        Ok(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| DomainError::InvalidRank(format!("Rank is too large: {}", value))),
        Err(_) => Err(DomainError::InvalidRank(format!(
            "Rank must be a whole number, got {:?}",
            trimmed
        ))),
    }
}

/// Soft invariants of the Story domain:
///
/// 1. A banner story should have a banner image
/// 2. A new-launch story should have a tile image
/// 3. Homepage ranks should be unique (checked across the set, see collision)
/// 4. Placement on an unpublished story is dead configuration
///
/// Hard invariants:
///
/// 1. Title cannot be empty
/// 2. Ranks are non-negative whole numbers
