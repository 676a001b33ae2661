// src/domain/safety.rs
//
// Working-set wide report of soft invariant violations.

use serde::{Deserialize, Serialize};

use crate::domain::collision::{detect_collisions, summarize_titles};
use crate::domain::story::{story_warnings, Story, StoryWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// The story cannot render in the slot it is flagged for
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyWarningKind {
    DuplicateRank { rank: u32 },
    BannerMissingImage,
    NewLaunchMissingTile,
    PublishedWithoutEpisodes,
    DeadHomepageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyWarning {
    pub severity: WarningSeverity,
    pub kind: SafetyWarningKind,
    pub message: String,
    /// Number of stories involved
    pub count: usize,
}

/// Build the safety report: one entry per duplicated rank, then one entry
/// per per-story warning kind that affects at least one story.
pub fn collect_safety_warnings(stories: &[Story]) -> Vec<SafetyWarning> {
    let mut warnings = Vec::new();

    for (rank, titles) in detect_collisions(stories) {
        warnings.push(SafetyWarning {
            severity: WarningSeverity::Warning,
            kind: SafetyWarningKind::DuplicateRank { rank },
            message: format!("Duplicate homepage rank {}: {}", rank, summarize_titles(&titles)),
            count: titles.len(),
        });
    }

    let per_story: Vec<Vec<StoryWarning>> = stories.iter().map(story_warnings).collect();
    let count_of = |wanted: StoryWarning| per_story.iter().filter(|w| w.contains(&wanted)).count();

    let checks = [
        (
            StoryWarning::BannerMissingImage,
            SafetyWarningKind::BannerMissingImage,
            WarningSeverity::Error,
            "banner story/stories missing banner image",
        ),
        (
            StoryWarning::NewLaunchMissingTile,
            SafetyWarningKind::NewLaunchMissingTile,
            WarningSeverity::Error,
            "new launch story/stories missing tile image",
        ),
        (
            StoryWarning::PublishedWithoutEpisodes,
            SafetyWarningKind::PublishedWithoutEpisodes,
            WarningSeverity::Warning,
            "published story/stories have no episodes",
        ),
        (
            StoryWarning::DeadHomepageConfig,
            SafetyWarningKind::DeadHomepageConfig,
            WarningSeverity::Info,
            "unpublished story/stories still have homepage configuration",
        ),
    ];

    for (story_warning, kind, severity, text) in checks {
        let count = count_of(story_warning);
        if count > 0 {
            warnings.push(SafetyWarning {
                severity,
                kind,
                message: format!("{} {}", count, text),
                count,
            });
        }
    }

    warnings
}
