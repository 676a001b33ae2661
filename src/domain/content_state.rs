// src/domain/content_state.rs
//
// Lifecycle state derivation. States are derived, never stored.

use serde::{Deserialize, Serialize};

use crate::domain::story::Story;

/// Lifecycle state of a story as shown to editors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    /// Not published, not visible to users
    Draft,
    /// Published but missing episodes, description or images
    Ready,
    /// Published and complete
    Published,
    /// Published and placed on the homepage
    Featured,
    /// Vocabulary only. `classify` never produces it; no archival flag
    /// exists on `Story`, so it cannot be told apart from `Draft`.
    Archived,
}

/// Classify a story. First matching rule wins:
///
/// 1. unpublished -> Draft
/// 2. any homepage placement -> Featured
/// 3. incomplete (title, cover, description, episodes) -> Ready
/// 4. otherwise -> Published
pub fn classify(story: &Story, episode_count: u32) -> ContentState {
    if !story.is_published {
        return ContentState::Draft;
    }

    if story.has_homepage_config() {
        return ContentState::Featured;
    }

    if !is_complete(story, episode_count) {
        return ContentState::Ready;
    }

    ContentState::Published
}

/// Classify using the episode count carried by the story itself
pub fn classify_story(story: &Story) -> ContentState {
    classify(story, story.episode_count)
}

fn is_complete(story: &Story, episode_count: u32) -> bool {
    !story.title.is_empty()
        && story.cover_image_url.as_deref().is_some_and(|v| !v.is_empty())
        && story.description.as_deref().is_some_and(|v| !v.is_empty())
        && episode_count > 0
}

impl ContentState {
    pub fn label(&self) -> &'static str {
        match self {
            ContentState::Draft => "Draft",
            ContentState::Ready => "Ready",
            ContentState::Published => "Published",
            ContentState::Featured => "Featured",
            ContentState::Archived => "Archived",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ContentState::Draft => "Story is not published and not visible to users",
            ContentState::Ready => {
                "Story is published but may be missing content (episodes, description, or images)"
            }
            ContentState::Published => "Story is published and complete",
            ContentState::Featured => {
                "Story is published and featured on homepage (banner, new launch, or ranked)"
            }
            ContentState::Archived => "Story is archived (unpublished)",
        }
    }
}

impl std::fmt::Display for ContentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::Language;

    fn complete_story() -> Story {
        let mut story = Story::new("T".to_string(), Language::English);
        story.is_published = true;
        story.description = Some("D".to_string());
        story.cover_image_url = Some("U".to_string());
        story
    }

    #[test]
    fn test_unpublished_is_draft_regardless_of_flags() {
        let mut story = complete_story();
        story.is_published = false;
        story.is_banner = true;
        story.is_new_launch = true;
        story.homepage_rank = Some(1);
        assert_eq!(classify(&story, 10), ContentState::Draft);
    }

    #[test]
    fn test_banner_is_featured() {
        let mut story = complete_story();
        story.is_banner = true;
        assert_eq!(classify(&story, 0), ContentState::Featured);
    }

    #[test]
    fn test_rank_or_new_launch_is_featured() {
        let mut ranked = complete_story();
        ranked.homepage_rank = Some(0);
        assert_eq!(classify(&ranked, 3), ContentState::Featured);

        let mut launch = complete_story();
        launch.is_new_launch = true;
        assert_eq!(classify(&launch, 3), ContentState::Featured);
    }

    #[test]
    fn test_complete_story_is_published() {
        assert_eq!(classify(&complete_story(), 3), ContentState::Published);
    }

    #[test]
    fn test_no_episodes_is_ready() {
        assert_eq!(classify(&complete_story(), 0), ContentState::Ready);
    }

    #[test]
    fn test_missing_cover_or_description_is_ready() {
        let mut no_cover = complete_story();
        no_cover.cover_image_url = Some(String::new());
        assert_eq!(classify(&no_cover, 3), ContentState::Ready);

        let mut no_description = complete_story();
        no_description.description = None;
        assert_eq!(classify(&no_description, 3), ContentState::Ready);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let mut story = complete_story();
        for (published, banner, episodes) in [(true, false, 0), (true, true, 2), (false, false, 5)] {
            story.is_published = published;
            story.is_banner = banner;
            assert_eq!(classify(&story, episodes), classify(&story, episodes));
        }
    }

    #[test]
    fn test_classify_story_uses_own_episode_count() {
        let mut story = complete_story();
        story.episode_count = 4;
        assert_eq!(classify_story(&story), ContentState::Published);
    }

    #[test]
    fn test_archived_is_distinct_vocabulary() {
        assert_ne!(ContentState::Archived, ContentState::Draft);
        assert_eq!(ContentState::Archived.label(), "Archived");
    }
}
