// src/domain/collision.rs
//
// Rank collision detection. Duplicates are reported, never prevented.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::mutation::RankSlot;
use crate::domain::story::Story;

/// Ranks held by two or more stories, mapped to the titles holding them.
/// Titles keep the scan order of the input.
pub type RankCollisions = BTreeMap<u32, Vec<String>>;

/// Scan the homepage ranks of `stories` for duplicates
pub fn detect_collisions(stories: &[Story]) -> RankCollisions {
    detect_slot_collisions(stories, RankSlot::Homepage)
}

/// Same as `detect_collisions`, for any rank slot
pub fn detect_slot_collisions(stories: &[Story], slot: RankSlot) -> RankCollisions {
    let mut by_rank: RankCollisions = BTreeMap::new();

    for story in stories {
        if let Some(rank) = slot.rank_of(story) {
            by_rank.entry(rank).or_default().push(story.title.clone());
        }
    }

    by_rank.retain(|_, titles| titles.len() >= 2);
    by_rank
}

/// Titles of the stories other than `exclude` already holding `rank` in `slot`
pub fn conflicting_titles(
    stories: &[Story],
    slot: RankSlot,
    rank: u32,
    exclude: Uuid,
) -> Vec<String> {
    stories
        .iter()
        .filter(|s| s.id != exclude && slot.rank_of(s) == Some(rank))
        .map(|s| s.title.clone())
        .collect()
}

/// "A, B and 3 more" - at most two names plus a remainder count
pub fn summarize_titles(titles: &[String]) -> String {
    let shown = titles
        .iter()
        .take(2)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    if titles.len() > 2 {
        format!("{} and {} more", shown, titles.len() - 2)
    } else {
        shown
    }
}
