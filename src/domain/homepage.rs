// src/domain/homepage.rs
//
// Read-only projection of the working set into the three homepage sections.

use serde::{Deserialize, Serialize};

use crate::domain::story::Story;

/// Maximum number of stories per homepage section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomepageLimits {
    pub banner: usize,
    pub ranked: usize,
    pub new_launches: usize,
}

impl Default for HomepageLimits {
    fn default() -> Self {
        Self {
            banner: 5,
            ranked: 6,
            new_launches: 8,
        }
    }
}

/// The homepage as users will see it. Sections may overlap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomepageLayout {
    pub banner: Vec<Story>,
    pub ranked: Vec<Story>,
    pub new_launches: Vec<Story>,
}

pub fn assemble(stories: &[Story]) -> HomepageLayout {
    assemble_with_limits(stories, HomepageLimits::default())
}

pub fn assemble_with_limits(stories: &[Story], limits: HomepageLimits) -> HomepageLayout {
    // Input order
    let banner = stories
        .iter()
        .filter(|s| s.is_published && s.is_banner && has_url(&s.banner_image_url))
        .take(limits.banner)
        .cloned()
        .collect();

    let mut ranked: Vec<Story> = stories
        .iter()
        .filter(|s| s.is_published && s.homepage_rank.is_some())
        .cloned()
        .collect();
    // sort_by_key is stable: equal ranks keep input order
    ranked.sort_by_key(|s| s.homepage_rank);
    ranked.truncate(limits.ranked);

    let mut new_launches: Vec<Story> = stories
        .iter()
        .filter(|s| s.is_published && s.is_new_launch && has_url(&s.tile_image_url))
        .cloned()
        .collect();
    // Known quirk: a missing new-launch rank sorts as 0, ahead of rank 1
    new_launches.sort_by_key(|s| s.new_launch_rank.unwrap_or(0));
    new_launches.truncate(limits.new_launches);

    HomepageLayout {
        banner,
        ranked,
        new_launches,
    }
}

/// Any non-empty URL counts here, whitespace included. The safety report is
/// the stricter check.
fn has_url(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
