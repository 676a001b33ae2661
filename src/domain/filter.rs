// src/domain/filter.rs
//
// Editor-facing filters over the working set. All predicates are ANDed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::story::{Language, Story};
use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Published,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityFilter {
    #[default]
    All,
    Banner,
    NewLaunch,
    Ranked,
    Unranked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LanguageFilter {
    #[default]
    All,
    Only(Language),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoryFilter {
    pub status: StatusFilter,
    pub visibility: VisibilityFilter,
    pub language: LanguageFilter,
}

impl StoryFilter {
    pub fn matches(&self, story: &Story) -> bool {
        self.status.matches(story) && self.visibility.matches(story) && self.language.matches(story)
    }
}

impl StatusFilter {
    pub fn matches(&self, story: &Story) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Published => story.is_published,
            StatusFilter::Draft => !story.is_published,
        }
    }
}

impl VisibilityFilter {
    pub fn matches(&self, story: &Story) -> bool {
        match self {
            VisibilityFilter::All => true,
            VisibilityFilter::Banner => story.is_banner,
            VisibilityFilter::NewLaunch => story.is_new_launch,
            VisibilityFilter::Ranked => story.homepage_rank.is_some(),
            VisibilityFilter::Unranked => story.homepage_rank.is_none(),
        }
    }
}

impl LanguageFilter {
    pub fn matches(&self, story: &Story) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Only(language) => story.language == *language,
        }
    }
}

/// Return the stories matching every predicate of `filter`, in input order
pub fn filter_stories(stories: &[Story], filter: &StoryFilter) -> Vec<Story> {
    stories.iter().filter(|s| filter.matches(s)).cloned().collect()
}

impl FromStr for StatusFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "published" => Ok(StatusFilter::Published),
            "draft" => Ok(StatusFilter::Draft),
            other => Err(DomainError::InvalidFilter(format!("status: {}", other))),
        }
    }
}

impl FromStr for VisibilityFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(VisibilityFilter::All),
            "banner" => Ok(VisibilityFilter::Banner),
            "newLaunch" | "new_launch" => Ok(VisibilityFilter::NewLaunch),
            "ranked" => Ok(VisibilityFilter::Ranked),
            "unranked" => Ok(VisibilityFilter::Unranked),
            other => Err(DomainError::InvalidFilter(format!("visibility: {}", other))),
        }
    }
}

impl FromStr for LanguageFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(LanguageFilter::All);
        }
        s.parse::<Language>()
            .map(LanguageFilter::Only)
            .map_err(|_| DomainError::InvalidFilter(format!("language: {}", s)))
    }
}
