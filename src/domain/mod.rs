// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// Everything in here is pure: no I/O, no async, no shared state.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod collision;
pub mod content_state;
pub mod filter;
pub mod homepage;
pub mod mutation;
pub mod safety;
pub mod story;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Story
pub use story::{
    parse_rank_input, story_warnings, validate_story, Language, Story, StoryPatch, StoryWarning,
};

// Lifecycle
pub use content_state::{classify, classify_story, ContentState};

// Rank collisions
pub use collision::{
    conflicting_titles, detect_collisions, detect_slot_collisions, summarize_titles,
    RankCollisions,
};

// Homepage
pub use homepage::{assemble, assemble_with_limits, HomepageLayout, HomepageLimits};

// Filters
pub use filter::{filter_stories, LanguageFilter, StatusFilter, StoryFilter, VisibilityFilter};

// Mutations
pub use mutation::{FieldSnapshot, FieldValue, ImageSlot, Mutation, RankSlot, StoryField};

// Safety report
pub use safety::{
    collect_safety_warnings, SafetyWarning, SafetyWarningKind,
    WarningSeverity,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid rank: {0}")]
    InvalidRank(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
