// src/lib.rs
// Homepage Curator - homepage curation engine for story catalogs
//
// Architecture:
// - Domain-centric: classification, collisions, layout and filters are pure
// - Coordinator-owned state: one working set, mutated one field at a time
// - Optimistic: local state first, store second, per-field rollback on failure
// - Event-driven: outcomes are published on the event bus, never printed
// - Application Layer: UI boundary (commands + DTOs)

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod logging;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    assemble,
    assemble_with_limits,
    classify,
    classify_story,
    collect_safety_warnings,
    detect_collisions,
    filter_stories,
    // Lifecycle
    ContentState,
    DomainError,
    DomainResult,
    // Homepage
    HomepageLayout,
    HomepageLimits,
    ImageSlot,
    Language,
    // Mutations
    Mutation,
    RankCollisions,
    RankSlot,
    SafetyWarning,
    // Story
    Story,
    StoryField,
    // Filters
    StoryFilter,
    StoryPatch,
};

// ============================================================================
// PUBLIC API - Errors
// ============================================================================

pub use error::{AppError, AppResult, MutationError, MutationResult};

// ============================================================================
// PUBLIC API - Services & Infrastructure
// ============================================================================

pub use config::CurationConfig;
pub use events::EventBus;
pub use repositories::{SqliteStoryStore, StoryQuery, StoryStore};
pub use services::{CurationSnapshot, MutationCoordinator, MutationOutcome, RankConflict};
