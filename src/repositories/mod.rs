// src/repositories/mod.rs
//
// Story store layer
//
// CRITICAL RULES:
// - Stores are DUMB data mappers
// - NO business logic
// - Only hard invariants are checked, on insert (ranks are unique by convention only)
// - NO event emission
// - Explicit SQL only

pub mod story_repository;

pub use story_repository::{SqliteStoryStore, StoryQuery, StoryStore};

#[cfg(test)]
pub use story_repository::MockStoryStore;
