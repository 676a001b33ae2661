// src/events/types.rs
//
// Notifications emitted by the curation engine.
// Each event represents a fact that has already occurred.
//
// RULES:
// - Events are facts, not commands
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{RankSlot, StoryField};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// WORKING SET
// ============================================================================

/// Emitted when the working set has been (re)fetched from the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingSetLoaded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub story_count: usize,
}

impl WorkingSetLoaded {
    pub fn new(story_count: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            story_count,
        }
    }
}

impl DomainEvent for WorkingSetLoaded {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "WorkingSetLoaded" }
}

// ============================================================================
// MUTATION OUTCOMES
// ============================================================================

/// Success notification: the store confirmed a field update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMutationApplied {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub story_id: Uuid,
    pub field: StoryField,
    pub message: String,
}

impl StoryMutationApplied {
    pub fn new(story_id: Uuid, field: StoryField, message: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            story_id,
            field,
            message,
        }
    }
}

impl DomainEvent for StoryMutationApplied {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StoryMutationApplied" }
}

/// Error notification: the store refused a write and the field was restored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMutationRolledBack {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub story_id: Uuid,
    pub field: StoryField,
    pub reason: String,
}

impl StoryMutationRolledBack {
    pub fn new(story_id: Uuid, field: StoryField, reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            story_id,
            field,
            reason,
        }
    }
}

impl DomainEvent for StoryMutationRolledBack {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StoryMutationRolledBack" }
}

/// "Not found" notice: an operation targeted a story that left the working set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleStoryReferenced {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub story_id: Uuid,
}

impl StaleStoryReferenced {
    pub fn new(story_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            story_id,
        }
    }
}

impl DomainEvent for StaleStoryReferenced {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "StaleStoryReferenced" }
}

// ============================================================================
// RANK CONFIRMATION
// ============================================================================

/// A rank assignment is waiting for the editor's yes/no decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConflictRaised {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub proposal_id: Uuid,
    pub story_id: Uuid,
    pub slot: RankSlot,
    pub rank: u32,
    pub conflicting_titles: Vec<String>,
}

impl RankConflictRaised {
    pub fn new(
        proposal_id: Uuid,
        story_id: Uuid,
        slot: RankSlot,
        rank: u32,
        conflicting_titles: Vec<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            proposal_id,
            story_id,
            slot,
            rank,
            conflicting_titles,
        }
    }
}

impl DomainEvent for RankConflictRaised {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "RankConflictRaised" }
}

/// The editor declined a pending rank assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankChangeCancelled {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub proposal_id: Uuid,
    pub story_id: Uuid,
}

impl RankChangeCancelled {
    pub fn new(proposal_id: Uuid, story_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            proposal_id,
            story_id,
        }
    }
}

impl DomainEvent for RankChangeCancelled {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "RankChangeCancelled" }
}
