// src/events/mod.rs
//
// Engine notifications and the bus that delivers them

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventLogEntry};

pub use types::{
    DomainEvent,
    RankChangeCancelled,
    RankConflictRaised,
    StaleStoryReferenced,
    StoryMutationApplied,
    StoryMutationRolledBack,
    WorkingSetLoaded,
};
