// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod mutation_coordinator;

pub use mutation_coordinator::{
    CuratedStory,
    CurationSnapshot,
    MutationCoordinator,
    MutationOutcome,
    MutationReceipt,
    RankConflict,
};
