// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between UI and the coordinator
// - Commands accept strings/DTOs, return DTOs
// - Errors come back as serialized ErrorResponse JSON
// - Commands NEVER contain business logic

pub mod curation_commands;
pub mod mutation_commands;

pub use curation_commands::*;
pub use mutation_commands::*;

use uuid::Uuid;

use crate::application::error_handling::ErrorResponse;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw)
        .map_err(|e| ErrorResponse::validation(format!("Invalid {} id: {}", what, e)).to_json())
}
