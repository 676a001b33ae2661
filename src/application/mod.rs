// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - The boundary between the editor UI and the coordinator
// - Translates UI strings/DTOs into domain mutations and back
// - Never holds working-set state of its own

pub mod commands;
pub mod dto;
pub mod error_handling;
pub mod state;

pub use commands::*;
pub use dto::*;
pub use error_handling::{ErrorResponse, ErrorType, ToErrorResponse};
pub use state::AppState;
