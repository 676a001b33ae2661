// src/application/commands/curation_commands.rs
//
// Read-side commands: working set, homepage preview, reports

use crate::application::dto::*;
use crate::application::error_handling::ToErrorResponse;
use crate::application::state::AppState;

/// Re-fetch the working set from the store
pub async fn refresh_stories(state: &AppState) -> Result<usize, String> {
    state.coordinator.load().await.to_error_response()
}

/// Stories matching the list view's filters, with state badges and warnings
pub async fn list_stories(filter: FilterDto, state: &AppState) -> Result<Vec<StoryDto>, String> {
    let filter = filter.to_filter().to_error_response()?;

    Ok(state
        .coordinator
        .snapshot()
        .stories
        .into_iter()
        .filter(|curated| filter.matches(&curated.story))
        .map(StoryDto::from)
        .collect())
}

pub async fn homepage_preview(state: &AppState) -> Result<HomepageDto, String> {
    Ok(state.coordinator.homepage().into())
}

pub async fn rank_collisions(state: &AppState) -> Result<Vec<CollisionDto>, String> {
    Ok(collisions_to_dto(state.coordinator.collisions()))
}

pub async fn safety_warnings(state: &AppState) -> Result<Vec<SafetyWarningDto>, String> {
    Ok(state
        .coordinator
        .safety_warnings()
        .into_iter()
        .map(SafetyWarningDto::from)
        .collect())
}

/// Rank questions still waiting for an answer
pub async fn pending_rank_confirmations(state: &AppState) -> Result<Vec<RankConflictDto>, String> {
    Ok(state
        .coordinator
        .pending_confirmations()
        .into_iter()
        .map(RankConflictDto::from)
        .collect())
}

/// Layout, collisions, warnings and per-state counts in one document
pub async fn curation_report(state: &AppState) -> Result<CurationReportDto, String> {
    Ok(state.coordinator.snapshot().into())
}
