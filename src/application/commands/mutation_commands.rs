// src/application/commands/mutation_commands.rs
//
// Write-side commands. Each one maps UI input onto a single coordinator
// mutation; the optimistic apply and rollback happen in the coordinator.

use crate::application::dto::*;
use crate::application::error_handling::ToErrorResponse;
use crate::application::state::AppState;
use crate::domain::{parse_rank_input, ImageSlot, Mutation, RankSlot};

use super::parse_id;

async fn run(state: &AppState, story_id: &str, mutation: Mutation) -> Result<MutationResultDto, String> {
    let id = parse_id(story_id, "story")?;

    state
        .coordinator
        .apply(id, mutation)
        .await
        .map(MutationResultDto::from)
        .to_error_response()
}

pub async fn toggle_published(
    story_id: String,
    enabled: bool,
    state: &AppState,
) -> Result<MutationResultDto, String> {
    run(state, &story_id, Mutation::PublishToggle { enabled }).await
}

pub async fn toggle_banner(
    story_id: String,
    enabled: bool,
    state: &AppState,
) -> Result<MutationResultDto, String> {
    run(state, &story_id, Mutation::BannerToggle { enabled }).await
}

pub async fn toggle_new_launch(
    story_id: String,
    enabled: bool,
    state: &AppState,
) -> Result<MutationResultDto, String> {
    run(state, &story_id, Mutation::NewLaunchToggle { enabled }).await
}

/// Save a rank typed by the editor ("" clears it).
/// May come back unconfirmed when another story holds the rank.
pub async fn set_rank(
    story_id: String,
    slot: String,
    raw_rank: String,
    state: &AppState,
) -> Result<MutationResultDto, String> {
    let slot = slot.parse::<RankSlot>().to_error_response()?;
    let rank = parse_rank_input(&raw_rank).to_error_response()?;

    run(state, &story_id, Mutation::RankAssign { slot, rank }).await
}

/// Buffer rank input without saving; returns the collisions it would cause
pub async fn stage_rank(
    story_id: String,
    slot: String,
    raw_rank: String,
    state: &AppState,
) -> Result<Vec<CollisionDto>, String> {
    let id = parse_id(&story_id, "story")?;
    let slot = slot.parse::<RankSlot>().to_error_response()?;

    state
        .coordinator
        .stage_rank_edit(id, slot, &raw_rank)
        .map(collisions_to_dto)
        .to_error_response()
}

pub async fn save_rank(
    story_id: String,
    slot: String,
    state: &AppState,
) -> Result<MutationResultDto, String> {
    let id = parse_id(&story_id, "story")?;
    let slot = slot.parse::<RankSlot>().to_error_response()?;

    state
        .coordinator
        .save_staged_rank(id, slot)
        .await
        .map(MutationResultDto::from)
        .to_error_response()
}

pub async fn discard_rank(story_id: String, slot: String, state: &AppState) -> Result<bool, String> {
    let id = parse_id(&story_id, "story")?;
    let slot = slot.parse::<RankSlot>().to_error_response()?;

    Ok(state.coordinator.discard_staged_rank(id, slot))
}

/// Answer a rank conflict question
pub async fn decide_rank_change(
    proposal_id: String,
    accept: bool,
    state: &AppState,
) -> Result<MutationResultDto, String> {
    let id = parse_id(&proposal_id, "proposal")?;

    state
        .coordinator
        .decide_rank_change(id, accept)
        .await
        .map(MutationResultDto::from)
        .to_error_response()
}

pub async fn confirm_rank_change(proposal_id: String, state: &AppState) -> Result<MutationResultDto, String> {
    decide_rank_change(proposal_id, true, state).await
}

pub async fn cancel_rank_change(proposal_id: String, state: &AppState) -> Result<(), String> {
    let id = parse_id(&proposal_id, "proposal")?;
    state.coordinator.cancel_rank_change(id).to_error_response()
}

/// Upload-complete callback: store the hosted image URL on the story.
/// `None` or a blank URL removes the image.
pub async fn assign_image(
    story_id: String,
    slot: String,
    url: Option<String>,
    state: &AppState,
) -> Result<MutationResultDto, String> {
    let slot = slot.parse::<ImageSlot>().to_error_response()?;
    run(state, &story_id, Mutation::ImageAssign { slot, url }).await
}
