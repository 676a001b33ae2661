// src/services/mutation_coordinator.rs
//
// Mutation Coordinator - owns the editor's working set
//
// PROTOCOL (one mutation = one StoryField of one story):
// 1. Look up the story (missing -> StaleReference notice)
// 2. Reject if the (story, field) pair is already in flight
// 3. Snapshot the single field, apply optimistically, recompute views
// 4. Await the store write
// 5. Success keeps the value; failure restores only that field
//
// Rank assignments that collide with another story's rank stop before step 3
// and wait for an explicit confirm/cancel. Steps 1-3 and the collision check
// share one lock, so two proposals for the same free rank cannot both pass.
//
// The state lock is never held across an await.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    assemble_with_limits, classify_story, collect_safety_warnings, conflicting_titles,
    detect_collisions, detect_slot_collisions, filter_stories, parse_rank_input, story_warnings,
    summarize_titles, ContentState, FieldSnapshot, HomepageLayout, HomepageLimits, Mutation,
    RankCollisions, RankSlot, SafetyWarning, Story, StoryField, StoryFilter, StoryWarning,
};
use crate::error::{AppResult, MutationError, MutationResult};
use crate::events::{
    EventBus, RankChangeCancelled, RankConflictRaised, StaleStoryReferenced,
    StoryMutationApplied, StoryMutationRolledBack, WorkingSetLoaded,
};
use crate::repositories::{StoryQuery, StoryStore};

// ============================================================================
// PUBLIC TYPES
// ============================================================================

/// Confirmation that the store accepted a field update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationReceipt {
    pub story_id: Uuid,
    pub field: StoryField,
    /// Human-readable success notice
    pub message: String,
}

/// A rank assignment waiting for the editor's decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConflict {
    pub proposal_id: Uuid,
    pub story_id: Uuid,
    pub slot: RankSlot,
    pub rank: u32,
    pub conflicting_titles: Vec<String>,
}

impl RankConflict {
    /// Confirmation question shown to the editor
    pub fn prompt(&self) -> String {
        format!(
            "Rank {} is already used by: {}. Continue anyway?",
            self.rank,
            summarize_titles(&self.conflicting_titles)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum MutationOutcome {
    Committed(MutationReceipt),
    AwaitingConfirmation(RankConflict),
}

/// A working-set story with everything the list view renders next to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedStory {
    #[serde(flatten)]
    pub story: Story,
    pub content_state: ContentState,
    pub warnings: Vec<StoryWarning>,
    pub busy_fields: Vec<StoryField>,
}

/// Everything the editor UI renders, taken under one lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationSnapshot {
    pub stories: Vec<CuratedStory>,
    pub collisions: RankCollisions,
    pub speculative_collisions: RankCollisions,
    pub homepage: HomepageLayout,
    pub safety_warnings: Vec<SafetyWarning>,
    pub pending_confirmations: Vec<RankConflict>,
}

// ============================================================================
// INTERNAL STATE
// ============================================================================

#[derive(Debug, Default)]
struct DerivedViews {
    collisions: RankCollisions,
    homepage: HomepageLayout,
    safety_warnings: Vec<SafetyWarning>,
}

/// What `apply` decided under the lock
enum Admission {
    Write(FieldSnapshot),
    Ask(RankConflict),
}

#[derive(Debug, Default)]
struct CurationState {
    stories: Vec<Story>,
    in_flight: HashSet<(Uuid, StoryField)>,
    /// Unconfirmed rank assignments, keyed by proposal id
    pending: HashMap<Uuid, RankConflict>,
    /// Edit buffers: parsed but unsaved rank input
    staged: HashMap<(Uuid, RankSlot), Option<u32>>,
    views: DerivedViews,
}

impl CurationState {
    fn position(&self, story_id: Uuid) -> Option<usize> {
        self.stories.iter().position(|s| s.id == story_id)
    }

    fn refresh_views(&mut self, limits: HomepageLimits) {
        self.views = DerivedViews {
            collisions: detect_collisions(&self.stories),
            homepage: assemble_with_limits(&self.stories, limits),
            safety_warnings: collect_safety_warnings(&self.stories),
        };

        log::debug!(
            "Recomputed views: {} stories, {} rank collisions, {} warnings",
            self.stories.len(),
            self.views.collisions.len(),
            self.views.safety_warnings.len()
        );
    }

    /// Collisions with unsaved edit buffers layered over the stored ranks
    fn speculative_collisions(&self, slot: RankSlot) -> RankCollisions {
        let preview: Vec<Story> = self
            .stories
            .iter()
            .map(|story| {
                let mut story = story.clone();
                if let Some(rank) = self.staged.get(&(story.id, slot)) {
                    slot.set_rank(&mut story, *rank);
                }
                story
            })
            .collect();

        detect_slot_collisions(&preview, slot)
    }

    /// Register a pending proposal when `rank` is taken by another story
    fn register_conflict(&mut self, story_id: Uuid, slot: RankSlot, rank: u32) -> Option<RankConflict> {
        let titles = conflicting_titles(&self.stories, slot, rank, story_id);
        if titles.is_empty() {
            return None;
        }

        // One open question per story and slot
        self.pending
            .retain(|_, c| !(c.story_id == story_id && c.slot == slot));

        let conflict = RankConflict {
            proposal_id: Uuid::new_v4(),
            story_id,
            slot,
            rank,
            conflicting_titles: titles,
        };
        self.pending.insert(conflict.proposal_id, conflict.clone());
        Some(conflict)
    }

    /// Mark the pair in flight, snapshot the field, apply optimistically
    fn start_write(
        &mut self,
        idx: usize,
        mutation: &Mutation,
        limits: HomepageLimits,
    ) -> FieldSnapshot {
        let story = &mut self.stories[idx];
        let story_id = story.id;
        let snapshot = mutation.snapshot(story);
        mutation.apply(story);

        self.in_flight.insert((story_id, mutation.field()));
        self.refresh_views(limits);

        log::debug!("Optimistically applied {} to story {}", mutation.field(), story_id);
        snapshot
    }

    fn busy_fields(&self, story_id: Uuid) -> Vec<StoryField> {
        let mut fields: Vec<StoryField> = self
            .in_flight
            .iter()
            .filter(|(id, _)| *id == story_id)
            .map(|(_, field)| *field)
            .collect();
        fields.sort();
        fields
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

pub struct MutationCoordinator {
    store: Arc<dyn StoryStore>,
    event_bus: Arc<EventBus>,
    limits: HomepageLimits,
    state: Mutex<CurationState>,
}

impl MutationCoordinator {
    pub fn new(store: Arc<dyn StoryStore>, event_bus: Arc<EventBus>) -> Self {
        Self::with_limits(store, event_bus, HomepageLimits::default())
    }

    pub fn with_limits(
        store: Arc<dyn StoryStore>,
        event_bus: Arc<EventBus>,
        limits: HomepageLimits,
    ) -> Self {
        Self {
            store,
            event_bus,
            limits,
            state: Mutex::new(CurationState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CurationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Replace the working set with the store's current stories.
    ///
    /// Staged edits and pending proposals of stories that disappeared are
    /// dropped. In-flight writes are left to finish on their own.
    pub async fn load(&self) -> AppResult<usize> {
        let mut stories = self.store.list(&StoryQuery::default()).await?;

        for story in stories.iter_mut() {
            story.episode_count = self.store.count_episodes(story.id).await?;
        }

        let count = stories.len();
        {
            let mut state = self.lock_state();
            let present: HashSet<Uuid> = stories.iter().map(|s| s.id).collect();

            state.stories = stories;
            state.staged.retain(|(id, _), _| present.contains(id));
            state.pending.retain(|_, conflict| present.contains(&conflict.story_id));
            state.refresh_views(self.limits);
        }

        log::info!("Loaded working set with {} stories", count);
        self.event_bus.emit(WorkingSetLoaded::new(count));

        Ok(count)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Apply a single-field mutation.
    ///
    /// Rank assignments onto a rank another story already holds return
    /// `AwaitingConfirmation` instead of writing.
    pub async fn apply(&self, story_id: Uuid, mutation: Mutation) -> MutationResult<MutationOutcome> {
        let admission = {
            let (mut state, idx) = self.admit(self.lock_state(), story_id, mutation.field())?;

            let conflict = match mutation {
                Mutation::RankAssign {
                    slot,
                    rank: Some(rank),
                } => state.register_conflict(story_id, slot, rank),
                _ => None,
            };

            match conflict {
                Some(conflict) => Admission::Ask(conflict),
                None => Admission::Write(state.start_write(idx, &mutation, self.limits)),
            }
        };

        match admission {
            Admission::Write(snapshot) => self
                .write(story_id, mutation, snapshot)
                .await
                .map(MutationOutcome::Committed),
            Admission::Ask(conflict) => {
                self.announce_conflict(&conflict);
                Ok(MutationOutcome::AwaitingConfirmation(conflict))
            }
        }
    }

    /// Assign (or clear, with `None`) a rank, asking first on collision
    pub async fn propose_rank_change(
        &self,
        story_id: Uuid,
        slot: RankSlot,
        rank: Option<u32>,
    ) -> MutationResult<MutationOutcome> {
        self.apply(story_id, Mutation::RankAssign { slot, rank }).await
    }

    /// Editor accepted the conflict: write the rank without asking again
    pub async fn confirm_rank_change(&self, proposal_id: Uuid) -> MutationResult<MutationReceipt> {
        let conflict = self
            .lock_state()
            .pending
            .remove(&proposal_id)
            .ok_or(MutationError::UnknownProposal(proposal_id))?;

        log::info!(
            "Rank {} confirmed for story {} despite conflict",
            conflict.rank,
            conflict.story_id
        );

        self.commit(
            conflict.story_id,
            Mutation::RankAssign {
                slot: conflict.slot,
                rank: Some(conflict.rank),
            },
        )
        .await
    }

    /// Editor declined the conflict: nothing is written
    pub fn cancel_rank_change(&self, proposal_id: Uuid) -> MutationResult<()> {
        let conflict = self
            .lock_state()
            .pending
            .remove(&proposal_id)
            .ok_or(MutationError::UnknownProposal(proposal_id))?;

        log::info!(
            "Rank {} for story {} cancelled",
            conflict.rank,
            conflict.story_id
        );
        self.event_bus
            .emit(RankChangeCancelled::new(proposal_id, conflict.story_id));

        Ok(())
    }

    /// Resolve a pending proposal from a yes/no answer.
    /// A "no" cancels the proposal and reports `ConfirmationDeclined`.
    pub async fn decide_rank_change(
        &self,
        proposal_id: Uuid,
        accept: bool,
    ) -> MutationResult<MutationReceipt> {
        if accept {
            self.confirm_rank_change(proposal_id).await
        } else {
            self.cancel_rank_change(proposal_id)?;
            Err(MutationError::ConfirmationDeclined)
        }
    }

    // ========================================================================
    // EDIT BUFFERS
    // ========================================================================

    /// Parse raw rank input into the story's edit buffer.
    /// Returns the collisions the slot would have if every buffer were saved.
    pub fn stage_rank_edit(
        &self,
        story_id: Uuid,
        slot: RankSlot,
        raw_input: &str,
    ) -> MutationResult<RankCollisions> {
        let rank = parse_rank_input(raw_input)?;

        let mut state = self.lock_state();
        if state.position(story_id).is_none() {
            drop(state);
            return Err(self.stale(story_id));
        }

        state.staged.insert((story_id, slot), rank);
        Ok(state.speculative_collisions(slot))
    }

    /// Propose the buffered rank. Without a buffer the current rank is reused.
    pub async fn save_staged_rank(
        &self,
        story_id: Uuid,
        slot: RankSlot,
    ) -> MutationResult<MutationOutcome> {
        let rank = {
            let state = self.lock_state();
            match state.staged.get(&(story_id, slot)) {
                Some(rank) => *rank,
                None => state
                    .position(story_id)
                    .and_then(|idx| slot.rank_of(&state.stories[idx])),
            }
        };

        self.propose_rank_change(story_id, slot, rank).await
    }

    /// Drop an edit buffer. Returns whether one existed.
    pub fn discard_staged_rank(&self, story_id: Uuid, slot: RankSlot) -> bool {
        self.lock_state().staged.remove(&(story_id, slot)).is_some()
    }

    pub fn staged_rank(&self, story_id: Uuid, slot: RankSlot) -> Option<Option<u32>> {
        self.lock_state().staged.get(&(story_id, slot)).copied()
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    pub fn stories(&self) -> Vec<Story> {
        self.lock_state().stories.clone()
    }

    pub fn story(&self, story_id: Uuid) -> Option<Story> {
        self.lock_state()
            .stories
            .iter()
            .find(|s| s.id == story_id)
            .cloned()
    }

    pub fn collisions(&self) -> RankCollisions {
        self.lock_state().views.collisions.clone()
    }

    /// Homepage collisions including unsaved edit buffers
    pub fn speculative_collisions(&self) -> RankCollisions {
        self.lock_state().speculative_collisions(RankSlot::Homepage)
    }

    pub fn homepage(&self) -> HomepageLayout {
        self.lock_state().views.homepage.clone()
    }

    pub fn safety_warnings(&self) -> Vec<SafetyWarning> {
        self.lock_state().views.safety_warnings.clone()
    }

    pub fn content_state(&self, story_id: Uuid) -> Option<ContentState> {
        self.lock_state()
            .stories
            .iter()
            .find(|s| s.id == story_id)
            .map(classify_story)
    }

    pub fn filtered(&self, filter: &StoryFilter) -> Vec<Story> {
        filter_stories(&self.lock_state().stories, filter)
    }

    pub fn is_busy(&self, story_id: Uuid, field: StoryField) -> bool {
        self.lock_state().in_flight.contains(&(story_id, field))
    }

    pub fn busy_fields(&self, story_id: Uuid) -> Vec<StoryField> {
        self.lock_state().busy_fields(story_id)
    }

    pub fn pending_confirmations(&self) -> Vec<RankConflict> {
        self.lock_state().pending.values().cloned().collect()
    }

    pub fn snapshot(&self) -> CurationSnapshot {
        let state = self.lock_state();

        let stories = state
            .stories
            .iter()
            .map(|story| CuratedStory {
                content_state: classify_story(story),
                warnings: story_warnings(story),
                busy_fields: state.busy_fields(story.id),
                story: story.clone(),
            })
            .collect();

        CurationSnapshot {
            stories,
            collisions: state.views.collisions.clone(),
            speculative_collisions: state.speculative_collisions(RankSlot::Homepage),
            homepage: state.views.homepage.clone(),
            safety_warnings: state.views.safety_warnings.clone(),
            pending_confirmations: state.pending.values().cloned().collect(),
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Stale and busy checks. Hands the guard back with the story's index.
    fn admit<'a>(
        &self,
        state: MutexGuard<'a, CurationState>,
        story_id: Uuid,
        field: StoryField,
    ) -> MutationResult<(MutexGuard<'a, CurationState>, usize)> {
        let Some(idx) = state.position(story_id) else {
            drop(state);
            return Err(self.stale(story_id));
        };
        if state.in_flight.contains(&(story_id, field)) {
            return Err(self.busy(story_id, field));
        }
        Ok((state, idx))
    }

    fn announce_conflict(&self, conflict: &RankConflict) {
        log::info!("Rank conflict raised: {}", conflict.prompt());
        self.event_bus.emit(RankConflictRaised::new(
            conflict.proposal_id,
            conflict.story_id,
            conflict.slot,
            conflict.rank,
            conflict.conflicting_titles.clone(),
        ));
    }

    /// Optimistic apply without a collision check
    async fn commit(&self, story_id: Uuid, mutation: Mutation) -> MutationResult<MutationReceipt> {
        let snapshot = {
            let (mut state, idx) = self.admit(self.lock_state(), story_id, mutation.field())?;
            state.start_write(idx, &mutation, self.limits)
        };

        self.write(story_id, mutation, snapshot).await
    }

    /// Store write, then keep or roll back
    async fn write(
        &self,
        story_id: Uuid,
        mutation: Mutation,
        snapshot: FieldSnapshot,
    ) -> MutationResult<MutationReceipt> {
        let result = self.store.update(story_id, &mutation.to_patch()).await;

        match result {
            Ok(()) => Ok(self.finish_success(story_id, &mutation)),
            Err(e) => Err(self.finish_failure(story_id, snapshot, e.to_string())),
        }
    }

    fn finish_success(&self, story_id: Uuid, mutation: &Mutation) -> MutationReceipt {
        let field = mutation.field();
        {
            let mut state = self.lock_state();
            state.in_flight.remove(&(story_id, field));

            if let Mutation::RankAssign { slot, .. } = mutation {
                state.staged.remove(&(story_id, *slot));
            }
        }

        let message = mutation.success_message();
        log::info!("Story {}: {}", story_id, message);
        self.event_bus
            .emit(StoryMutationApplied::new(story_id, field, message.clone()));

        MutationReceipt {
            story_id,
            field,
            message,
        }
    }

    fn finish_failure(&self, story_id: Uuid, snapshot: FieldSnapshot, reason: String) -> MutationError {
        let field = snapshot.field();
        {
            let mut state = self.lock_state();
            state.in_flight.remove(&(story_id, field));

            // The story may have left the working set during the write
            if let Some(idx) = state.position(story_id) {
                snapshot.restore(&mut state.stories[idx]);
            }
            state.refresh_views(self.limits);
        }

        log::warn!(
            "Rolled back {} on story {}: {}",
            field,
            story_id,
            reason
        );
        self.event_bus
            .emit(StoryMutationRolledBack::new(story_id, field, reason.clone()));

        MutationError::RemoteWrite {
            story_id,
            field,
            reason,
        }
    }

    fn stale(&self, story_id: Uuid) -> MutationError {
        log::warn!("Story {} is not in the working set", story_id);
        self.event_bus.emit(StaleStoryReferenced::new(story_id));
        MutationError::StaleReference(story_id)
    }

    fn busy(&self, story_id: Uuid, field: StoryField) -> MutationError {
        log::warn!("Rejected {} on story {}: update in flight", field, story_id);
        MutationError::Busy { story_id, field }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImageSlot, Language, StoryPatch};
    use crate::error::AppError;
    use crate::repositories::MockStoryStore;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn story(title: &str) -> Story {
        let mut story = Story::new(title.to_string(), Language::English);
        story.description = Some(format!("{} description", title));
        story.cover_image_url = Some(format!("{}.png", title.to_lowercase()));
        story
    }

    fn ranked(title: &str, rank: u32) -> Story {
        let mut story = story(title);
        story.is_published = true;
        story.homepage_rank = Some(rank);
        story
    }

    fn listing_store(stories: Vec<Story>) -> MockStoryStore {
        let mut store = MockStoryStore::new();
        store
            .expect_list()
            .returning(move |_| Ok(stories.clone()));
        store.expect_count_episodes().returning(|_| Ok(3));
        store
    }

    async fn loaded(store: MockStoryStore) -> (MutationCoordinator, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new());
        let coordinator = MutationCoordinator::new(Arc::new(store), bus.clone());
        coordinator.load().await.unwrap();
        (coordinator, bus)
    }

    fn event_types(bus: &EventBus) -> Vec<String> {
        bus.event_log()
            .into_iter()
            .map(|entry| entry.event_type)
            .collect()
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    #[tokio::test]
    async fn test_load_fills_episode_counts_and_views() {
        let a = ranked("A", 2);
        let b = ranked("B", 2);
        let (coordinator, bus) = loaded(listing_store(vec![a.clone(), b])).await;

        assert_eq!(coordinator.stories().len(), 2);
        assert_eq!(coordinator.story(a.id).unwrap().episode_count, 3);
        assert_eq!(
            coordinator.collisions().get(&2),
            Some(&vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(coordinator.homepage().ranked.len(), 2);
        assert_eq!(coordinator.content_state(a.id), Some(ContentState::Featured));
        assert_eq!(event_types(&bus), vec!["WorkingSetLoaded"]);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_working_set() {
        let mut store = MockStoryStore::new();
        store
            .expect_list()
            .returning(|_| Err(AppError::Store("connection reset".to_string())));

        let coordinator = MutationCoordinator::new(Arc::new(store), Arc::new(EventBus::new()));
        let result = coordinator.load().await;

        assert!(matches!(result, Err(AppError::Store(_))));
        assert!(coordinator.stories().is_empty());
    }

    // ========================================================================
    // TOGGLES
    // ========================================================================

    #[tokio::test]
    async fn test_banner_toggle_without_image_commits_and_warns() {
        let target = story("Panchatantra");
        let id = target.id;

        let mut store = listing_store(vec![target]);
        store
            .expect_update()
            .withf(move |story_id, patch| {
                *story_id == id
                    && *patch
                        == StoryPatch {
                            is_banner: Some(true),
                            ..Default::default()
                        }
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let (coordinator, bus) = loaded(store).await;
        let outcome = coordinator
            .apply(id, Mutation::BannerToggle { enabled: true })
            .await
            .unwrap();

        match outcome {
            MutationOutcome::Committed(receipt) => {
                assert_eq!(receipt.field, StoryField::Banner);
                assert_eq!(receipt.message, "Story added to banner");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert!(coordinator.story(id).unwrap().is_banner);
        assert!(!coordinator.is_busy(id, StoryField::Banner));
        assert!(coordinator
            .safety_warnings()
            .iter()
            .any(|w| w.message == "1 banner story/stories missing banner image"));
        assert!(event_types(&bus).contains(&"StoryMutationApplied".to_string()));
    }

    #[tokio::test]
    async fn test_failed_publish_toggle_restores_only_that_story() {
        let mut target = story("Target");
        target.is_banner = true;
        let other = ranked("Other", 1);
        let (target_id, other_id) = (target.id, other.id);

        let mut store = listing_store(vec![target, other.clone()]);
        store
            .expect_update()
            .returning(|_, _| Err(AppError::Store("permission denied".to_string())));

        let (coordinator, bus) = loaded(store).await;
        let result = coordinator
            .apply(target_id, Mutation::PublishToggle { enabled: true })
            .await;

        match result {
            Err(MutationError::RemoteWrite {
                story_id,
                field,
                reason,
            }) => {
                assert_eq!(story_id, target_id);
                assert_eq!(field, StoryField::Published);
                assert!(reason.contains("permission denied"));
            }
            other => panic!("expected remote write failure, got {:?}", other),
        }

        let restored = coordinator.story(target_id).unwrap();
        assert!(!restored.is_published);
        assert!(restored.is_banner);
        assert_eq!(coordinator.story(other_id).unwrap().homepage_rank, other.homepage_rank);
        assert!(!coordinator.is_busy(target_id, StoryField::Published));
        assert!(event_types(&bus).contains(&"StoryMutationRolledBack".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_story_is_a_stale_reference() {
        let mut store = listing_store(vec![story("A")]);
        store.expect_update().never();

        let (coordinator, bus) = loaded(store).await;
        let missing = Uuid::new_v4();
        let result = coordinator
            .apply(missing, Mutation::NewLaunchToggle { enabled: true })
            .await;

        assert!(matches!(result, Err(MutationError::StaleReference(id)) if id == missing));
        assert!(event_types(&bus).contains(&"StaleStoryReferenced".to_string()));
    }

    #[tokio::test]
    async fn test_image_assign_clears_missing_image_warning() {
        let mut target = story("Tenali");
        target.is_published = true;
        target.is_banner = true;
        let id = target.id;

        let mut store = listing_store(vec![target]);
        store.expect_update().times(1).returning(|_, _| Ok(()));

        let (coordinator, _) = loaded(store).await;
        assert!(!coordinator.safety_warnings().is_empty());

        let outcome = coordinator
            .apply(
                id,
                Mutation::ImageAssign {
                    slot: ImageSlot::Banner,
                    url: Some("https://cdn.example/tenali.png".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(matches!(outcome, MutationOutcome::Committed(r) if r.message == "Banner image uploaded"));
        assert!(coordinator.safety_warnings().is_empty());
    }

    // ========================================================================
    // RANK CONFIRMATION
    // ========================================================================

    #[tokio::test]
    async fn test_declined_rank_conflict_writes_nothing() {
        let a = ranked("A", 1);
        let b = ranked("B", 2);
        let b_id = b.id;

        let mut store = listing_store(vec![a, b]);
        store.expect_update().never();

        let (coordinator, bus) = loaded(store).await;
        let outcome = coordinator
            .propose_rank_change(b_id, RankSlot::Homepage, Some(1))
            .await
            .unwrap();

        let conflict = match outcome {
            MutationOutcome::AwaitingConfirmation(conflict) => conflict,
            other => panic!("expected confirmation, got {:?}", other),
        };
        assert_eq!(conflict.conflicting_titles, vec!["A".to_string()]);
        assert_eq!(conflict.prompt(), "Rank 1 is already used by: A. Continue anyway?");
        assert_eq!(coordinator.pending_confirmations().len(), 1);

        let declined = coordinator
            .decide_rank_change(conflict.proposal_id, false)
            .await;
        assert!(matches!(declined, Err(MutationError::ConfirmationDeclined)));

        assert_eq!(coordinator.story(b_id).unwrap().homepage_rank, Some(2));
        assert!(coordinator.collisions().is_empty());
        assert!(coordinator.pending_confirmations().is_empty());
        assert!(event_types(&bus).contains(&"RankChangeCancelled".to_string()));
    }

    #[tokio::test]
    async fn test_confirmed_rank_conflict_writes_and_collides() {
        let a = ranked("A", 1);
        let b = ranked("B", 2);
        let b_id = b.id;

        let mut store = listing_store(vec![a, b]);
        store
            .expect_update()
            .withf(move |id, patch| *id == b_id && patch.homepage_rank == Some(Some(1)))
            .times(1)
            .returning(|_, _| Ok(()));

        let (coordinator, _) = loaded(store).await;
        let conflict = match coordinator
            .propose_rank_change(b_id, RankSlot::Homepage, Some(1))
            .await
            .unwrap()
        {
            MutationOutcome::AwaitingConfirmation(conflict) => conflict,
            other => panic!("expected confirmation, got {:?}", other),
        };

        let receipt = coordinator
            .confirm_rank_change(conflict.proposal_id)
            .await
            .unwrap();

        assert_eq!(receipt.message, "Homepage rank updated to 1");
        assert_eq!(coordinator.story(b_id).unwrap().homepage_rank, Some(1));
        assert_eq!(
            coordinator.collisions().get(&1),
            Some(&vec!["A".to_string(), "B".to_string()])
        );
    }

    #[tokio::test]
    async fn test_failed_rank_write_recomputes_views() {
        let a = ranked("A", 1);
        let b = ranked("B", 2);
        let b_id = b.id;

        let mut store = listing_store(vec![a, b]);
        store
            .expect_update()
            .times(1)
            .returning(|_, _| Err(AppError::Store("disk full".to_string())));

        let (coordinator, bus) = loaded(store).await;
        let conflict = match coordinator
            .propose_rank_change(b_id, RankSlot::Homepage, Some(1))
            .await
            .unwrap()
        {
            MutationOutcome::AwaitingConfirmation(conflict) => conflict,
            other => panic!("expected confirmation, got {:?}", other),
        };

        let result = coordinator.confirm_rank_change(conflict.proposal_id).await;
        assert!(matches!(
            result,
            Err(MutationError::RemoteWrite { field: StoryField::HomepageRank, .. })
        ));

        assert_eq!(coordinator.story(b_id).unwrap().homepage_rank, Some(2));
        assert!(coordinator.collisions().is_empty());
        let ranked: Vec<String> = coordinator
            .homepage()
            .ranked
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(ranked, vec!["A".to_string(), "B".to_string()]);
        assert!(coordinator
            .safety_warnings()
            .iter()
            .all(|w| !matches!(w.kind, crate::domain::SafetyWarningKind::DuplicateRank { .. })));
        assert!(event_types(&bus).contains(&"StoryMutationRolledBack".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_proposal_is_rejected() {
        let (coordinator, _) = loaded(listing_store(vec![story("A")])).await;
        let proposal = Uuid::new_v4();

        assert!(matches!(
            coordinator.confirm_rank_change(proposal).await,
            Err(MutationError::UnknownProposal(id)) if id == proposal
        ));
        assert!(matches!(
            coordinator.cancel_rank_change(proposal),
            Err(MutationError::UnknownProposal(_))
        ));
    }

    #[tokio::test]
    async fn test_free_rank_and_unranking_commit_directly() {
        let a = ranked("A", 1);
        let a_id = a.id;

        let mut store = listing_store(vec![a, ranked("B", 2)]);
        store.expect_update().times(2).returning(|_, _| Ok(()));

        let (coordinator, _) = loaded(store).await;

        let moved = coordinator
            .propose_rank_change(a_id, RankSlot::Homepage, Some(5))
            .await
            .unwrap();
        assert!(matches!(moved, MutationOutcome::Committed(_)));

        let cleared = coordinator
            .propose_rank_change(a_id, RankSlot::Homepage, None)
            .await
            .unwrap();
        assert!(matches!(
            cleared,
            MutationOutcome::Committed(r) if r.message == "Homepage rank updated to unranked"
        ));
        assert_eq!(coordinator.story(a_id).unwrap().homepage_rank, None);
    }

    #[tokio::test]
    async fn test_new_launch_rank_conflicts_are_checked_in_their_own_slot() {
        let mut a = ranked("A", 1);
        a.new_launch_rank = Some(4);
        let b = ranked("B", 2);
        let b_id = b.id;

        let mut store = listing_store(vec![a, b]);
        store.expect_update().times(1).returning(|_, _| Ok(()));

        let (coordinator, _) = loaded(store).await;

        // Homepage rank 1 is taken, new-launch rank 1 is not
        let outcome = coordinator
            .propose_rank_change(b_id, RankSlot::NewLaunch, Some(1))
            .await
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::Committed(_)));

        let outcome = coordinator
            .propose_rank_change(b_id, RankSlot::NewLaunch, Some(4))
            .await
            .unwrap();
        assert!(matches!(outcome, MutationOutcome::AwaitingConfirmation(_)));
    }

    // ========================================================================
    // EDIT BUFFERS
    // ========================================================================

    #[tokio::test]
    async fn test_staged_rank_previews_collisions_then_saves() {
        let a = ranked("A", 1);
        let b = ranked("B", 2);
        let b_id = b.id;

        let mut store = listing_store(vec![a, b]);
        store.expect_update().times(1).returning(|_, _| Ok(()));

        let (coordinator, _) = loaded(store).await;

        let preview = coordinator
            .stage_rank_edit(b_id, RankSlot::Homepage, "1")
            .unwrap();
        assert_eq!(preview.get(&1).map(Vec::len), Some(2));
        assert!(coordinator.collisions().is_empty());
        assert_eq!(coordinator.speculative_collisions(), preview);

        let conflict = match coordinator
            .save_staged_rank(b_id, RankSlot::Homepage)
            .await
            .unwrap()
        {
            MutationOutcome::AwaitingConfirmation(conflict) => conflict,
            other => panic!("expected confirmation, got {:?}", other),
        };

        coordinator
            .confirm_rank_change(conflict.proposal_id)
            .await
            .unwrap();
        assert_eq!(coordinator.staged_rank(b_id, RankSlot::Homepage), None);
    }

    #[tokio::test]
    async fn test_invalid_staged_input_is_rejected() {
        let a = story("A");
        let id = a.id;
        let (coordinator, _) = loaded(listing_store(vec![a])).await;

        for raw in ["-1", "abc", "2.5"] {
            let result = coordinator.stage_rank_edit(id, RankSlot::Homepage, raw);
            assert!(matches!(result, Err(MutationError::Validation(_))), "{}", raw);
        }
        assert_eq!(coordinator.staged_rank(id, RankSlot::Homepage), None);

        coordinator
            .stage_rank_edit(id, RankSlot::Homepage, "")
            .unwrap();
        assert_eq!(coordinator.staged_rank(id, RankSlot::Homepage), Some(None));
        assert!(coordinator.discard_staged_rank(id, RankSlot::Homepage));
        assert!(!coordinator.discard_staged_rank(id, RankSlot::Homepage));
    }

    #[tokio::test]
    async fn test_reload_prunes_edits_for_vanished_stories() {
        let a = ranked("A", 1);
        let b = ranked("B", 2);
        let (a_id, b_id) = (a.id, b.id);

        let mut store = MockStoryStore::new();
        let mut listings = vec![vec![a.clone()], vec![a, b]];
        store
            .expect_list()
            .returning(move |_| Ok(listings.pop().unwrap_or_default()));
        store.expect_count_episodes().returning(|_| Ok(1));

        let (coordinator, _) = loaded(store).await;
        coordinator
            .stage_rank_edit(b_id, RankSlot::Homepage, "7")
            .unwrap();
        coordinator
            .stage_rank_edit(a_id, RankSlot::Homepage, "8")
            .unwrap();
        coordinator
            .propose_rank_change(b_id, RankSlot::Homepage, Some(1))
            .await
            .unwrap();
        assert_eq!(coordinator.pending_confirmations().len(), 1);

        coordinator.load().await.unwrap();

        assert_eq!(coordinator.staged_rank(b_id, RankSlot::Homepage), None);
        assert_eq!(coordinator.staged_rank(a_id, RankSlot::Homepage), Some(Some(8)));
        assert!(coordinator.pending_confirmations().is_empty());
    }

    // ========================================================================
    // CONCURRENCY
    // ========================================================================

    /// Store whose writes block on `gate` when `gated` matches the patch
    struct GatedStore {
        stories: Vec<Story>,
        gate: Arc<Notify>,
        gated: fn(&StoryPatch) -> bool,
        fail_gated: bool,
    }

    #[async_trait]
    impl StoryStore for GatedStore {
        async fn list(&self, _query: &StoryQuery) -> AppResult<Vec<Story>> {
            Ok(self.stories.clone())
        }

        async fn count_episodes(&self, _story_id: Uuid) -> AppResult<u32> {
            Ok(1)
        }

        async fn insert(&self, _story: &Story) -> AppResult<()> {
            Ok(())
        }

        async fn update(&self, _id: Uuid, patch: &StoryPatch) -> AppResult<()> {
            if (self.gated)(patch) {
                self.gate.notified().await;
                if self.fail_gated {
                    return Err(AppError::Store("timeout".to_string()));
                }
            }
            Ok(())
        }

        async fn delete(&self, _id: Uuid) -> AppResult<()> {
            Ok(())
        }
    }

    async fn gated(
        stories: Vec<Story>,
        gated: fn(&StoryPatch) -> bool,
        fail_gated: bool,
    ) -> (Arc<MutationCoordinator>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let store = GatedStore {
            stories,
            gate: gate.clone(),
            gated,
            fail_gated,
        };
        let coordinator = Arc::new(MutationCoordinator::new(
            Arc::new(store),
            Arc::new(EventBus::new()),
        ));
        coordinator.load().await.unwrap();
        (coordinator, gate)
    }

    async fn wait_until_busy(coordinator: &MutationCoordinator, id: Uuid, field: StoryField) {
        while !coordinator.is_busy(id, field) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_same_field_in_flight_is_busy() {
        let target = story("A");
        let id = target.id;
        let (coordinator, gate) =
            gated(vec![target], |p| p.is_published.is_some(), false).await;

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .apply(id, Mutation::PublishToggle { enabled: true })
                    .await
            })
        };
        wait_until_busy(&coordinator, id, StoryField::Published).await;

        // Optimistic value is visible while the write is pending
        assert!(coordinator.story(id).unwrap().is_published);
        assert_eq!(coordinator.busy_fields(id), vec![StoryField::Published]);

        let second = coordinator
            .apply(id, Mutation::PublishToggle { enabled: false })
            .await;
        assert!(matches!(
            second,
            Err(MutationError::Busy { field: StoryField::Published, .. })
        ));

        gate.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            Ok(MutationOutcome::Committed(_))
        ));
        assert!(coordinator.story(id).unwrap().is_published);
        assert!(coordinator.busy_fields(id).is_empty());
    }

    #[tokio::test]
    async fn test_other_field_of_same_story_proceeds_and_survives_rollback() {
        let target = story("A");
        let id = target.id;
        let (coordinator, gate) =
            gated(vec![target], |p| p.is_published.is_some(), true).await;

        let publish = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .apply(id, Mutation::PublishToggle { enabled: true })
                    .await
            })
        };
        wait_until_busy(&coordinator, id, StoryField::Published).await;

        let banner = coordinator
            .apply(id, Mutation::BannerToggle { enabled: true })
            .await;
        assert!(matches!(banner, Ok(MutationOutcome::Committed(_))));

        gate.notify_one();
        assert!(matches!(
            publish.await.unwrap(),
            Err(MutationError::RemoteWrite { .. })
        ));

        let story = coordinator.story(id).unwrap();
        assert!(!story.is_published);
        assert!(story.is_banner);
    }

    #[tokio::test]
    async fn test_rollback_does_not_clobber_concurrent_edit_of_another_story() {
        let a = story("A");
        let b = story("B");
        let (a_id, b_id) = (a.id, b.id);
        let (coordinator, gate) = gated(vec![a, b], |p| p.is_new_launch.is_some(), true).await;

        let failing = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .apply(a_id, Mutation::NewLaunchToggle { enabled: true })
                    .await
            })
        };
        wait_until_busy(&coordinator, a_id, StoryField::NewLaunch).await;

        coordinator
            .propose_rank_change(b_id, RankSlot::Homepage, Some(3))
            .await
            .unwrap();

        gate.notify_one();
        assert!(failing.await.unwrap().is_err());

        assert!(!coordinator.story(a_id).unwrap().is_new_launch);
        assert_eq!(coordinator.story(b_id).unwrap().homepage_rank, Some(3));
        assert_eq!(coordinator.homepage().ranked.len(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_rank_is_seen_by_next_proposal() {
        let a = story("A");
        let b = story("B");
        let (a_id, b_id) = (a.id, b.id);
        let (coordinator, gate) =
            gated(vec![a, b], |p| p.homepage_rank.is_some(), false).await;

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .propose_rank_change(a_id, RankSlot::Homepage, Some(5))
                    .await
            })
        };
        wait_until_busy(&coordinator, a_id, StoryField::HomepageRank).await;

        let second = coordinator
            .propose_rank_change(b_id, RankSlot::Homepage, Some(5))
            .await
            .unwrap();
        assert!(matches!(
            second,
            MutationOutcome::AwaitingConfirmation(ref c) if c.conflicting_titles == vec!["A".to_string()]
        ));
        assert!(!coordinator.is_busy(b_id, StoryField::HomepageRank));
        assert_eq!(coordinator.story(b_id).unwrap().homepage_rank, None);

        gate.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            Ok(MutationOutcome::Committed(_))
        ));
        assert_eq!(coordinator.pending_confirmations().len(), 1);
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    #[tokio::test]
    async fn test_snapshot_bundles_views() {
        let mut draft = story("Draft");
        draft.description = None;
        let live = ranked("Live", 1);
        let live_id = live.id;

        let (coordinator, _) = loaded(listing_store(vec![draft, live])).await;
        let snapshot = coordinator.snapshot();

        assert_eq!(snapshot.stories.len(), 2);
        assert_eq!(snapshot.stories[0].content_state, ContentState::Draft);
        assert_eq!(snapshot.stories[1].content_state, ContentState::Featured);
        assert_eq!(snapshot.homepage.ranked[0].id, live_id);
        assert!(snapshot.collisions.is_empty());
        assert!(snapshot.pending_confirmations.is_empty());

        let published = coordinator.filtered(&StoryFilter {
            status: crate::domain::StatusFilter::Published,
            ..Default::default()
        });
        assert_eq!(published.len(), 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["stories"][1]["content_state"], "featured");
    }
}
