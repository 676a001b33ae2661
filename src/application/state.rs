// src/application/state.rs

use std::sync::Arc;

use crate::domain::HomepageLimits;
use crate::events::EventBus;
use crate::repositories::StoryStore;
use crate::services::MutationCoordinator;

/// Application state shared by every command.
/// All fields are Arc-wrapped for thread-safe sharing across commands.
pub struct AppState {
    pub event_bus: Arc<EventBus>,
    pub coordinator: Arc<MutationCoordinator>,
}

impl AppState {
    pub fn new(store: Arc<dyn StoryStore>, limits: HomepageLimits) -> Self {
        let event_bus = Arc::new(EventBus::new());
        let coordinator = Arc::new(MutationCoordinator::with_limits(
            store,
            event_bus.clone(),
            limits,
        ));

        Self {
            event_bus,
            coordinator,
        }
    }
}
