// src/events/bus.rs
//
// Synchronous typed event bus. Handlers run in subscription order inside
// `emit`, and every emission lands in the event log.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::events::types::DomainEvent;

type EventHandler = Box<dyn Fn(&dyn Any) + Send + Sync>;

/// Carries the engine's notifications to whoever renders them
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<TypeId, Vec<EventHandler>>>,
    event_log: RwLock<Vec<EventLogEntry>>,
}

#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: String,
    pub occurred_at: String,
    pub handler_count: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: EventHandler = Box::new(move |event_any: &dyn Any| {
            if let Some(event) = event_any.downcast_ref::<E>() {
                handler(event);
            } else {
                log::error!(
                    "Failed to downcast event in handler for {}",
                    std::any::type_name::<E>()
                );
            }
        });

        write_lock(&self.handlers)
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// A panicking handler is logged and skipped; the others still run.
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        let handlers = read_lock(&self.handlers);
        let event_handlers = handlers.get(&TypeId::of::<E>());

        let log_entry = EventLogEntry {
            event_type: event.event_type().to_string(),
            event_id: event.event_id().to_string(),
            occurred_at: event.occurred_at().to_rfc3339(),
            handler_count: event_handlers.map_or(0, Vec::len),
        };

        log::debug!(
            "[EVENT] {} (id: {}) | {} handlers",
            log_entry.event_type,
            log_entry.event_id,
            log_entry.handler_count
        );
        write_lock(&self.event_log).push(log_entry);

        for (idx, handler) in event_handlers.into_iter().flatten().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any);
            }));

            if let Err(e) = result {
                log::error!("Handler {} for {} panicked: {:?}", idx, event.event_type(), e);
            }
        }
    }

    pub fn event_log(&self) -> Vec<EventLogEntry> {
        read_lock(&self.event_log).clone()
    }
}

// Panics are caught inside emit, so a poisoned lock still holds usable data
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoryField;
    use crate::events::types::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let sequence = Arc::new(Mutex::new(Vec::new()));

        for n in 1..=3 {
            let seq = Arc::clone(&sequence);
            bus.subscribe::<StaleStoryReferenced, _>(move |_| {
                seq.lock().unwrap().push(n);
            });
        }

        bus.emit(StaleStoryReferenced::new(Uuid::new_v4()));

        assert_eq!(*sequence.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_rollback_reason_reaches_only_its_subscribers() {
        let bus = EventBus::new();
        let reasons = Arc::new(Mutex::new(Vec::new()));
        let loads = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&reasons);
        bus.subscribe::<StoryMutationRolledBack, _>(move |event| {
            seen.lock().unwrap().push((event.field, event.reason.clone()));
        });
        let counted = Arc::clone(&loads);
        bus.subscribe::<WorkingSetLoaded, _>(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(StoryMutationRolledBack::new(
            Uuid::new_v4(),
            StoryField::Published,
            "disk full".to_string(),
        ));

        assert_eq!(
            *reasons.lock().unwrap(),
            vec![(StoryField::Published, "disk full".to_string())]
        );
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_log_records_emissions() {
        let bus = EventBus::new();
        bus.subscribe::<WorkingSetLoaded, _>(|_| {});

        bus.emit(WorkingSetLoaded::new(2));
        bus.emit(StoryMutationApplied::new(
            Uuid::new_v4(),
            StoryField::Banner,
            "Story added to banner".to_string(),
        ));

        let log = bus.event_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].event_type, "WorkingSetLoaded");
        assert_eq!(log[0].handler_count, 1);
        assert_eq!(log[1].event_type, "StoryMutationApplied");
        assert_eq!(log[1].handler_count, 0);
    }

    #[test]
    fn test_handler_panic_doesnt_break_bus() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe::<WorkingSetLoaded, _>(|_| {
            panic!("Intentional panic");
        });

        let counter_clone = Arc::clone(&counter);
        bus.subscribe::<WorkingSetLoaded, _>(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(WorkingSetLoaded::new(0));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
