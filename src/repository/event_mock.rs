#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use crate::OrganizerError;

use super::MockRegistrationRepository;
use super::event::{Event, EventId, EventRepository, NewEvent};

/// In-memory events.
///
/// Participant counts come from the registration mock given to
/// [`with_registrations`](Self::with_registrations), and are zero without one.
#[derive(Clone, Default)]
pub struct MockEventRepository {
    pub events: Arc<Mutex<Vec<Event>>>,
    registrations: Option<MockRegistrationRepository>,
}

impl MockEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registrations(registrations: MockRegistrationRepository) -> Self {
        Self {
            events: Arc::default(),
            registrations: Some(registrations),
        }
    }

    fn counted(&self, mut event: Event) -> Event {
        event.number_of_participants = self
            .registrations
            .as_ref()
            .map_or(0, |r| r.live_count(event.id));
        event
    }
}

#[async_trait]
impl EventRepository for MockEventRepository {
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, OrganizerError> {
        let event = self.events.lock().unwrap().iter().find(|e| e.id == id).cloned();
        Ok(event.map(|e| self.counted(e)))
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, OrganizerError> {
        let mut events = self.events.lock().unwrap();
        let created = Event {
            id: EventId(events.len() as i64 + 1),
            created_by: event.created_by,
            title: event.title,
            description: event.description,
            repeats_every: event.repeats_every,
            repeats_scale: event.repeats_scale,
            min_participants: event.min_participants,
            max_participants: event.max_participants,
            number_of_participants: 0,
            created_at: Utc::now(),
        };
        events.push(created.clone());
        drop(events);

        Ok(created)
    }

    async fn list_events(&self) -> Result<Vec<Event>, OrganizerError> {
        let events = self.events.lock().unwrap().clone();
        Ok(events.into_iter().map(|e| self.counted(e)).collect())
    }
}
