#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use crate::OrganizerError;

use super::registration::{
    EventRegistration, EventRegistrationId, RegistrationRepository, stored_message,
};
use super::{EventId, UserId};

#[derive(Debug, Clone)]
struct RegistrationRow {
    registration: EventRegistration,
    deleted_at: Option<DateTime<Utc>>,
}

/// In-memory registrations; the whole upsert runs under one lock.
#[derive(Clone, Default)]
pub struct MockRegistrationRepository {
    rows: Arc<Mutex<Vec<RegistrationRow>>>,
}

impl MockRegistrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live registrations for `event`.
    pub fn live_count(&self, event: EventId) -> i64 {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .filter(|r| r.registration.event == event && r.deleted_at.is_none())
            .count() as i64
    }

    /// Number of stored rows, deleted ones included.
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RegistrationRepository for MockRegistrationRepository {
    async fn register_event(
        &self,
        user: UserId,
        event: EventId,
        message: &str,
    ) -> Result<EventRegistration, OrganizerError> {
        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();

        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.registration.user == user && r.registration.event == event)
        {
            row.registration.message = stored_message(message);
            row.registration.changed_at = now;
            row.deleted_at = None;
            return Ok(row.registration.clone());
        }

        let registration = EventRegistration {
            id: EventRegistrationId(rows.len() as i64 + 1),
            user,
            event,
            message: stored_message(message),
            created_at: now,
            changed_at: now,
        };
        rows.push(RegistrationRow {
            registration: registration.clone(),
            deleted_at: None,
        });
        drop(rows);

        Ok(registration)
    }

    async fn deregister_event(&self, id: EventRegistrationId) -> Result<(), OrganizerError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.registration.id == id && r.deleted_at.is_none())
            .ok_or(OrganizerError::NotFound)?;

        let now = Utc::now();
        row.deleted_at = Some(now);
        row.registration.changed_at = now;
        Ok(())
    }

    async fn find_registration(
        &self,
        id: EventRegistrationId,
    ) -> Result<Option<EventRegistration>, OrganizerError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.registration.id == id && r.deleted_at.is_none())
            .map(|r| r.registration.clone()))
    }

    async fn registrations_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<EventRegistration>, OrganizerError> {
        let rows = self.rows.lock().unwrap();
        let mut live: Vec<EventRegistration> = rows
            .iter()
            .filter(|r| r.registration.event == event && r.deleted_at.is_none())
            .map(|r| r.registration.clone())
            .collect();
        live.sort_by_key(|r| r.id);
        Ok(live)
    }
}
