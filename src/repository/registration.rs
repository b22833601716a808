use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, UserId};
use crate::OrganizerError;

row_id!(
    /// Primary key of an event registration.
    EventRegistrationId
);

/// A user's registration for an event.
///
/// There is at most one row per (user, event) pair. Deregistering only marks
/// the row deleted; registering again revives it under the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: EventRegistrationId,
    pub user: UserId,
    pub event: EventId,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

/// Maps the submitted message to its stored form: empty becomes `None`.
pub fn stored_message(message: &str) -> Option<String> {
    (!message.is_empty()).then(|| message.to_owned())
}

#[async_trait]
pub trait RegistrationRepository {
    /// Registers `user` for `event`, or updates their existing registration.
    ///
    /// Idempotent per (user, event): a soft-deleted registration is revived
    /// with the new message and keeps its id, and a live one has its message
    /// replaced. The read and the write happen atomically.
    async fn register_event(
        &self,
        user: UserId,
        event: EventId,
        message: &str,
    ) -> Result<EventRegistration, OrganizerError>;

    /// Soft-deletes a registration.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::NotFound` if the id is unknown or already deleted.
    async fn deregister_event(&self, id: EventRegistrationId) -> Result<(), OrganizerError>;

    /// Returns the registration unless it is deleted.
    async fn find_registration(
        &self,
        id: EventRegistrationId,
    ) -> Result<Option<EventRegistration>, OrganizerError>;

    /// Live registrations for an event, ordered by id.
    async fn registrations_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<EventRegistration>, OrganizerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_message() {
        assert_eq!(stored_message(""), None);
        assert_eq!(stored_message("see you"), Some("see you".to_owned()));
        assert_eq!(stored_message(" "), Some(" ".to_owned()));
    }
}
