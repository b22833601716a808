use crate::validators::EventForm;
use crate::{Event, EventRepository, OrganizerError, UserId};

pub struct CreateEventAction<E: EventRepository> {
    event_repository: E,
}

impl<E: EventRepository> CreateEventAction<E> {
    pub fn new(event_repository: E) -> Self {
        CreateEventAction { event_repository }
    }

    /// Validates the submitted form and stores the event under `user`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_event", skip(self, form), err)
    )]
    pub async fn execute(&self, user: UserId, form: EventForm) -> Result<Event, OrganizerError> {
        let new_event = form.into_new_event(user)?;
        let event = self.event_repository.create_event(new_event).await?;

        log::info!(target: "organizer", "msg=\"event created\", user_id={user}, event_id={}", event.id);
        Ok(event)
    }
}
