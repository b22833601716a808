use super::consume_csrf;
use crate::validators::validate_message;
use crate::{
    CsrfId, CsrfToken, EventId, EventRegistration, EventRepository, OrganizerError,
    RegistrationRepository, Session,
};

/// The saved registration and the CSRF token for the follow-up form.
#[derive(Debug, Clone)]
pub struct Registered {
    pub registration: EventRegistration,
    pub csrf: CsrfToken,
}

pub struct RegisterEventAction<E, R>
where
    E: EventRepository,
    R: RegistrationRepository,
{
    event_repository: E,
    registration_repository: R,
}

impl<E: EventRepository, R: RegistrationRepository> RegisterEventAction<E, R> {
    pub fn new(event_repository: E, registration_repository: R) -> Self {
        RegisterEventAction {
            event_repository,
            registration_repository,
        }
    }

    /// Registers the session's user for `event`, replacing the message of an
    /// existing registration.
    ///
    /// `event` is the raw form value. Registering twice keeps one
    /// registration with the latest message.
    ///
    /// # Errors
    ///
    /// - `OrganizerError::BadRequest` - empty csrf, missing or malformed event
    /// - `OrganizerError::Unauthorized` - CSRF token rejected
    /// - `OrganizerError::Validation` - message too long
    /// - `OrganizerError::NotFound` - no such event
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "register_event", skip_all, err)
    )]
    pub async fn execute(
        &self,
        session: &Session,
        csrf: &CsrfId,
        event: &str,
        message: &str,
    ) -> Result<Registered, OrganizerError> {
        consume_csrf(session, csrf)?;

        if event.is_empty() {
            return Err(OrganizerError::bad_request("missing field: event"));
        }
        let event = event.parse::<EventId>()?;
        validate_message(message)?;

        if self.event_repository.find_event(event).await?.is_none() {
            return Err(OrganizerError::NotFound);
        }

        let registration = self
            .registration_repository
            .register_event(session.user(), event, message)
            .await?;
        let csrf = session.request_csrf()?;

        Ok(Registered { registration, csrf })
    }
}
