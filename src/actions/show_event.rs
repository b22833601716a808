use crate::{
    CsrfToken, Event, EventId, EventRegistration, EventRegistrationId, EventRepository,
    OrganizerError, RegistrationRepository, Session, User, UserRepository,
};

/// An event with its participants, as seen by one session.
#[derive(Debug, Clone)]
pub struct EventOverview {
    pub event: Event,
    pub participants: Vec<(User, EventRegistration)>,
    /// The viewer's own registration, if any.
    pub own_registration: Option<EventRegistrationId>,
    /// Token for the register or deregister form on the page.
    pub csrf: CsrfToken,
}

pub struct ShowEventAction<U, E, R>
where
    U: UserRepository,
    E: EventRepository,
    R: RegistrationRepository,
{
    user_repository: U,
    event_repository: E,
    registration_repository: R,
}

impl<U, E, R> ShowEventAction<U, E, R>
where
    U: UserRepository,
    E: EventRepository,
    R: RegistrationRepository,
{
    pub fn new(user_repository: U, event_repository: E, registration_repository: R) -> Self {
        ShowEventAction {
            user_repository,
            event_repository,
            registration_repository,
        }
    }

    /// `id` is the raw query value.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "show_event", skip_all, err)
    )]
    pub async fn execute(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<EventOverview, OrganizerError> {
        if id.is_empty() {
            return Err(OrganizerError::bad_request("missing field: id"));
        }
        let id = id.parse::<EventId>()?;

        let event = self
            .event_repository
            .find_event(id)
            .await?
            .ok_or(OrganizerError::NotFound)?;
        let registrations = self.registration_repository.registrations_for_event(id).await?;

        let mut participants = Vec::with_capacity(registrations.len());
        let mut own_registration = None;
        for registration in registrations {
            let Some(user) = self.user_repository.find_user_by_id(registration.user).await? else {
                log::warn!(target: "organizer", "msg=\"registration without user\", registration_id={}", registration.id);
                continue;
            };
            if user.id == session.user() {
                own_registration = Some(registration.id);
            }
            participants.push((user, registration));
        }

        let csrf = session.request_csrf()?;
        Ok(EventOverview {
            event,
            participants,
            own_registration,
            csrf,
        })
    }
}
