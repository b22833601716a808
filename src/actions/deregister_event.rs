use super::consume_csrf;
use crate::{
    CsrfId, CsrfToken, EventId, EventRegistrationId, OrganizerError, RegistrationRepository,
    Session,
};

/// The event the user left and the CSRF token for registering again.
#[derive(Debug, Clone)]
pub struct Deregistered {
    pub event: EventId,
    pub csrf: CsrfToken,
}

pub struct DeregisterEventAction<R: RegistrationRepository> {
    registration_repository: R,
}

impl<R: RegistrationRepository> DeregisterEventAction<R> {
    pub fn new(registration_repository: R) -> Self {
        DeregisterEventAction {
            registration_repository,
        }
    }

    /// Soft-deletes one of the session user's registrations.
    ///
    /// A registration owned by someone else is reported as not found, so the
    /// response does not reveal which ids exist.
    ///
    /// # Errors
    ///
    /// - `OrganizerError::BadRequest` - empty csrf, missing or malformed id
    /// - `OrganizerError::Unauthorized` - CSRF token rejected
    /// - `OrganizerError::NotFound` - unknown, deleted or foreign registration
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "deregister_event", skip_all, err)
    )]
    pub async fn execute(
        &self,
        session: &Session,
        csrf: &CsrfId,
        registration: &str,
    ) -> Result<Deregistered, OrganizerError> {
        consume_csrf(session, csrf)?;

        if registration.is_empty() {
            return Err(OrganizerError::bad_request("missing field: subscription_id"));
        }
        let id = registration.parse::<EventRegistrationId>()?;

        let found = self
            .registration_repository
            .find_registration(id)
            .await?
            .filter(|r| r.user == session.user())
            .ok_or(OrganizerError::NotFound)?;

        self.registration_repository.deregister_event(id).await?;
        let csrf = session.request_csrf()?;

        log::info!(target: "organizer", "msg=\"event registration removed\", user_id={}, registration_id={id}", session.user());
        Ok(Deregistered {
            event: found.event,
            csrf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::logged_in;
    use crate::{Authenticator, MockRegistrationRepository, UserId};

    #[tokio::test]
    async fn test_deregister_own_registration() {
        let repo = MockRegistrationRepository::new();
        let reg = repo.register_event(UserId(2), EventId(5), "hi").await.unwrap();
        let auth = Authenticator::default();
        let (session, csrf) = logged_in(&auth, UserId(2));

        let done = DeregisterEventAction::new(repo.clone())
            .execute(&session, &csrf, &reg.id.to_string())
            .await
            .unwrap();

        assert_eq!(done.event, EventId(5));
        assert!(repo.find_registration(reg.id).await.unwrap().is_none());
        assert!(done.csrf.0.is_valid());
    }

    #[tokio::test]
    async fn test_foreign_registration_is_not_found() {
        let repo = MockRegistrationRepository::new();
        let reg = repo.register_event(UserId(2), EventId(5), "").await.unwrap();
        let auth = Authenticator::default();
        let (intruder, csrf) = logged_in(&auth, UserId(3));

        let result = DeregisterEventAction::new(repo.clone())
            .execute(&intruder, &csrf, &reg.id.to_string())
            .await;

        assert_eq!(result.unwrap_err(), OrganizerError::NotFound);
        assert!(repo.find_registration(reg.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deregister_twice_is_not_found() {
        let repo = MockRegistrationRepository::new();
        let reg = repo.register_event(UserId(2), EventId(5), "").await.unwrap();
        let auth = Authenticator::default();
        let (session, csrf) = logged_in(&auth, UserId(2));
        let action = DeregisterEventAction::new(repo);

        let done = action
            .execute(&session, &csrf, &reg.id.to_string())
            .await
            .unwrap();
        let next_csrf = CsrfId::new(done.csrf.value().expose_secret());

        assert_eq!(
            action
                .execute(&session, &next_csrf, &reg.id.to_string())
                .await
                .unwrap_err(),
            OrganizerError::NotFound
        );
    }

    #[tokio::test]
    async fn test_deregister_rejects_missing_csrf() {
        let repo = MockRegistrationRepository::new();
        let reg = repo.register_event(UserId(2), EventId(5), "").await.unwrap();
        let auth = Authenticator::default();
        let (session, _) = logged_in(&auth, UserId(2));

        let result = DeregisterEventAction::new(repo.clone())
            .execute(&session, &CsrfId::new("guess"), &reg.id.to_string())
            .await;

        assert!(matches!(result, Err(OrganizerError::Unauthorized(_))));
        assert!(repo.find_registration(reg.id).await.unwrap().is_some());
    }
}
