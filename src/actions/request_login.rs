use std::sync::Arc;

use crate::rate_limit::LoginThrottle;
use crate::validators::validate_email;
use crate::{Authenticator, Mailer, OrganizerError, Session, UserRepository};

pub struct RequestLoginAction<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    user_repository: U,
    mailer: M,
    authenticator: Arc<Authenticator>,
    base_url: String,
    throttle: Option<LoginThrottle>,
}

impl<U: UserRepository, M: Mailer> RequestLoginAction<U, M> {
    /// `base_url` is the public address the emailed link points to.
    pub fn new(
        user_repository: U,
        mailer: M,
        authenticator: Arc<Authenticator>,
        base_url: impl Into<String>,
    ) -> Self {
        RequestLoginAction {
            user_repository,
            mailer,
            authenticator,
            base_url: base_url.into(),
            throttle: None,
        }
    }

    #[must_use]
    pub fn with_throttle(mut self, throttle: Option<LoginThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    /// Creates a session for the account behind `email` and mails it a
    /// login link.
    ///
    /// The returned session is unauthenticated until the link is confirmed.
    ///
    /// # Returns
    ///
    /// - `Ok(session)` - link sent, set the session cookie
    /// - `Err(OrganizerError::BadRequest | Validation)` - empty or malformed email
    /// - `Err(OrganizerError::NotFound)` - no account with that email
    /// - `Err(OrganizerError::TooManyAttempts)` - throttled
    /// - `Err(_)` - random source, database or mail errors
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "request_login", skip_all, err)
    )]
    pub async fn execute(&self, email: &str) -> Result<Arc<Session>, OrganizerError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(OrganizerError::bad_request("missing field: email"));
        }
        validate_email(email)?;

        let user = self
            .user_repository
            .find_user_by_email(email)
            .await?
            .ok_or(OrganizerError::NotFound)?;

        if let Some(throttle) = &self.throttle {
            throttle.hit(email).await?;
        }

        let session = self.authenticator.create_session(user.id)?;
        let login = session.request_login()?;

        if let Err(e) = self
            .mailer
            .send(&user.email, login.value(), &self.base_url)
            .await
        {
            session.delete();
            return Err(e);
        }

        log::info!(target: "organizer", "msg=\"login link requested\", user_id={}", user.id);
        Ok(session)
    }
}
