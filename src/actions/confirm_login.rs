use super::consume_csrf;
use crate::{CsrfId, CsrfToken, LoginId, OrganizerError, Session};

/// Two-step confirmation of an emailed login link.
///
/// Opening the link ([`prepare`](Self::prepare)) does not log in. It only
/// issues a CSRF token for the confirmation form, so link scanners that
/// prefetch URLs cannot consume the login token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmLoginAction;

impl ConfirmLoginAction {
    pub fn new() -> Self {
        ConfirmLoginAction
    }

    /// Checks that the session still awaits a login and issues the CSRF
    /// token for the confirmation form.
    ///
    /// # Errors
    ///
    /// - `OrganizerError::BadRequest` - `token` is empty
    /// - `OrganizerError::Unauthorized` - no live login request
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "prepare_login", skip_all, err)
    )]
    pub fn prepare(&self, session: &Session, token: &LoginId) -> Result<CsrfToken, OrganizerError> {
        if token.is_empty() {
            return Err(OrganizerError::bad_request("missing parameter: token"));
        }
        session.check_login_request()?;
        session.request_csrf()
    }

    /// Consumes the CSRF token and then the login token.
    ///
    /// The CSRF token is spent even if the login token is then rejected.
    ///
    /// # Errors
    ///
    /// - `OrganizerError::BadRequest` - a field is empty
    /// - `OrganizerError::Unauthorized` - either token was rejected
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "confirm_login", skip_all, err)
    )]
    pub fn confirm(
        &self,
        session: &Session,
        token: &LoginId,
        csrf: &CsrfId,
    ) -> Result<(), OrganizerError> {
        if token.is_empty() {
            return Err(OrganizerError::bad_request("missing parameter: token"));
        }
        consume_csrf(session, csrf)?;

        session.try_invalidate_login(token).map_err(|reason| {
            log::warn!(target: "organizer", "msg=\"login rejected\", user_id={}, reason=\"{reason}\"", session.user());
            OrganizerError::Unauthorized(reason)
        })?;

        log::info!(target: "organizer", "msg=\"login success\", user_id={}", session.user());
        Ok(())
    }
}
