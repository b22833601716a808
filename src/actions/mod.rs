//! One struct per use case, wired on top of sessions and repositories.
//!
//! Actions hold their dependencies and expose `execute` (or a pair of
//! steps for two-phase flows such as [`ConfirmLoginAction`]).

pub mod confirm_login;
pub mod create_event;
pub mod deregister_event;
pub mod logout;
pub mod register_event;
pub mod request_login;
pub mod show_event;

pub use confirm_login::ConfirmLoginAction;
pub use create_event::CreateEventAction;
pub use deregister_event::{DeregisterEventAction, Deregistered};
pub use logout::LogoutAction;
pub use register_event::{RegisterEventAction, Registered};
pub use request_login::RequestLoginAction;
pub use show_event::{EventOverview, ShowEventAction};

use crate::{CsrfId, OrganizerError, Session};

/// Consumes the session's CSRF token, rejecting empty submissions first.
pub(crate) fn consume_csrf(session: &Session, csrf: &CsrfId) -> Result<(), OrganizerError> {
    if csrf.is_empty() {
        return Err(OrganizerError::bad_request("missing field: csrf"));
    }
    session.try_invalidate_csrf(csrf).map_err(|reason| {
        log::warn!(target: "organizer", "msg=\"csrf rejected\", user_id={}, reason=\"{reason}\"", session.user());
        OrganizerError::Unauthorized(reason)
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::{Authenticator, CsrfId, LoginId, Session, UserId};

    /// An authenticated session for `user` and a fresh CSRF value.
    pub fn logged_in(auth: &Authenticator, user: UserId) -> (Arc<Session>, CsrfId) {
        let session = auth.create_session(user).unwrap();
        let login = session.request_login().unwrap();
        assert!(session.invalidate_login(&LoginId::new(login.value().expose_secret())));
        let csrf = session.request_csrf().unwrap();
        (session, CsrfId::new(csrf.value().expose_secret()))
    }
}
