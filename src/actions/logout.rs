use crate::Session;

/// Ends a session. Its identifier, and any token issued to it, stop working.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogoutAction;

impl LogoutAction {
    pub fn new() -> Self {
        LogoutAction
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "logout", skip_all))]
    pub fn execute(&self, session: &Session) {
        session.delete();

        log::info!(target: "organizer", "msg=\"logout success\", user_id={}", session.user());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Authenticator, UserId};

    #[test]
    fn test_logout_removes_session() {
        let auth = Authenticator::default();
        let session = auth.create_session(UserId(1)).unwrap();
        let id = session.id().clone();

        LogoutAction::new().execute(&session);

        assert!(auth.session_by_id(&id).is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_logout_twice_is_harmless() {
        let auth = Authenticator::default();
        let session = auth.create_session(UserId(1)).unwrap();

        LogoutAction.execute(&session);
        LogoutAction.execute(&session);

        assert!(auth.is_empty());
    }
}
