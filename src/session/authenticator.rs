//! Process-wide session registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use super::{Registry, Session};
use crate::config::AuthConfig;
use crate::crypto::generate_token;
use crate::token::{SessionId, Token};
use crate::{OrganizerError, UserId};

/// Owns all live sessions, keyed by session identifier.
///
/// Sessions live in memory only and are lost when the process restarts.
/// Expired sessions are evicted lazily on lookup; [`prune_expired`] and
/// [`spawn_sweeper`] evict them eagerly without changing what lookups see.
///
/// [`prune_expired`]: Self::prune_expired
/// [`spawn_sweeper`]: Self::spawn_sweeper
#[derive(Debug)]
pub struct Authenticator {
    sessions: Arc<Registry>,
    config: AuthConfig,
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(AuthConfig::default())
    }
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Creates an unauthenticated session under a fresh random identifier.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::RandomSource` if no random bytes are available.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_session", skip(self), err)
    )]
    pub fn create_session(&self, user: UserId) -> Result<Arc<Session>, OrganizerError> {
        let value = generate_token(self.config.token_length)?;
        let id = SessionId::new(value.clone());
        Ok(self.register(id, Token::new(value), user))
    }

    /// Creates a session under a caller-chosen identifier.
    ///
    /// Meant for seeding a known session in tests and local development.
    /// Replaces any session already registered under `id`.
    pub fn create_session_with_id(&self, user: UserId, id: SessionId) -> Arc<Session> {
        let token = Token::new(id.as_str());
        self.register(id, token, user)
    }

    #[cfg(test)]
    pub(crate) fn insert_session(&self, user: UserId, token: Token) -> Arc<Session> {
        let id = SessionId::new(token.value().expose_secret());
        self.register(id, token, user)
    }

    fn register(&self, id: SessionId, token: Token, user: UserId) -> Arc<Session> {
        let session = Arc::new(Session::new(
            id.clone(),
            token,
            user,
            self.config,
            Arc::downgrade(&self.sessions),
        ));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&session));
        session
    }

    /// Looks up a live session.
    ///
    /// An expired session is removed and reported as absent, exactly like
    /// one that never existed.
    pub fn session_by_id(&self, id: &SessionId) -> Option<Arc<Session>> {
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;

        if session.has_expired() {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            if sessions.get(id).is_some_and(|s| Arc::ptr_eq(s, &session)) {
                sessions.remove(id);
            }
            return None;
        }

        Some(session)
    }

    /// Resolves the value of the session cookie, if one was sent.
    pub fn session_from_cookie(&self, cookie: Option<&str>) -> Option<Arc<Session>> {
        let value = cookie.filter(|v| !v.is_empty())?;
        self.session_by_id(&SessionId::new(value))
    }

    /// Removes all expired sessions and returns how many were removed.
    #[allow(clippy::significant_drop_tightening)]
    pub fn prune_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| !session.has_expired());
        before.saturating_sub(sessions.len())
    }

    /// Runs [`prune_expired`](Self::prune_expired) every `every` until the
    /// authenticator is dropped.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(auth) = weak.upgrade() else {
                    break;
                };
                let pruned = auth.prune_expired();
                if pruned > 0 {
                    log::debug!(target: "organizer", "msg=\"expired sessions pruned\", count={pruned}");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn test_create_and_find() {
        let auth = Authenticator::default();
        let session = auth.create_session(UserId(7)).unwrap();

        let found = auth.session_by_id(session.id()).unwrap();
        assert!(Arc::ptr_eq(&found, &session));
        assert_eq!(found.user(), UserId(7));
        assert_eq!(auth.len(), 1);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let auth = Authenticator::default();
        let s1 = auth.create_session(UserId(1)).unwrap();
        let s2 = auth.create_session(UserId(1)).unwrap();

        assert_ne!(s1.id(), s2.id());
        assert_eq!(auth.len(), 2);
    }

    #[test]
    fn test_session_id_independent_from_login_token() {
        let auth = Authenticator::default();
        let session = auth.create_session(UserId(1)).unwrap();
        let login = session.request_login().unwrap();

        assert_ne!(session.id().as_str(), login.value().expose_secret());
    }

    #[test]
    fn test_poisoned_registry_keeps_counting() {
        let auth = Authenticator::default();
        let session = auth.create_session(UserId(1)).unwrap();

        let registry = Arc::clone(&auth.sessions);
        let _ = std::thread::spawn(move || {
            let _guard = registry.write().unwrap();
            panic!("registry writer panicked");
        })
        .join();

        assert!(auth.sessions.is_poisoned());
        assert_eq!(auth.len(), 1);
        assert!(!auth.is_empty());
        assert!(auth.session_by_id(session.id()).is_some());
    }

    #[test]
    fn test_find_nonexistent() {
        let auth = Authenticator::default();
        assert!(auth.session_by_id(&SessionId::new("nonexistent")).is_none());
    }

    #[test]
    fn test_expired_session_is_removed_on_lookup() {
        let auth = Authenticator::default();
        let session = auth.insert_session(
            UserId(1),
            Token::issued_at("stale", Utc::now() - Duration::days(7)),
        );

        assert_eq!(auth.len(), 1);
        assert!(auth.session_by_id(session.id()).is_none());
        assert!(auth.is_empty());
    }

    #[test]
    fn test_session_from_cookie() {
        let auth = Authenticator::default();
        let session = auth.create_session(UserId(1)).unwrap();

        let found = auth.session_from_cookie(Some(session.id().as_str()));
        assert!(found.is_some());
        assert!(auth.session_from_cookie(None).is_none());
        assert!(auth.session_from_cookie(Some("")).is_none());
        assert!(auth.session_from_cookie(Some("bogus")).is_none());
    }

    #[test]
    fn test_create_session_with_id() {
        let auth = Authenticator::default();
        let session = auth.create_session_with_id(UserId(3), SessionId::new("known-id"));

        let found = auth.session_by_id(&SessionId::new("known-id")).unwrap();
        assert!(Arc::ptr_eq(&found, &session));
    }

    #[test]
    fn test_cookie_expiry_matches_session_expiry() {
        let auth = Authenticator::new(AuthConfig::default().session_expiry(Duration::hours(2)));
        let session = auth.create_session(UserId(1)).unwrap();

        assert_eq!(session.expires_at(), session.created_at() + Duration::hours(2));
    }

    #[test]
    fn test_prune_expired() {
        let auth = Authenticator::default();
        auth.insert_session(
            UserId(1),
            Token::issued_at("stale", Utc::now() - Duration::days(8)),
        );
        let live = auth.create_session(UserId(2)).unwrap();

        assert_eq!(auth.prune_expired(), 1);
        assert_eq!(auth.len(), 1);
        assert!(auth.session_by_id(live.id()).is_some());
    }

    #[tokio::test]
    async fn test_sweeper_prunes_and_stops() {
        let auth = Arc::new(Authenticator::new(
            AuthConfig::default().session_expiry(Duration::milliseconds(5)),
        ));
        auth.create_session(UserId(1)).unwrap();

        let handle = auth.spawn_sweeper(std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        assert!(auth.is_empty());

        drop(auth);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
