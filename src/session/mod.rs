//! Cookie sessions and the login/CSRF state machine.
//!
//! The [`Authenticator`] owns every live [`Session`]. Handlers look sessions
//! up by the identifier from the `session` cookie and receive an
//! `Arc<Session>`; all mutation happens in place behind the session's own
//! lock.
//!
//! A session moves between three states:
//!
//! | State | Reached by |
//! |-------|------------|
//! | unauthenticated, no pending login | [`Authenticator::create_session`] |
//! | unauthenticated, pending login | [`Session::request_login`] (from any state) |
//! | authenticated | [`Session::invalidate_login`] with the emailed value |
//!
//! [`Session::delete`] removes the session from the registry for good.

mod authenticator;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, Weak};

use chrono::{DateTime, Utc};

pub use authenticator::Authenticator;

use crate::config::AuthConfig;
use crate::crypto::generate_token;
use crate::token::{CsrfId, CsrfToken, LoginId, LoginToken, Rejection, SessionId, Token};
use crate::{OrganizerError, UserId};

pub(crate) type Registry = RwLock<std::collections::HashMap<SessionId, std::sync::Arc<Session>>>;

#[derive(Debug, Default)]
struct SessionState {
    authenticated: bool,
    login: Option<LoginToken>,
    csrf: Option<CsrfToken>,
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    token: Token,
    user: UserId,
    config: AuthConfig,
    state: Mutex<SessionState>,
    registry: Weak<Registry>,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        token: Token,
        user: UserId,
        config: AuthConfig,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            id,
            token,
            user,
            config,
            state: Mutex::new(SessionState::default()),
            registry,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.token.created_at()
    }

    /// Instant the session cookie should expire.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.token.expires_at(self.config.session_expiry)
    }

    pub fn has_expired(&self) -> bool {
        self.token.has_expired(self.config.session_expiry)
    }

    // State writes are single assignments, so a poisoned lock still guards a
    // consistent state.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True after a successful login, until the session itself expires or a
    /// new login is requested.
    pub fn is_authenticated(&self) -> bool {
        !self.has_expired() && self.state().authenticated
    }

    /// Issues a fresh login token, replacing any pending one.
    ///
    /// Resets the session to unauthenticated, even mid-session.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::RandomSource` if no random bytes are available.
    /// The session is left unchanged in that case.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "request_login", skip_all, err)
    )]
    pub fn request_login(&self) -> Result<LoginToken, OrganizerError> {
        let login = LoginToken(Token::new(generate_token(self.config.token_length)?));

        let mut state = self.state();
        state.login = Some(login.clone());
        state.authenticated = false;
        drop(state);

        log::debug!(target: "organizer", "msg=\"login requested\", user_id={}", self.user);
        Ok(login)
    }

    pub fn has_valid_login_request(&self) -> bool {
        self.check_login_request().is_ok()
    }

    /// Why the pending login request, if any, can no longer be confirmed.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] a consumption attempt would currently fail
    /// with, short of a value mismatch.
    pub fn check_login_request(&self) -> Result<(), Rejection> {
        let state = self.state();
        let login = state.login.as_ref().ok_or(Rejection::Missing)?;
        if !login.0.is_valid() {
            return Err(Rejection::AlreadyUsed);
        }
        if login.0.has_expired(self.config.login_expiry) {
            return Err(Rejection::Expired);
        }
        Ok(())
    }

    /// Consumes the pending login token and authenticates the session.
    ///
    /// Returns false if the token is missing, used, expired or different.
    pub fn invalidate_login(&self, candidate: &LoginId) -> bool {
        match self.try_invalidate_login(candidate) {
            Ok(()) => {
                log::info!(target: "organizer", "msg=\"login success\", user_id={}", self.user);
                true
            }
            Err(reason) => {
                log::warn!(target: "organizer", "msg=\"login rejected\", user_id={}, reason=\"{reason}\"", self.user);
                false
            }
        }
    }

    /// Like [`invalidate_login`](Self::invalidate_login), reporting why a
    /// candidate was rejected.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] reason. The session is unchanged on error.
    pub fn try_invalidate_login(&self, candidate: &LoginId) -> Result<(), Rejection> {
        let mut state = self.state();
        let login = state.login.as_mut().ok_or(Rejection::Missing)?;
        login.0.consume(candidate.as_str(), self.config.login_expiry)?;
        state.authenticated = true;
        Ok(())
    }

    /// Issues a fresh CSRF token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::RandomSource` if no random bytes are available.
    pub fn request_csrf(&self) -> Result<CsrfToken, OrganizerError> {
        let csrf = CsrfToken(Token::new(generate_token(self.config.token_length)?));
        self.state().csrf = Some(csrf.clone());
        Ok(csrf)
    }

    /// Consumes the current CSRF token.
    ///
    /// A consumed token never validates again, so every state-mutating
    /// form needs a freshly requested token.
    pub fn invalidate_csrf(&self, candidate: &CsrfId) -> bool {
        match self.try_invalidate_csrf(candidate) {
            Ok(()) => true,
            Err(reason) => {
                log::warn!(target: "organizer", "msg=\"csrf rejected\", user_id={}, reason=\"{reason}\"", self.user);
                false
            }
        }
    }

    /// # Errors
    ///
    /// Returns the [`Rejection`] reason. The session is unchanged on error.
    pub fn try_invalidate_csrf(&self, candidate: &CsrfId) -> Result<(), Rejection> {
        let mut state = self.state();
        let csrf = state.csrf.as_mut().ok_or(Rejection::Missing)?;
        csrf.0.consume(candidate.as_str(), self.config.csrf_expiry)
    }

    /// Removes the session from its authenticator and drops pending tokens.
    ///
    /// Later lookups by this session's identifier report not found. Calling
    /// it again is a no-op.
    pub fn delete(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }

        let mut state = self.state();
        state.authenticated = false;
        state.login = None;
        state.csrf = None;
        drop(state);

        log::info!(target: "organizer", "msg=\"session deleted\", user_id={}", self.user);
    }
}
