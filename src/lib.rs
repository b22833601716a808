//! Event organizer with passwordless email login.
//!
//! Users log in through single-use links sent by email. A login request
//! creates a [`Session`] identified by a cookie; the emailed login token and
//! the CSRF tokens embedded in forms are scoped to that session and can be
//! consumed exactly once.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`token`] | Token values, expiry and single-use consumption |
//! | [`session`] | [`Authenticator`] registry and the [`Session`] state machine |
//! | [`repository`] | Data types and storage traits |
//! | [`sqlite`] | `SQLite` repositories (feature `sqlx_sqlite`) |
//! | [`mail`] | Login link delivery |
//! | [`actions`] | Use cases wired on top of the core |
//! | [`api`] | Axum HTTP layer (feature `axum_api`) |

pub mod actions;
pub mod api;
pub mod config;
pub mod crypto;
pub mod mail;
pub mod rate_limit;
pub mod repository;
mod secret;
pub mod session;
#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;
pub mod token;
pub mod validators;

use std::fmt;

pub use config::{AuthConfig, CookieConfig, OrganizerConfig, ThrottleConfig};
pub use mail::{LoginLink, Mailer};
pub use repository::{
    Event, EventId, EventRegistration, EventRegistrationId, EventRepository, NewEvent,
    RegistrationRepository, TimeScale, User, UserId, UserRepository,
};
#[cfg(any(test, feature = "mocks"))]
pub use repository::{MockEventRepository, MockRegistrationRepository, MockUserRepository};
pub use secret::SecretString;
pub use session::{Authenticator, Session};
pub use token::{CsrfId, CsrfToken, LoginId, LoginToken, Rejection, SessionId, Token};
pub use validators::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub enum OrganizerError {
    /// Session, user, event or registration is absent (or expired).
    NotFound,
    /// A token was presented but could not be consumed.
    ///
    /// The reason is kept for logs and tests. It is never sent to clients.
    Unauthorized(Rejection),
    BadRequest(String),
    Validation(ValidationError),
    TooManyAttempts,
    /// The secure random source could not supply bytes.
    RandomSource(String),
    DatabaseError(String),
    MailError(String),
    ConfigurationError(String),
}

impl OrganizerError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// True for failures caused by infrastructure rather than by the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::RandomSource(_)
                | Self::DatabaseError(_)
                | Self::MailError(_)
                | Self::ConfigurationError(_)
        )
    }
}

impl std::error::Error for OrganizerError {}

impl fmt::Display for OrganizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Resource not found"),
            Self::Unauthorized(reason) => write!(f, "Unauthorized: {reason}"),
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::Validation(err) => write!(f, "Validation error: {err}"),
            Self::TooManyAttempts => write!(f, "Too many attempts, try again later"),
            Self::RandomSource(msg) => write!(f, "Random source failure: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::MailError(msg) => write!(f, "Mail error: {msg}"),
            Self::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl From<Rejection> for OrganizerError {
    fn from(reason: Rejection) -> Self {
        Self::Unauthorized(reason)
    }
}

impl From<ValidationError> for OrganizerError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}
