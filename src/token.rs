//! Token values shared by sessions, login links and CSRF protection.
//!
//! A [`Token`] is an opaque random value with a creation time and a validity
//! flag. Validity is cleared exactly once, when [`Token::consume`] succeeds,
//! and is never restored.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::SecretString;

/// Why a token could not be consumed.
///
/// Clients only ever see "unauthorized"; the reason is for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No token of that kind was issued to the session.
    Missing,
    /// The token was already consumed.
    AlreadyUsed,
    Expired,
    /// The presented value differs from the issued one.
    Mismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no token issued"),
            Self::AlreadyUsed => write!(f, "token already used"),
            Self::Expired => write!(f, "token expired"),
            Self::Mismatch => write!(f, "token mismatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    value: SecretString,
    created_at: DateTime<Utc>,
    valid: bool,
}

impl Token {
    /// Wraps a pre-generated value, stamped with the current time.
    pub fn new(value: impl Into<SecretString>) -> Self {
        Self::issued_at(value, Utc::now())
    }

    pub fn issued_at(value: impl Into<SecretString>, created_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            created_at,
            valid: true,
        }
    }

    pub fn value(&self) -> &SecretString {
        &self.value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn expires_at(&self, limit: Duration) -> DateTime<Utc> {
        self.created_at + limit
    }

    pub fn has_expired(&self, limit: Duration) -> bool {
        self.has_expired_at(limit, Utc::now())
    }

    /// A token expires at the instant `created_at + limit`, inclusive.
    pub fn has_expired_at(&self, limit: Duration, now: DateTime<Utc>) -> bool {
        now >= self.expires_at(limit)
    }

    /// Single-use consumption.
    ///
    /// Succeeds only if the token is valid, unexpired and equal to
    /// `candidate`. On success the token is marked invalid; on failure it is
    /// left untouched.
    pub fn consume(&mut self, candidate: &str, limit: Duration) -> Result<(), Rejection> {
        self.consume_at(candidate, limit, Utc::now())
    }

    pub fn consume_at(
        &mut self,
        candidate: &str,
        limit: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), Rejection> {
        if !self.valid {
            return Err(Rejection::AlreadyUsed);
        }
        if self.has_expired_at(limit, now) {
            return Err(Rejection::Expired);
        }
        if !self.value.ct_eq(candidate) {
            return Err(Rejection::Mismatch);
        }
        self.valid = false;
        Ok(())
    }
}

/// Single-use credential emailed to prove control of an address.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginToken(pub Token);

/// Single-use credential embedded in state-mutating forms.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrfToken(pub Token);

impl LoginToken {
    pub fn value(&self) -> &SecretString {
        self.0.value()
    }
}

impl CsrfToken {
    pub fn value(&self) -> &SecretString {
        self.0.value()
    }
}

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "([REDACTED])"))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

id_newtype!(
    /// Session identifier carried in the `session` cookie.
    SessionId
);
id_newtype!(
    /// Login token value as submitted by a client.
    LoginId
);
id_newtype!(
    /// CSRF token value as submitted by a client.
    CsrfId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_is_valid() {
        let token = Token::new("abc");
        assert!(token.is_valid());
        assert!(!token.has_expired(Duration::minutes(10)));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let created = Utc::now();
        let limit = Duration::minutes(10);
        let token = Token::issued_at("abc", created);
        let epsilon = Duration::milliseconds(1);

        assert!(!token.has_expired_at(limit, created + limit - epsilon));
        assert!(token.has_expired_at(limit, created + limit));
        assert!(token.has_expired_at(limit, created + limit + epsilon));
    }

    #[test]
    fn test_expires_at() {
        let created = Utc::now();
        let token = Token::issued_at("abc", created);
        assert_eq!(token.expires_at(Duration::days(7)), created + Duration::days(7));
    }

    #[test]
    fn test_consume_once() {
        let mut token = Token::new("abc");
        let limit = Duration::minutes(10);

        assert_eq!(token.consume("abc", limit), Ok(()));
        assert!(!token.is_valid());
        assert_eq!(token.consume("abc", limit), Err(Rejection::AlreadyUsed));
    }

    #[test]
    fn test_consume_mismatch_leaves_token_valid() {
        let mut token = Token::new("abc");
        let limit = Duration::minutes(10);

        assert_eq!(token.consume("abd", limit), Err(Rejection::Mismatch));
        assert!(token.is_valid());
        assert_eq!(token.consume("abc", limit), Ok(()));
    }

    #[test]
    fn test_consume_expired() {
        let mut token = Token::issued_at("abc", Utc::now() - Duration::minutes(11));
        assert_eq!(
            token.consume("abc", Duration::minutes(10)),
            Err(Rejection::Expired)
        );
        assert!(token.is_valid());
    }

    #[test]
    fn test_expired_reported_before_mismatch() {
        let mut token = Token::issued_at("abc", Utc::now() - Duration::hours(1));
        assert_eq!(
            token.consume("wrong", Duration::minutes(10)),
            Err(Rejection::Expired)
        );
    }

    #[test]
    fn test_id_debug_redacted() {
        let id = SessionId::new("secret-session");
        assert_eq!(format!("{id:?}"), "SessionId([REDACTED])");
    }

    #[test]
    fn test_token_debug_redacts_value() {
        let token = LoginToken(Token::new("super-secret"));
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
