//! Sensitive data wrapper types.

use std::fmt;

use serde::{Serialize, Serializer};

/// A token value that must not end up in logs.
///
/// `Debug` and `Display` print `[REDACTED]`. Equality runs in constant time
/// with respect to the content, so comparing a candidate against a stored
/// token does not leak how many leading characters matched.
///
/// # Example
///
/// ```rust
/// use organizer::SecretString;
///
/// let token = SecretString::new("Zm9vYmFy");
/// assert_eq!(format!("{token:?}"), "SecretString([REDACTED])");
/// assert!(token.ct_eq("Zm9vYmFy"));
/// assert!(!token.ct_eq("Zm9vYmFz"));
/// ```
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the secret value.
    ///
    /// Only call this where the raw value leaves the process on purpose: the
    /// cookie, the emailed link, or a form field.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Constant-time comparison against a candidate value.
    #[must_use]
    pub fn ct_eq(&self, candidate: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

/// Length is not secret: all tokens of a kind share one encoded length.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(&other.0)
    }
}

impl Eq for SecretString {}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // view models embed CSRF and login values in forms
        serializer.serialize_str(&self.0)
    }
}
