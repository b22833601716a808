//! Configuration types for the organizer.
//!
//! # Example
//!
//! ```rust
//! use organizer::config::{AuthConfig, OrganizerConfig};
//! use chrono::Duration;
//!
//! // Use defaults
//! let config = OrganizerConfig::default();
//!
//! // Or customize
//! let config = OrganizerConfig {
//!     auth: AuthConfig {
//!         session_expiry: Duration::days(1),
//!         ..Default::default()
//!     },
//!     base_url: "https://organizer.example.com/".to_owned(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use chrono::Duration;

use crate::crypto::DEFAULT_TOKEN_LENGTH;
use crate::{OrganizerError, SecretString};

/// Smallest token length accepted by [`OrganizerConfig::validate`].
pub const MIN_TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct OrganizerConfig {
    pub auth: AuthConfig,

    pub cookie: CookieConfig,

    /// Throttling of login-link requests. `None` disables it.
    pub throttle: Option<ThrottleConfig>,

    /// Public URL the application is served from, used in emailed links.
    pub base_url: String,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            cookie: CookieConfig::default(),
            throttle: Some(ThrottleConfig::default()),
            base_url: "http://localhost:8080/".to_owned(),
        }
    }
}

impl OrganizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for running on plain-HTTP localhost.
    ///
    /// Browsers drop `Secure` cookies on `http://`, so the flag is cleared.
    /// Throttling is disabled.
    pub fn development() -> Self {
        Self {
            cookie: CookieConfig {
                secure: false,
                ..CookieConfig::default()
            },
            throttle: None,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `OrganizerError::ConfigurationError` describing the first
    /// invalid setting.
    pub fn validate(&self) -> Result<(), OrganizerError> {
        self.auth.validate()?;

        if self.cookie.name.is_empty() {
            return Err(OrganizerError::ConfigurationError(
                "cookie name must not be empty".to_owned(),
            ));
        }
        if let Some(throttle) = &self.throttle {
            if throttle.max_requests == 0 || throttle.window <= Duration::zero() {
                return Err(OrganizerError::ConfigurationError(
                    "throttle needs a positive request limit and window".to_owned(),
                ));
            }
        }
        if self.base_url.is_empty() {
            return Err(OrganizerError::ConfigurationError(
                "base_url must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Token length and the three independent expiry windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    /// Number of random bytes per token.
    ///
    /// Default: 50
    pub token_length: usize,

    /// How long an emailed login link stays usable.
    ///
    /// Default: 10 minutes
    pub login_expiry: Duration,

    /// How long a session lives after creation, authenticated or not.
    ///
    /// Default: 7 days
    pub session_expiry: Duration,

    /// How long a CSRF token stays usable.
    ///
    /// Default: 10 minutes
    pub csrf_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_length: DEFAULT_TOKEN_LENGTH,
            login_expiry: Duration::minutes(10),
            session_expiry: Duration::days(7),
            csrf_expiry: Duration::minutes(10),
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn token_length(mut self, length: usize) -> Self {
        self.token_length = length;
        self
    }

    #[must_use]
    pub fn login_expiry(mut self, limit: Duration) -> Self {
        self.login_expiry = limit;
        self
    }

    #[must_use]
    pub fn session_expiry(mut self, limit: Duration) -> Self {
        self.session_expiry = limit;
        self
    }

    #[must_use]
    pub fn csrf_expiry(mut self, limit: Duration) -> Self {
        self.csrf_expiry = limit;
        self
    }

    fn validate(&self) -> Result<(), OrganizerError> {
        if self.token_length < MIN_TOKEN_LENGTH {
            return Err(OrganizerError::ConfigurationError(format!(
                "token_length must be at least {MIN_TOKEN_LENGTH} bytes"
            )));
        }
        for (name, limit) in [
            ("login_expiry", self.login_expiry),
            ("session_expiry", self.session_expiry),
            ("csrf_expiry", self.csrf_expiry),
        ] {
            if limit <= Duration::zero() {
                return Err(OrganizerError::ConfigurationError(format!(
                    "{name} must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    Lax,
    #[default]
    Strict,
}

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_owned(),
            path: "/".to_owned(),
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
        }
    }
}

/// Fixed-window limit on login-link requests per email address.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleConfig {
    /// Default: 5
    pub max_requests: u32,

    /// Default: 1 hour
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::hours(1),
        }
    }
}

/// SMTP settings for sending login links.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// `From` address. Defaults to `username`.
    pub sender: String,
}

impl MailConfig {
    /// Reads `MAIL_HOST`, `MAIL_PORT`, `MAIL_USER`, `MAIL_PASS` and the
    /// optional `MAIL_SENDER`.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::ConfigurationError` naming the missing or
    /// malformed variable.
    pub fn from_env() -> Result<Self, OrganizerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, OrganizerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                OrganizerError::ConfigurationError(format!("env var not set: {key}"))
            })
        };

        let host = required("MAIL_HOST")?;
        let port = required("MAIL_PORT")?.parse::<u16>().map_err(|_| {
            OrganizerError::ConfigurationError("MAIL_PORT must be a port number".to_owned())
        })?;
        let username = required("MAIL_USER")?;
        let password = SecretString::new(required("MAIL_PASS")?);
        let sender = lookup("MAIL_SENDER").unwrap_or_else(|| username.clone());

        Ok(Self {
            host,
            port,
            username,
            password,
            sender,
        })
    }
}
