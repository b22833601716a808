//! Throttling of login-link requests.
//!
//! Every request for a login link sends an email, so requests are counted
//! per address in a fixed window.

mod store;

use std::sync::Arc;

pub use store::{InMemoryStore, RateLimitInfo, RateLimitStore};

use crate::OrganizerError;
use crate::config::ThrottleConfig;

/// Fixed-window limit on login links per email address.
#[derive(Clone)]
pub struct LoginThrottle {
    store: Arc<dyn RateLimitStore>,
    config: ThrottleConfig,
}

impl LoginThrottle {
    pub fn new(store: Arc<dyn RateLimitStore>, config: ThrottleConfig) -> Self {
        Self { store, config }
    }

    pub fn in_memory(config: ThrottleConfig) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), config)
    }

    fn key(email: &str) -> String {
        format!("login_link:{}", email.to_lowercase())
    }

    /// Counts one request for `email`.
    ///
    /// # Errors
    ///
    /// Returns `OrganizerError::TooManyAttempts` once more than
    /// `max_requests` were made within the current window.
    pub async fn hit(&self, email: &str) -> Result<(), OrganizerError> {
        let info = self.store.increment(&Self::key(email), self.config.window).await?;

        if info.attempts > self.config.max_requests {
            log::warn!(
                target: "organizer",
                "msg=\"login link throttled\", attempts={}, retry_after={}",
                info.attempts,
                info.available_in()
            );
            return Err(OrganizerError::TooManyAttempts);
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoginThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginThrottle")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
