use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::OrganizerError;

#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub attempts: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    pub fn available_in(&self) -> i64 {
        (self.reset_at - Utc::now()).num_seconds().max(0)
    }
}

/// implement this trait to share counters between processes
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// creates key with 1 attempt if it doesn't exist or its window is over
    async fn increment(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<RateLimitInfo, OrganizerError>;
}

/// Fixed-window counters held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error() -> OrganizerError {
    log::error!(target: "organizer", "msg=\"rate limit store lock poisoned\"");
    OrganizerError::DatabaseError("Failed to acquire lock".to_owned())
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl RateLimitStore for InMemoryStore {
    async fn increment(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<RateLimitInfo, OrganizerError> {
        let now = Utc::now();
        let mut entries = self.entries.write().map_err(|_| lock_error())?;

        let info = entries
            .entry(key.to_owned())
            .and_modify(|info| {
                if info.reset_at <= now {
                    info.attempts = 1;
                    info.reset_at = now + window;
                } else {
                    info.attempts = info.attempts.saturating_add(1);
                }
            })
            .or_insert_with(|| RateLimitInfo {
                attempts: 1,
                reset_at: now + window,
            });

        Ok(info.clone())
    }
}
