use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;
use crate::OrganizerError;

row_id!(
    /// Primary key of an event.
    EventId
);

/// Unit of an event's repetition interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    #[default]
    Never,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl TimeScale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeScale {
    type Err = OrganizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(OrganizerError::BadRequest(format!("unknown time scale: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub created_by: UserId,
    pub title: String,
    pub description: String,
    pub repeats_every: i64,
    pub repeats_scale: TimeScale,
    pub min_participants: Option<i64>,
    pub max_participants: Option<i64>,
    /// Live registrations at the time the event was loaded.
    pub number_of_participants: i64,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.max_participants
            .is_some_and(|max| self.number_of_participants >= max)
    }
}

/// Validated input for [`EventRepository::create_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub created_by: UserId,
    pub title: String,
    pub description: String,
    pub repeats_every: i64,
    pub repeats_scale: TimeScale,
    pub min_participants: Option<i64>,
    pub max_participants: Option<i64>,
}

#[async_trait]
pub trait EventRepository {
    /// Returns the event with its live participant count, unless deleted.
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, OrganizerError>;

    async fn create_event(&self, event: NewEvent) -> Result<Event, OrganizerError>;

    /// All live events, oldest first.
    async fn list_events(&self) -> Result<Vec<Event>, OrganizerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale_parse() {
        for scale in [
            TimeScale::Never,
            TimeScale::Daily,
            TimeScale::Weekly,
            TimeScale::Monthly,
            TimeScale::Yearly,
        ] {
            assert_eq!(scale.as_str().parse::<TimeScale>().unwrap(), scale);
        }
    }

    #[test]
    fn test_time_scale_unknown_is_bad_request() {
        assert!(matches!(
            "fortnightly".parse::<TimeScale>(),
            Err(OrganizerError::BadRequest(_))
        ));
        assert!("Daily".parse::<TimeScale>().is_err());
    }

    #[test]
    fn test_time_scale_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TimeScale::Weekly).unwrap(), "\"weekly\"");
    }

    #[test]
    fn test_is_full() {
        let mut event = Event {
            id: EventId(1),
            created_by: UserId(1),
            title: "Board games".to_owned(),
            description: String::new(),
            repeats_every: 1,
            repeats_scale: TimeScale::Weekly,
            min_participants: None,
            max_participants: Some(2),
            number_of_participants: 1,
            created_at: Utc::now(),
        };
        assert!(!event.is_full());

        event.number_of_participants = 2;
        assert!(event.is_full());

        event.max_participants = None;
        assert!(!event.is_full());
    }
}
