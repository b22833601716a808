use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::db_error;
use crate::{Event, EventId, EventRepository, NewEvent, OrganizerError, TimeScale, UserId};

#[derive(Clone)]
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const EVENT_COLUMNS: &str = "e.id, e.created_by, e.title, e.description, e.repeats_every, e.repeats_scale, \
     e.min_participants, e.max_participants, e.created_at, \
     (SELECT COUNT(*) FROM event_subscriptions s WHERE s.event_id = e.id AND s.deleted_at IS NULL) AS number_of_participants";

#[derive(FromRow)]
struct EventRecord {
    id: i64,
    created_by: i64,
    title: String,
    description: String,
    repeats_every: i64,
    repeats_scale: String,
    min_participants: Option<i64>,
    max_participants: Option<i64>,
    number_of_participants: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRecord> for Event {
    type Error = OrganizerError;

    fn try_from(row: EventRecord) -> Result<Self, Self::Error> {
        let repeats_scale = row.repeats_scale.parse::<TimeScale>().map_err(|_| {
            log::error!(target: "organizer", "msg=\"corrupt row\", table=\"events\", id={}", row.id);
            OrganizerError::DatabaseError(format!("unknown repeats_scale: {}", row.repeats_scale))
        })?;

        Ok(Event {
            id: EventId(row.id),
            created_by: UserId(row.created_by),
            title: row.title,
            description: row.description,
            repeats_every: row.repeats_every,
            repeats_scale,
            min_participants: row.min_participants,
            max_participants: row.max_participants,
            number_of_participants: row.number_of_participants,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, OrganizerError> {
        let row: Option<EventRecord> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ? AND e.deleted_at IS NULL"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_event"))?;

        row.map(Event::try_from).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, event), err))]
    async fn create_event(&self, event: NewEvent) -> Result<Event, OrganizerError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO events (created_by, title, description, repeats_every, repeats_scale, min_participants, max_participants, created_at, changed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(event.created_by.0)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.repeats_every)
        .bind(event.repeats_scale.as_str())
        .bind(event.min_participants)
        .bind(event.max_participants)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create_event"))?;

        Ok(Event {
            id: EventId(id),
            created_by: event.created_by,
            title: event.title,
            description: event.description,
            repeats_every: event.repeats_every,
            repeats_scale: event.repeats_scale,
            min_participants: event.min_participants,
            max_participants: event.max_participants,
            number_of_participants: 0,
            created_at: now,
        })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_events(&self) -> Result<Vec<Event>, OrganizerError> {
        let rows: Vec<EventRecord> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.deleted_at IS NULL ORDER BY e.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list_events"))?;

        rows.into_iter().map(Event::try_from).collect()
    }
}
