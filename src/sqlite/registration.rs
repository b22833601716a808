use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::db_error;
use crate::repository::stored_message;
use crate::{
    EventId, EventRegistration, EventRegistrationId, OrganizerError, RegistrationRepository,
    UserId,
};

#[derive(Clone)]
pub struct SqliteRegistrationRepository {
    pool: SqlitePool,
}

impl SqliteRegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RegistrationRecord {
    id: i64,
    user_id: i64,
    event_id: i64,
    message: Option<String>,
    created_at: DateTime<Utc>,
    changed_at: DateTime<Utc>,
}

impl From<RegistrationRecord> for EventRegistration {
    fn from(row: RegistrationRecord) -> Self {
        EventRegistration {
            id: EventRegistrationId(row.id),
            user: UserId(row.user_id),
            event: EventId(row.event_id),
            message: row.message,
            created_at: row.created_at,
            changed_at: row.changed_at,
        }
    }
}

#[async_trait]
impl RegistrationRepository for SqliteRegistrationRepository {
    /// One `INSERT .. ON CONFLICT DO UPDATE` inside a transaction. The write is
    /// the first statement, so concurrent calls for the same (user, event)
    /// pair wait on the busy timeout for the write lock. Returning early drops
    /// `tx`, which rolls it back.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, message), err))]
    async fn register_event(
        &self,
        user: UserId,
        event: EventId,
        message: &str,
    ) -> Result<EventRegistration, OrganizerError> {
        let message = stored_message(message);
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(db_error("register_event"))?;

        // deleted rows conflict too: the unique (user_id, event_id) index covers them
        let row: RegistrationRecord = sqlx::query_as(
            "INSERT INTO event_subscriptions (user_id, event_id, message, created_at, changed_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, event_id) DO UPDATE SET \
                 message = excluded.message, deleted_at = NULL, changed_at = excluded.changed_at \
             RETURNING id, user_id, event_id, message, created_at, changed_at",
        )
        .bind(user.0)
        .bind(event.0)
        .bind(&message)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("register_event"))?;

        tx.commit().await.map_err(db_error("register_event"))?;

        log::info!(target: "organizer", "msg=\"event registration saved\", user_id={user}, event_id={event}, registration_id={}", row.id);
        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn deregister_event(&self, id: EventRegistrationId) -> Result<(), OrganizerError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE event_subscriptions SET deleted_at = ?, changed_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("deregister_event"))?;

        if result.rows_affected() == 0 {
            return Err(OrganizerError::NotFound);
        }

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_registration(
        &self,
        id: EventRegistrationId,
    ) -> Result<Option<EventRegistration>, OrganizerError> {
        let row: Option<RegistrationRecord> = sqlx::query_as(
            "SELECT id, user_id, event_id, message, created_at, changed_at FROM event_subscriptions WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_registration"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn registrations_for_event(
        &self,
        event: EventId,
    ) -> Result<Vec<EventRegistration>, OrganizerError> {
        let rows: Vec<RegistrationRecord> = sqlx::query_as(
            "SELECT id, user_id, event_id, message, created_at, changed_at FROM event_subscriptions WHERE event_id = ? AND deleted_at IS NULL ORDER BY id",
        )
        .bind(event.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("registrations_for_event"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
