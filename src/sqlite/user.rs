use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::db_error;
use crate::{OrganizerError, User, UserId, UserRepository};

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    display: Option<String>,
    email: String,
    icon: Option<String>,
    created_at: DateTime<Utc>,
    changed_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: UserId(row.id),
            name: row.name,
            display: row.display,
            email: row.email,
            icon: row.icon,
            created_at: row.created_at,
            changed_at: row.changed_at,
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, OrganizerError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, name, display, email, icon, created_at, changed_at FROM users WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_user_by_id"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, OrganizerError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, name, display, email, icon, created_at, changed_at FROM users WHERE email = ? AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find_user_by_email"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn create_user(&self, name: &str, email: &str) -> Result<User, OrganizerError> {
        let now = Utc::now();
        let row: UserRecord = sqlx::query_as(
            "INSERT INTO users (name, email, created_at, changed_at) VALUES (?, ?, ?, ?) RETURNING id, name, display, email, icon, created_at, changed_at",
        )
        .bind(name)
        .bind(email)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create_user"))?;

        Ok(row.into())
    }
}
