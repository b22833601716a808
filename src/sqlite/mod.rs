//! `SQLite` database backend implementations.
//!
//! This module provides `SQLite`-backed implementations for all repository traits.
//! Enable the `sqlx_sqlite` feature to use these implementations.

mod event;
pub mod migrations;
mod registration;
mod user;

pub use event::SqliteEventRepository;
pub use registration::SqliteRegistrationRepository;
use sqlx::SqlitePool;
pub use user::SqliteUserRepository;

use crate::OrganizerError;

/// Creates all `SQLite` repository instances from a connection pool.
pub fn create_repositories(
    pool: SqlitePool,
) -> (
    SqliteUserRepository,
    SqliteEventRepository,
    SqliteRegistrationRepository,
) {
    (
        SqliteUserRepository::new(pool.clone()),
        SqliteEventRepository::new(pool.clone()),
        SqliteRegistrationRepository::new(pool),
    )
}

/// Logs a failed query and converts it to `OrganizerError::DatabaseError`.
pub(crate) fn db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> OrganizerError {
    move |e| {
        log::error!(target: "organizer", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
        OrganizerError::DatabaseError(e.to_string())
    }
}
