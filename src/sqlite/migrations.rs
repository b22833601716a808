//! Embedded database migrations for `SQLite`.
//!
//! Migrations are embedded at compile time and tracked in the
//! `_organizer_migrations` table, so running them twice is a no-op.
//!
//! # Example
//!
//! ```rust,ignore
//! use organizer::sqlite::migrations;
//! use sqlx::SqlitePool;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250301000001_create_users_table",
        include_str!("../../migrations_sqlite/20250301000001_create_users_table.sql"),
    ),
    (
        "20250301000002_create_events_table",
        include_str!("../../migrations_sqlite/20250301000002_create_events_table.sql"),
    ),
    (
        "20250301000003_create_event_subscriptions_table",
        include_str!("../../migrations_sqlite/20250301000003_create_event_subscriptions_table.sql"),
    ),
];

/// Runs all pending migrations in order.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    apply(pool, MIGRATIONS).await
}

/// Applies each migration and its bookkeeping row in one transaction, so a
/// failing file leaves neither a partial schema nor a record behind.
async fn apply(pool: &SqlitePool, migrations: &[(&str, &str)]) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _organizer_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    let applied: Vec<String> = sqlx::query_scalar("SELECT name FROM _organizer_migrations")
        .fetch_all(pool)
        .await?;

    for (name, sql) in migrations {
        if applied.iter().any(|done| done == name) {
            continue;
        }

        let mut tx = pool.begin().await?;
        // the bundled files keep `;` out of literals
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            (&mut *tx).execute(statement).await.inspect_err(|e| {
                log::error!(target: "organizer", "msg=\"migration failed\", name=\"{name}\", error=\"{e}\"");
            })?;
        }
        sqlx::query("INSERT INTO _organizer_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::debug!(target: "organizer", "msg=\"migration applied\", name=\"{name}\"");
    }
    Ok(())
}
