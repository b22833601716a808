// these tests use #[serial] to run sequentially because setup_db() recreates
// the database each time. without serial, parallel tests would interfere
// with each other's data.
#![allow(clippy::indexing_slicing)]

//! End-to-end tests for `SQLite` repositories.
//!
//! These tests use an in-memory `SQLite` database.
//! Run with: `cargo test --features sqlx_sqlite --test e2e_sqlite`

#![cfg(feature = "sqlx_sqlite")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use organizer::actions::{DeregisterEventAction, RegisterEventAction};
use organizer::sqlite::{
    SqliteEventRepository, SqliteRegistrationRepository, SqliteUserRepository, migrations,
};
use organizer::{
    Authenticator, CsrfId, EventId, EventRegistration, EventRepository, LoginId, NewEvent,
    OrganizerError, RegistrationRepository, Session, TimeScale, User, UserId, UserRepository,
};
use serial_test::serial;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::collections::HashMap;
use std::time::Duration;

async fn setup_db() -> SqlitePool {
    // Use in-memory database for testing
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory SQLite database");

    // Run migrations
    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// File-backed database with a multi-connection pool, so concurrent writers
/// really contend for the write lock.
async fn setup_file_db(dir: &tempfile::TempDir) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("organizer.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .expect("Failed to open file-backed SQLite database");

    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

fn new_event(created_by: UserId, max_participants: Option<i64>) -> NewEvent {
    NewEvent {
        created_by,
        title: "Board games".to_owned(),
        description: "Bring your own".to_owned(),
        repeats_every: 2,
        repeats_scale: TimeScale::Weekly,
        min_participants: None,
        max_participants,
    }
}

async fn seed_user(repo: &SqliteUserRepository, name: &str) -> User {
    repo.create_user(name, &format!("{name}@example.com"))
        .await
        .expect("Failed to create user")
}

/// Authenticated session with a fresh CSRF value.
fn logged_in(auth: &Authenticator, user: UserId) -> (std::sync::Arc<Session>, CsrfId) {
    let session = auth.create_session(user).unwrap();
    let login = session.request_login().unwrap();
    assert!(session.invalidate_login(&LoginId::new(login.value().expose_secret())));
    let csrf = session.request_csrf().unwrap();
    (session, CsrfId::new(csrf.value().expose_secret()))
}

#[tokio::test]
#[serial]
async fn test_migrations_are_idempotent() {
    let pool = setup_db().await;

    migrations::run(&pool)
        .await
        .expect("Running migrations twice should succeed");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _organizer_migrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(applied, 3);
}

#[tokio::test]
#[serial]
async fn test_user_repository() {
    let pool = setup_db().await;
    let repo = SqliteUserRepository::new(pool);

    let user = seed_user(&repo, "ada").await;
    assert_eq!(user.email, "ada@example.com");
    assert!(user.id.0 > 0);
    assert_eq!(user.display_name(), "ada");

    let found = repo
        .find_user_by_email("ada@example.com")
        .await
        .expect("Failed to find user")
        .expect("User not found");
    assert_eq!(found.id, user.id);

    let found = repo
        .find_user_by_id(user.id)
        .await
        .expect("Failed to find user")
        .expect("User not found");
    assert_eq!(found.name, "ada");

    assert!(repo.find_user_by_id(UserId(999)).await.unwrap().is_none());
    assert!(
        repo.find_user_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
async fn test_duplicate_email_is_rejected() {
    let pool = setup_db().await;
    let repo = SqliteUserRepository::new(pool);

    seed_user(&repo, "ada").await;
    let result = repo.create_user("Other Ada", "ada@example.com").await;

    assert!(matches!(result, Err(OrganizerError::DatabaseError(_))));
}

#[tokio::test]
#[serial]
async fn test_event_repository() {
    let pool = setup_db().await;
    let users = SqliteUserRepository::new(pool.clone());
    let events = SqliteEventRepository::new(pool);
    let ada = seed_user(&users, "ada").await;

    let created = events
        .create_event(new_event(ada.id, Some(4)))
        .await
        .expect("Failed to create event");
    assert_eq!(created.title, "Board games");
    assert_eq!(created.repeats_scale, TimeScale::Weekly);
    assert_eq!(created.max_participants, Some(4));
    assert_eq!(created.min_participants, None);
    assert_eq!(created.number_of_participants, 0);

    let found = events
        .find_event(created.id)
        .await
        .unwrap()
        .expect("Event not found");
    assert_eq!(found.id, created.id);
    assert_eq!(found.description, "Bring your own");
    assert_eq!(found.repeats_every, 2);
    assert_eq!(found.max_participants, Some(4));

    events.create_event(new_event(ada.id, None)).await.unwrap();
    let all = events.list_events().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, created.id);
}

#[tokio::test]
#[serial]
async fn test_register_event_is_an_upsert() {
    let pool = setup_db().await;
    let users = SqliteUserRepository::new(pool.clone());
    let events = SqliteEventRepository::new(pool.clone());
    let repo = SqliteRegistrationRepository::new(pool.clone());
    let ada = seed_user(&users, "ada").await;
    let event = events.create_event(new_event(ada.id, Some(1))).await.unwrap();

    let first = repo.register_event(ada.id, event.id, "see you").await.unwrap();
    let second = repo.register_event(ada.id, event.id, "").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.message.as_deref(), Some("see you"));
    assert_eq!(second.message, None);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_subscriptions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let event = events.find_event(event.id).await.unwrap().unwrap();
    assert_eq!(event.number_of_participants, 1);
    assert!(event.is_full());
}

#[tokio::test]
#[serial]
async fn test_deregister_and_register_again() {
    let pool = setup_db().await;
    let users = SqliteUserRepository::new(pool.clone());
    let events = SqliteEventRepository::new(pool.clone());
    let repo = SqliteRegistrationRepository::new(pool);
    let ada = seed_user(&users, "ada").await;
    let bob = seed_user(&users, "bob").await;
    let event = events.create_event(new_event(ada.id, None)).await.unwrap();

    let ada_reg = repo.register_event(ada.id, event.id, "").await.unwrap();
    repo.register_event(bob.id, event.id, "maybe").await.unwrap();

    repo.deregister_event(ada_reg.id).await.unwrap();
    assert!(repo.find_registration(ada_reg.id).await.unwrap().is_none());
    assert_eq!(
        repo.deregister_event(ada_reg.id).await.unwrap_err(),
        OrganizerError::NotFound
    );

    let live = repo.registrations_for_event(event.id).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].user, bob.id);
    assert_eq!(
        events
            .find_event(event.id)
            .await
            .unwrap()
            .unwrap()
            .number_of_participants,
        1
    );

    let back = repo.register_event(ada.id, event.id, "back").await.unwrap();
    assert_eq!(back.id, ada_reg.id);
    assert_eq!(repo.registrations_for_event(event.id).await.unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn test_deregister_unknown_registration() {
    let pool = setup_db().await;
    let repo = SqliteRegistrationRepository::new(pool);

    let result = repo
        .deregister_event(organizer::EventRegistrationId(42))
        .await;
    assert_eq!(result.unwrap_err(), OrganizerError::NotFound);
}

#[tokio::test]
#[serial]
async fn test_registration_actions_against_sqlite() {
    let pool = setup_db().await;
    let users = SqliteUserRepository::new(pool.clone());
    let events = SqliteEventRepository::new(pool.clone());
    let registrations = SqliteRegistrationRepository::new(pool);
    let ada = seed_user(&users, "ada").await;
    let bob = seed_user(&users, "bob").await;
    let event = events.create_event(new_event(ada.id, None)).await.unwrap();

    let auth = Authenticator::default();
    let (session, csrf) = logged_in(&auth, bob.id);

    let register = RegisterEventAction::new(events.clone(), registrations.clone());
    let registered = register
        .execute(&session, &csrf, &event.id.to_string(), "hello")
        .await
        .unwrap();
    assert_eq!(registered.registration.user, bob.id);

    // the consumed CSRF value cannot be replayed
    let replay = register
        .execute(&session, &csrf, &event.id.to_string(), "again")
        .await;
    assert!(matches!(replay, Err(OrganizerError::Unauthorized(_))));

    // a different user cannot remove bob's registration
    let (intruder, intruder_csrf) = logged_in(&auth, ada.id);
    let deregister = DeregisterEventAction::new(registrations.clone());
    let result = deregister
        .execute(
            &intruder,
            &intruder_csrf,
            &registered.registration.id.to_string(),
        )
        .await;
    assert_eq!(result.unwrap_err(), OrganizerError::NotFound);

    let next = CsrfId::new(registered.csrf.value().expose_secret());
    let done = deregister
        .execute(&session, &next, &registered.registration.id.to_string())
        .await
        .unwrap();
    assert_eq!(done.event, event.id);
    assert!(
        registrations
            .registrations_for_event(event.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[serial]
async fn test_message_length_constraint() {
    let pool = setup_db().await;
    let users = SqliteUserRepository::new(pool.clone());
    let events = SqliteEventRepository::new(pool.clone());
    let repo = SqliteRegistrationRepository::new(pool);
    let ada = seed_user(&users, "ada").await;
    let event = events.create_event(new_event(ada.id, None)).await.unwrap();

    let result = repo
        .register_event(ada.id, event.id, &"x".repeat(513))
        .await;
    assert!(matches!(result, Err(OrganizerError::DatabaseError(_))));
    assert!(
        repo.registrations_for_event(event.id)
            .await
            .unwrap()
            .is_empty()
    );
}

/// Fires `per_pair` simultaneous registrations for every pair and returns
/// the results grouped by pair.
async fn register_concurrently(
    repo: &SqliteRegistrationRepository,
    pairs: &[(UserId, EventId)],
    per_pair: usize,
) -> HashMap<(UserId, EventId), Vec<EventRegistration>> {
    let mut handles = Vec::new();
    for &(user, event) in pairs {
        for i in 0..per_pair {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let result = repo.register_event(user, event, &format!("m{i}")).await;
                ((user, event), result)
            }));
        }
    }

    let mut grouped: HashMap<_, Vec<_>> = HashMap::new();
    let mut failures = Vec::new();
    for handle in handles {
        let (pair, result) = handle.await.unwrap();
        match result {
            Ok(registration) => grouped.entry(pair).or_default().push(registration),
            Err(e) => failures.push(e),
        }
    }
    assert!(failures.is_empty(), "concurrent registrations failed: {failures:?}");
    grouped
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_registrations_resolve_to_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_file_db(&dir).await;
    let users = SqliteUserRepository::new(pool.clone());
    let events = SqliteEventRepository::new(pool.clone());
    let repo = SqliteRegistrationRepository::new(pool.clone());

    let host = seed_user(&users, "host").await;
    let mut event_ids = Vec::new();
    for _ in 0..5 {
        event_ids.push(events.create_event(new_event(host.id, None)).await.unwrap().id);
    }
    let mut pairs = Vec::new();
    for name in ["ada", "bob", "cyd", "dee"] {
        let user = seed_user(&users, name).await;
        pairs.extend(event_ids.iter().map(|&event| (user.id, event)));
    }

    // first registrations race on the insert
    let inserted = register_concurrently(&repo, &pairs, 4).await;
    assert_eq!(inserted.len(), pairs.len());
    for (pair, registrations) in &inserted {
        assert_eq!(registrations.len(), 4);
        assert!(registrations.iter().all(|r| r.id == registrations[0].id), "{pair:?}");
    }

    // a second burst races on the update path and keeps every id
    let updated = register_concurrently(&repo, &pairs, 4).await;
    for (pair, registrations) in &updated {
        let first_id = inserted[pair][0].id;
        assert!(registrations.iter().all(|r| r.id == first_id), "{pair:?}");
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_subscriptions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, i64::try_from(pairs.len()).unwrap());

    for event in &event_ids {
        let live = repo.registrations_for_event(*event).await.unwrap();
        assert_eq!(live.len(), 4);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_registration_revives_deleted_row() {
    let dir = tempfile::tempdir().unwrap();
    let pool = setup_file_db(&dir).await;
    let users = SqliteUserRepository::new(pool.clone());
    let events = SqliteEventRepository::new(pool.clone());
    let repo = SqliteRegistrationRepository::new(pool);

    let ada = seed_user(&users, "ada").await;
    let event = events.create_event(new_event(ada.id, None)).await.unwrap();
    let original = repo.register_event(ada.id, event.id, "").await.unwrap();
    repo.deregister_event(original.id).await.unwrap();

    let revived = register_concurrently(&repo, &[(ada.id, event.id)], 8).await;

    assert!(revived[&(ada.id, event.id)].iter().all(|r| r.id == original.id));
    let live = repo.registrations_for_event(event.id).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, original.id);
}
