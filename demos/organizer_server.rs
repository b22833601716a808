#![allow(
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::str_to_string,
    clippy::missing_docs_in_private_items,
    clippy::doc_markdown
)]

//! Organizer Server Example
//!
//! Runs the full application on SQLite with passwordless email login.
//!
//! Run with: `cargo run --example organizer_server`
//!
//! Environment variables (a `.env` file is read if present):
//!   DATABASE_URL=sqlite:./organizer.db (optional, created if missing)
//!   BASE_URL=http://localhost:8080/   (public address used in login links)
//!   BIND_ADDR=127.0.0.1:8080
//!   SEED_USER=ada@example.com         (optional, creates the account on startup)
//!   MAIL_HOST, MAIL_PORT, MAIL_USER, MAIL_PASS, MAIL_SENDER
//!                                     (optional, without them links are logged)
//!   RUST_LOG=organizer=debug
//!
//! Test endpoints:
//!   curl -i -X POST http://localhost:8080/login -d 'email=ada@example.com'
//!   # open the logged link with the returned session cookie, then
//!   curl -i -X POST http://localhost:8080/auth -b 'session=...' -d 'token=...&csrf=...'

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use organizer::api::axum::{AppState, organizer_routes};
use organizer::config::{MailConfig, OrganizerConfig};
use organizer::mail::{LogMailer, Mailer, SmtpMailer};
use organizer::sqlite::{create_repositories, migrations};
use organizer::UserRepository;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Also captures `log` records from the library
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "organizer=info".into()),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./organizer.db".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let mut config = OrganizerConfig::development();
    if let Ok(base_url) = std::env::var("BASE_URL") {
        config.base_url = base_url;
    }
    config.validate().expect("Invalid configuration");

    // Every pooled connection must see the same database, so no `:memory:`
    let options = SqliteConnectOptions::from_str(&database_url)
        .expect("Invalid DATABASE_URL")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to create pool");

    // Run migrations
    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    let (user_repo, event_repo, registration_repo) = create_repositories(pool);

    if let Ok(email) = std::env::var("SEED_USER") {
        if user_repo.find_user_by_email(&email).await.unwrap().is_none() {
            let name = email.split('@').next().unwrap_or(&email).to_string();
            user_repo.create_user(&name, &email).await.unwrap();
        }
    }

    let mailer: Arc<dyn Mailer> = match MailConfig::from_env() {
        Ok(mail) => Arc::new(
            SmtpMailer::new(&mail, config.auth.login_expiry).expect("Invalid mail settings"),
        ),
        Err(_) => {
            println!("MAIL_* not set, login links are written to the log");
            Arc::new(LogMailer)
        }
    };

    let state = AppState::new(&config, user_repo, event_repo, registration_repo, mailer);

    // Evicts expired sessions; lookups already ignore them
    let _sweeper = state.authenticator.spawn_sweeper(Duration::from_secs(300));

    let app = organizer_routes().with_state(state);

    println!("Starting organizer on http://{bind_addr}");
    println!("Database: {database_url}");
    println!("Endpoints:");
    println!("  GET  /                  - Landing page");
    println!("  POST /login             - Mail a login link");
    println!("  GET  /auth?token=       - Confirmation form");
    println!("  POST /auth              - Complete login");
    println!("  POST /logout            - End session");
    println!("  GET  /events            - List events");
    println!("  GET  /event?id=         - Show event");
    println!("  POST /create            - Create event");
    println!("  POST /event/register    - Register for event");
    println!("  POST /event/deregister  - Remove registration");

    let listener = TcpListener::bind(&bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
