use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use super::handlers;
use crate::config::{CookieConfig, OrganizerConfig};
use crate::rate_limit::LoginThrottle;
use crate::{Authenticator, EventRepository, Mailer, RegistrationRepository, UserRepository};

#[derive(Clone)]
pub struct AppState<U, E, R, M> {
    pub authenticator: Arc<Authenticator>,
    pub user_repo: U,
    pub event_repo: E,
    pub registration_repo: R,
    pub mailer: M,
    pub cookie: CookieConfig,
    pub base_url: String,
    pub throttle: Option<LoginThrottle>,
}

impl<U, E, R, M> AppState<U, E, R, M> {
    /// Builds a fresh session registry and, when configured, an in-memory
    /// login throttle.
    pub fn new(
        config: &OrganizerConfig,
        user_repo: U,
        event_repo: E,
        registration_repo: R,
        mailer: M,
    ) -> Self {
        Self {
            authenticator: Arc::new(Authenticator::new(config.auth)),
            user_repo,
            event_repo,
            registration_repo,
            mailer,
            cookie: config.cookie.clone(),
            base_url: config.base_url.clone(),
            throttle: config.throttle.map(LoginThrottle::in_memory),
        }
    }
}

/// All routes of the application.
pub fn organizer_routes<U, E, R, M>() -> Router<AppState<U, E, R, M>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EventRepository + Clone + Send + Sync + 'static,
    R: RegistrationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    Router::new().merge(public_routes()).merge(private_routes())
}

/// Landing page and the login flow. Anyone may call these.
pub fn public_routes<U, E, R, M>() -> Router<AppState<U, E, R, M>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EventRepository + Clone + Send + Sync + 'static,
    R: RegistrationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::index::<U, E, R, M>))
        .route("/login", post(handlers::login::<U, E, R, M>))
        .route(
            "/auth",
            get(handlers::confirm_login_view).post(handlers::confirm_login),
        )
        .route("/logout", post(handlers::logout::<U, E, R, M>))
}

/// Event pages. These require an authenticated session.
pub fn private_routes<U, E, R, M>() -> Router<AppState<U, E, R, M>>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EventRepository + Clone + Send + Sync + 'static,
    R: RegistrationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/events", get(handlers::list_events::<U, E, R, M>))
        .route("/event", get(handlers::show_event::<U, E, R, M>))
        .route("/create", post(handlers::create_event::<U, E, R, M>))
        .route(
            "/event/register",
            post(handlers::register_event::<U, E, R, M>),
        )
        .route(
            "/event/deregister",
            post(handlers::deregister_event::<U, E, R, M>),
        )
}
