//! HTTP handlers for the organizer routes.

use axum::extract::{Query, State};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::CookieJar;

use super::cookie::{removal_cookie, session_cookie};
use super::error::AppError;
use super::middleware::{AuthenticatedSession, CurrentSession, session_from_jar};
use super::routes::AppState;
use crate::actions::{
    ConfirmLoginAction, CreateEventAction, DeregisterEventAction, LogoutAction,
    RegisterEventAction, RequestLoginAction, ShowEventAction,
};
use crate::api::{
    ConfirmLoginQuery, ConfirmLoginRequest, ConfirmLoginView, DeregisterRequest,
    DeregisteredView, EventQuery, EventSummary, EventView, EventsView, LandingView,
    LoginRequest, LoginSentView, MessageResponse, RegisterRequest, RegisteredView,
};
use crate::validators::EventForm;
use crate::{
    CsrfId, EventRepository, LoginId, Mailer, OrganizerError, RegistrationRepository,
    UserRepository,
};

const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

/// Landing page, or the event list for logged-in users.
///
/// GET /
pub async fn index<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    jar: CookieJar,
) -> Response
where
    U: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    let authenticated = session_from_jar(&jar, &state).is_some_and(|s| s.is_authenticated());

    if authenticated {
        Redirect::to("/events").into_response()
    } else {
        Json(LandingView { authenticated }).into_response()
    }
}

/// Start a login: mail a link and bind the browser to a new session.
///
/// POST /login
pub async fn login<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    jar: CookieJar,
    Form(body): Form<LoginRequest>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let login_expiry = state.authenticator.config().login_expiry;
    let action = RequestLoginAction::new(
        state.user_repo,
        state.mailer,
        state.authenticator,
        state.base_url,
    )
    .with_throttle(state.throttle);

    let session = action.execute(&body.email).await?;
    let jar = jar.add(session_cookie(&state.cookie, &session));

    Ok((
        jar,
        Json(LoginSentView {
            email: body.email.trim().to_owned(),
            expires_at: chrono::Utc::now() + login_expiry,
        }),
    ))
}

/// Confirmation page behind the emailed link.
///
/// GET /auth?token=
pub async fn confirm_login_view(
    CurrentSession(session): CurrentSession,
    Query(query): Query<ConfirmLoginQuery>,
) -> Result<Json<ConfirmLoginView>, AppError> {
    let token = LoginId::new(query.token);
    let csrf = ConfirmLoginAction::new().prepare(&session, &token)?;

    Ok(Json(ConfirmLoginView {
        token: token.as_str().into(),
        csrf: csrf.value().clone(),
    }))
}

/// Complete the login.
///
/// POST /auth
pub async fn confirm_login(
    CurrentSession(session): CurrentSession,
    Form(body): Form<ConfirmLoginRequest>,
) -> Result<Redirect, AppError> {
    ConfirmLoginAction::new().confirm(
        &session,
        &LoginId::new(body.token),
        &CsrfId::new(body.csrf),
    )?;

    Ok(Redirect::to("/"))
}

/// End the session and clear the cookie.
///
/// POST /logout
pub async fn logout<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
) -> impl IntoResponse
where
    U: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    LogoutAction::new().execute(&session);

    (
        StatusCode::OK,
        jar.add(removal_cookie(&state.cookie)),
        [(HX_REDIRECT, "/")],
        Json(MessageResponse {
            message: "Successfully logged out".to_owned(),
        }),
    )
}

/// GET /events
pub async fn list_events<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> Result<Json<EventsView>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EventRepository + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    let user = state
        .user_repo
        .find_user_by_id(session.user())
        .await?
        .ok_or(OrganizerError::NotFound)?;
    let events = state.event_repo.list_events().await?;

    Ok(Json(EventsView {
        user: user.display_name().to_owned(),
        events: events.into_iter().map(EventSummary::from).collect(),
    }))
}

/// GET /event?id=
pub async fn show_event<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Query(query): Query<EventQuery>,
) -> Result<Json<EventView>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EventRepository + Clone + Send + Sync + 'static,
    R: RegistrationRepository + Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    let action = ShowEventAction::new(state.user_repo, state.event_repo, state.registration_repo);
    let overview = action.execute(&session, &query.id).await?;

    Ok(Json(EventView::from(overview)))
}

/// POST /create
pub async fn create_event<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Form(form): Form<EventForm>,
) -> Result<impl IntoResponse, AppError>
where
    U: Clone + Send + Sync + 'static,
    E: EventRepository + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    let event = CreateEventAction::new(state.event_repo)
        .execute(session.user(), form)
        .await?;
    let location = format!("/event?id={}", event.id);

    Ok((
        StatusCode::CREATED,
        [(HX_REDIRECT, location)],
        Json(EventSummary::from(event)),
    ))
}

/// POST /event/register
pub async fn register_event<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Form(body): Form<RegisterRequest>,
) -> Result<Json<RegisteredView>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    E: EventRepository + Clone + Send + Sync + 'static,
    R: RegistrationRepository + Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    let action = RegisterEventAction::new(state.event_repo, state.registration_repo);
    let registered = action
        .execute(
            &session,
            &CsrfId::new(body.csrf),
            &body.event,
            &body.message,
        )
        .await?;

    let user = state
        .user_repo
        .find_user_by_id(session.user())
        .await?
        .ok_or(OrganizerError::NotFound)?;

    Ok(Json(RegisteredView::new(&user, registered)))
}

/// POST /event/deregister
pub async fn deregister_event<U, E, R, M>(
    State(state): State<AppState<U, E, R, M>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Form(body): Form<DeregisterRequest>,
) -> Result<Json<DeregisteredView>, AppError>
where
    U: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    R: RegistrationRepository + Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    let done = DeregisterEventAction::new(state.registration_repo)
        .execute(
            &session,
            &CsrfId::new(body.csrf),
            &body.subscription_id,
        )
        .await?;

    Ok(Json(DeregisteredView::from(done)))
}
