use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::routes::AppState;
use crate::Session;

/// Live session named by the `session` cookie, authenticated or not.
///
/// Requests without one are redirected to `/`.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Arc<Session>);

/// Like [`CurrentSession`], but the session must have completed a login.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub Arc<Session>);

pub(super) fn session_from_jar<U, E, R, M>(
    jar: &CookieJar,
    state: &AppState<U, E, R, M>,
) -> Option<Arc<Session>> {
    state
        .authenticator
        .session_from_cookie(jar.get(&state.cookie.name).map(Cookie::value))
}

impl<U, E, R, M> FromRequestParts<AppState<U, E, R, M>> for CurrentSession
where
    U: Send + Sync + 'static,
    E: Send + Sync + 'static,
    R: Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<U, E, R, M>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        session_from_jar(&jar, state)
            .map(CurrentSession)
            .ok_or_else(|| {
                log::debug!(target: "organizer", "msg=\"no live session\", path=\"{}\"", parts.uri.path());
                Redirect::to("/")
            })
    }
}

impl<U, E, R, M> FromRequestParts<AppState<U, E, R, M>> for AuthenticatedSession
where
    U: Send + Sync + 'static,
    E: Send + Sync + 'static,
    R: Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<U, E, R, M>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;

        if session.is_authenticated() {
            Ok(AuthenticatedSession(session))
        } else {
            log::debug!(target: "organizer", "msg=\"session not authenticated\", path=\"{}\"", parts.uri.path());
            Err(Redirect::to("/"))
        }
    }
}
