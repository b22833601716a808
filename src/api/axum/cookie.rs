//! The `session` cookie.
//!
//! The cookie carries only the session identifier. Login and CSRF values
//! never leave the server as cookies.

use axum_extra::extract::cookie::{Cookie, SameSite as CookieSameSite};
use time::OffsetDateTime;

use crate::Session;
use crate::config::{CookieConfig, SameSite};

fn same_site(value: SameSite) -> CookieSameSite {
    match value {
        SameSite::None => CookieSameSite::None,
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::Strict => CookieSameSite::Strict,
    }
}

/// Cookie binding the browser to `session`, expiring with it.
pub fn session_cookie(config: &CookieConfig, session: &Session) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.name.clone(), session.id().as_str().to_owned()))
        .path(config.path.clone())
        .secure(config.secure)
        .http_only(config.http_only)
        .same_site(same_site(config.same_site))
        .build();

    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(session.expires_at().timestamp()) {
        cookie.set_expires(expires);
    }
    cookie
}

/// Overwrites the session cookie with an already expired, empty one.
pub fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((config.name.clone(), String::new()))
        .path(config.path.clone())
        .secure(config.secure)
        .http_only(config.http_only)
        .same_site(same_site(config.same_site))
        .max_age(time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
