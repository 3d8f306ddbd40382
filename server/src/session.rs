//! Session and flash cookies, plus the [`CurrentUser`] extractor.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::Utc;
use platform_api::Flash;
use platform_authz::Principal;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::http::{AppState, HttpError};

pub const SESSION_COOKIE: &str = "rh_session";
pub const FLASH_COOKIE: &str = "rh_flash";

/// The signed-in employee. Requests without a live session are sent to `/login`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub session_id: Uuid,
    pub principal: Principal,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let Some(session_id) = session_id(&jar) else {
            return Err(Redirect::to("/login").into_response());
        };
        let principal = products_hr::sessions::resolve(&state.db, session_id, Utc::now())
            .await
            .map_err(|err| HttpError::internal(err).into_response())?;
        match principal {
            Some(principal) => Ok(Self {
                session_id,
                principal,
            }),
            None => {
                let jar = jar.remove(removal(SESSION_COOKIE));
                Err((jar, Redirect::to("/login")).into_response())
            }
        }
    }
}

pub fn session_id(jar: &PrivateCookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

pub fn session_cookie(config: &AppConfig, id: Uuid) -> Cookie<'static> {
    let max_age = time::Duration::seconds(config.session.ttl().num_seconds());
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Stores a flash message for the next rendered page.
pub fn with_flash(jar: PrivateCookieJar, config: &AppConfig, flash: Flash) -> PrivateCookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, flash.encode()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Reads and clears the pending flash message.
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = Flash::decode(cookie.value());
    (jar.remove(removal(FLASH_COOKIE)), flash)
}

/// Redirect carrying a flash message.
pub fn flash_redirect(
    jar: PrivateCookieJar,
    config: &AppConfig,
    flash: Flash,
    to: &str,
) -> Response {
    (with_flash(jar, config, flash), Redirect::to(to)).into_response()
}
