use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;
use minijinja::context;
use platform_authn::Credentials;
use products_hr::sessions;
use serde::Deserialize;

use crate::{
    http::{AppState, HttpError, HttpResult},
    session::{SESSION_COOKIE, removal, session_cookie, session_id},
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
}

/// `?error` and `?logout` are flags; their values are ignored.
#[derive(Debug, Default, Deserialize)]
struct LoginQuery {
    error: Option<String>,
    logout: Option<String>,
}

async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> HttpResult<Response> {
    let html = state.views.render(
        "login.html",
        None,
        None,
        context! {
            error => query.error.is_some(),
            logout => query.logout.is_some(),
        },
    )?;
    Ok(html.into_response())
}

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(credentials): Form<Credentials>,
) -> HttpResult<Response> {
    let opened = sessions::login(&state.db, &state.config.session, &credentials, Utc::now())
        .await
        .map_err(HttpError::internal)?;
    Ok(match opened {
        Some(id) => {
            let jar = jar.add(session_cookie(&state.config, id));
            (jar, Redirect::to("/home")).into_response()
        }
        None => Redirect::to("/login?error").into_response(),
    })
}

async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> HttpResult<Response> {
    if let Some(id) = session_id(&jar) {
        sessions::logout(&state.db, id)
            .await
            .map_err(HttpError::internal)?;
        tracing::info!(session_id = %id, "session closed");
    }
    let jar = jar.remove(removal(SESSION_COOKIE));
    Ok((jar, Redirect::to("/login?logout")).into_response())
}
