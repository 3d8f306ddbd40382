use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::context;
use platform_authz::ProjectListing;
use products_hr::search::ListFilter;

use super::page;
use crate::{http::{AppState, HttpResult}, session::CurrentUser};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/home", get(landing))
        .route("/home/dashboard", get(dashboard))
        .route("/home/employees", get(employees))
        .route("/home/departements", get(departements))
        .route("/home/projets", get(projets))
        .route("/home/fiches-paie", get(fiches))
        .route("/home/statistics", get(statistics))
}

async fn landing(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    page(&state, jar, &user, "home.html", context! {})
}

async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    let employee_count = state.hr.employee_count(&state.db).await?;
    page(&state, jar, &user, "dashboard.html", context! { employee_count })
}

async fn employees(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    super::employees::list_page(&state, jar, &user, &filter).await
}

async fn departements(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    super::departements::list_page(&state, jar, &user, &filter).await
}

/// Chefs de département see every project here, unlike `/projets`.
async fn projets(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    super::projets::list_page(&state, jar, &user, ProjectListing::Dashboard, &filter).await
}

async fn fiches(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    super::fiches::list_page(&state, jar, &user, &filter).await
}

async fn statistics(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    let stats = state.hr.statistics(&state.db).await?;
    page(&state, jar, &user, "statistics.html", context! { stats })
}
