use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use entity::projet::Etat;
use minijinja::{Value, context};
use platform_api::FieldErrors;
use platform_authz::ProjectListing;
use products_hr::{HrError, forms::ProjetForm, projets::ProjetEditor, search::ListFilter};
use sea_orm::Iterable;

use super::{bounce, done, page, pdf};
use crate::{
    http::{AppState, HttpResult},
    session::CurrentUser,
};

const LIST: &str = "/projets";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/projets", get(list))
        .route("/projets/add", get(add))
        .route("/projets/edit/{id}", get(edit))
        .route("/projets/save", post(save))
        .route("/projets/delete/{id}", get(delete))
        .route("/projets/export/pdf", get(export))
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    list_page(&state, jar, &user, ProjectListing::Projets, &filter).await
}

pub(super) async fn list_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    listing: ProjectListing,
    filter: &ListFilter,
) -> HttpResult<Response> {
    let projets = state
        .hr
        .projet_rows(&state.db, &user.principal, listing, filter)
        .await?;
    let departements = state.hr.departement_choices(&state.db).await?;
    let etats: Vec<&str> = Etat::iter().map(Etat::as_str).collect();
    let ctx = context! { projets, query => filter, departements, etats };
    page(state, jar, user, "projets/list.html", ctx)
}

fn form_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    editor: ProjetEditor,
    errors: FieldErrors,
) -> HttpResult<Response> {
    let etats: Vec<&str> = Etat::iter().map(Etat::as_str).collect();
    let ctx = context! { errors, etats, ..Value::from_serialize(&editor) };
    page(state, jar, user, "projets/form.html", ctx)
}

async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    match state.hr.projet_add_form(&state.db, &user.principal).await {
        Ok(editor) => form_page(&state, jar, &user, editor, FieldErrors::new()),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.projet_edit_form(&state.db, &user.principal, id).await {
        Ok(editor) => form_page(&state, jar, &user, editor, FieldErrors::new()),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn save(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<ProjetForm>,
) -> HttpResult<Response> {
    match state.hr.save_projet(&state.db, &user.principal, &form).await {
        Ok(_) => Ok(done(&state, jar, "Projet enregistré avec succès", LIST)),
        Err(HrError::Invalid(errors)) => {
            let editor = state.hr.projet_editor(&state.db, form).await?;
            form_page(&state, jar, &user, editor, errors)
        }
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.delete_projet(&state.db, &user.principal, id).await {
        Ok(()) => Ok(done(&state, jar, "Projet supprimé avec succès", LIST)),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn export(State(state): State<AppState>, _user: CurrentUser) -> HttpResult<Response> {
    pdf(state.hr.export_projets(&state.db).await?)
}
