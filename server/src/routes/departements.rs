use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::{Value, context};
use platform_api::FieldErrors;
use products_hr::{
    HrError, departements::DepartementEditor, forms::DepartementForm, search::ListFilter,
};

use super::{bounce, done, page, pdf};
use crate::{
    http::{AppState, HttpResult},
    session::CurrentUser,
};

const LIST: &str = "/departements";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/departements", get(list))
        .route("/departements/add", get(add))
        .route("/departements/edit/{id}", get(edit))
        .route("/departements/save", post(save))
        .route("/departements/delete/{id}", get(delete))
        .route("/departements/export/pdf", get(export))
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    list_page(&state, jar, &user, &filter).await
}

pub(super) async fn list_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    filter: &ListFilter,
) -> HttpResult<Response> {
    let departements = state
        .hr
        .departement_rows(&state.db, &user.principal, filter)
        .await?;
    let ctx = context! { departements, query => filter };
    page(state, jar, user, "departements/list.html", ctx)
}

fn form_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    editor: DepartementEditor,
    errors: FieldErrors,
) -> HttpResult<Response> {
    let ctx = context! { errors, ..Value::from_serialize(&editor) };
    page(state, jar, user, "departements/form.html", ctx)
}

async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    match state.hr.departement_add_form(&state.db, &user.principal).await {
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
    match state.hr.departement_edit_form(&state.db, &user.principal, id).await {
        Ok(editor) => form_page(&state, jar, &user, editor, FieldErrors::new()),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn save(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<DepartementForm>,
) -> HttpResult<Response> {
    match state.hr.save_departement(&state.db, &user.principal, &form).await {
        Ok(_) => Ok(done(&state, jar, "Département enregistré avec succès", LIST)),
        Err(HrError::Invalid(errors)) => {
            let departement_id = form.record_id().ok().flatten();
            let candidates = state.hr.chief_candidates(&state.db, departement_id).await?;
            let editor = DepartementEditor { form, candidates };
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
    match state.hr.delete_departement(&state.db, &user.principal, id).await {
        Ok(()) => Ok(done(&state, jar, "Département supprimé avec succès", LIST)),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn export(State(state): State<AppState>, user: CurrentUser) -> HttpResult<Response> {
    pdf(state.hr.export_departements(&state.db, &user.principal).await?)
}
