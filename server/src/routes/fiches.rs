use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::{Value, context};
use platform_api::FieldErrors;
use products_hr::{HrError, fiches::FicheEditor, forms::FicheForm, money, search::ListFilter};

use super::{bounce, done, page, pdf};
use crate::{
    http::{AppState, HttpResult},
    session::CurrentUser,
};

const LIST: &str = "/fiches-paie";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/fiches-paie", get(list))
        .route("/fiches-paie/add", get(add))
        .route("/fiches-paie/edit/{id}", get(edit))
        .route("/fiches-paie/save", post(save))
        .route("/fiches-paie/delete/{id}", get(delete))
        .route("/fiches-paie/export/{id}/pdf", get(export))
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
    let fiches = state.hr.fiche_rows(&state.db, &user.principal, filter).await?;
    let months: Vec<&str> = (1..=12).filter_map(money::month_name).collect();
    page(state, jar, user, "fiches/list.html", context! { fiches, query => filter, months })
}

fn form_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    editor: FicheEditor,
    errors: FieldErrors,
) -> HttpResult<Response> {
    let months: Vec<&str> = (1..=12).filter_map(money::month_name).collect();
    let ctx = context! { errors, months, ..Value::from_serialize(&editor) };
    page(state, jar, user, "fiches/form.html", ctx)
}

async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    match state.hr.fiche_add_form(&state.db, &user.principal).await {
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
    match state.hr.fiche_edit_form(&state.db, &user.principal, id).await {
        Ok(editor) => form_page(&state, jar, &user, editor, FieldErrors::new()),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn save(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<FicheForm>,
) -> HttpResult<Response> {
    match state.hr.save_fiche(&state.db, &user.principal, &form).await {
        Ok(_) => Ok(done(&state, jar, "Fiche de paie enregistrée avec succès", LIST)),
        Err(HrError::Invalid(errors)) => {
            let employees = state.hr.fiche_candidates(&state.db, &user.principal).await?;
            form_page(&state, jar, &user, FicheEditor { form, employees }, errors)
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
    match state.hr.delete_fiche(&state.db, &user.principal, id).await {
        Ok(()) => Ok(done(&state, jar, "Fiche de paie supprimée avec succès", LIST)),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

/// 404 for an unknown payslip, 403 when the caller may not see it.
async fn export(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    pdf(state.hr.export_fiche(&state.db, &user.principal, id).await?)
}
