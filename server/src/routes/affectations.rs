use axum::{
    Form, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::context;
use platform_api::FieldErrors;
use products_hr::{HrError, affectations::AffectationEditor, forms::AffectationForm};

use super::{bounce, done, page};
use crate::{
    http::{AppState, HttpResult},
    session::CurrentUser,
};

const PROJETS: &str = "/projets";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/affectations/projet/{id_projet}", get(list))
        .route("/affectations/projet/{id_projet}/add", get(add))
        .route("/affectations/edit/{id}", get(edit))
        .route("/affectations/save", post(save))
        .route("/affectations/delete/{id}", get(delete))
}

fn projet_page(projet_id: i32) -> String {
    format!("/affectations/projet/{projet_id}")
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id_projet): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.projet_affectations(&state.db, &user.principal, id_projet).await {
        Ok(page_data) => page(
            &state,
            jar,
            &user,
            "affectations/list.html",
            context! { page => page_data },
        ),
        Err(err) => bounce(&state, jar, err, PROJETS),
    }
}

fn form_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    editor: AffectationEditor,
    errors: FieldErrors,
) -> HttpResult<Response> {
    page(state, jar, user, "affectations/form.html", context! { editor, errors })
}

async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id_projet): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.affectation_add_form(&state.db, &user.principal, id_projet).await {
        Ok(editor) => form_page(&state, jar, &user, editor, FieldErrors::new()),
        Err(err) => bounce(&state, jar, err, PROJETS),
    }
}

async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.affectation_edit_form(&state.db, &user.principal, id).await {
        Ok(editor) => form_page(&state, jar, &user, editor, FieldErrors::new()),
        Err(err) => bounce(&state, jar, err, PROJETS),
    }
}

async fn save(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<AffectationForm>,
) -> HttpResult<Response> {
    match state.hr.save_affectation(&state.db, &user.principal, &form).await {
        Ok(model) => Ok(done(
            &state,
            jar,
            "Affectation enregistrée avec succès",
            &projet_page(model.id_projet),
        )),
        Err(HrError::Invalid(errors)) => {
            let projet = match state.hr.affectation_form_projet(&state.db, &user.principal, &form).await {
                Ok(projet) => projet,
                Err(err) => return bounce(&state, jar, err, PROJETS),
            };
            let editor = state.hr.affectation_editor(&state.db, &projet, form).await?;
            form_page(&state, jar, &user, editor, errors)
        }
        Err(err) => bounce(&state, jar, err, PROJETS),
    }
}

async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.delete_affectation(&state.db, &user.principal, id).await {
        Ok(projet_id) => Ok(done(
            &state,
            jar,
            "Affectation supprimée avec succès",
            &projet_page(projet_id),
        )),
        Err(err) => bounce(&state, jar, err, PROJETS),
    }
}
