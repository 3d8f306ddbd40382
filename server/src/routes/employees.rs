use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::context;
use platform_api::FieldErrors;
use platform_authz::Role;
use products_hr::{HrError, forms::EmployeeForm, search::ListFilter};

use super::{bounce, done, page, pdf};
use crate::{
    http::{AppState, HttpResult},
    session::CurrentUser,
};

const LIST: &str = "/employees";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list))
        .route("/employees/add", get(add))
        .route("/employees/edit/{id}", get(edit))
        .route("/employees/save", post(save))
        .route("/employees/delete/{id}", get(delete))
        .route("/employees/export/pdf", get(export))
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    list_page(&state, jar, &user, &filter).await
}

/// Also served under `/home/employees`.
pub(super) async fn list_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    filter: &ListFilter,
) -> HttpResult<Response> {
    let employees = state.hr.employee_rows(&state.db, filter).await?;
    let departements = state.hr.departement_choices(&state.db).await?;
    let roles = Role::ALL.map(Role::as_str);
    let ctx = context! { employees, query => filter, departements, roles };
    page(state, jar, user, "employees/list.html", ctx)
}

async fn form_page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    form: EmployeeForm,
    errors: FieldErrors,
) -> HttpResult<Response> {
    let departements = state.hr.departement_choices(&state.db).await?;
    let roles = Role::ALL.map(Role::as_str);
    page(
        state,
        jar,
        user,
        "employees/form.html",
        context! { form, errors, departements, roles },
    )
}

async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
) -> HttpResult<Response> {
    match state.hr.check_can_add_employee(&user.principal) {
        Ok(()) => form_page(&state, jar, &user, EmployeeForm::default(), FieldErrors::new()).await,
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.employee_edit_form(&state.db, &user.principal, id).await {
        Ok(form) => form_page(&state, jar, &user, form, FieldErrors::new()).await,
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn save(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<EmployeeForm>,
) -> HttpResult<Response> {
    match state.hr.save_employee(&state.db, &user.principal, &form).await {
        Ok(_) => Ok(done(&state, jar, "Employé enregistré avec succès", LIST)),
        Err(HrError::Invalid(errors)) => form_page(&state, jar, &user, form, errors).await,
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: PrivateCookieJar,
    Path(id): Path<i32>,
) -> HttpResult<Response> {
    match state.hr.delete_employee(&state.db, &user.principal, id).await {
        Ok(()) => Ok(done(
            &state,
            jar,
            "Employé et ses fiches de paie supprimés avec succès \
             (si cet employé était chef de département, le poste a été libéré)",
            LIST,
        )),
        Err(err) => bounce(&state, jar, err, LIST),
    }
}

async fn export(State(state): State<AppState>, _user: CurrentUser) -> HttpResult<Response> {
    pdf(state.hr.export_employees(&state.db).await?)
}
