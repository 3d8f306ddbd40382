//! HTML routes. Handlers take the signed-in [`CurrentUser`], call into
//! [`products_hr::HrModule`] and answer with a page, a redirect or a PDF.

use axum::{
    Router,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::Value;
use platform_api::Flash;
use products_hr::{HrError, reports::PdfReport};

use crate::{
    http::{AppState, HttpError, HttpResult},
    session::{CurrentUser, flash_redirect, take_flash},
    views::Viewer,
};

mod affectations;
mod auth;
mod departements;
mod employees;
mod fiches;
mod home;
mod projets;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(home::router())
        .merge(employees::router())
        .merge(departements::router())
        .merge(projets::router())
        .merge(affectations::router())
        .merge(fiches::router())
}

/// Renders a page for the signed-in user, consuming any pending flash.
pub(crate) fn page(
    state: &AppState,
    jar: PrivateCookieJar,
    user: &CurrentUser,
    name: &str,
    ctx: Value,
) -> HttpResult<Response> {
    let (jar, flash) = take_flash(jar);
    let viewer = Viewer::new(state.hr.policy(), &user.principal);
    let html = state.views.render(name, Some(&viewer), flash, ctx)?;
    Ok((jar, html).into_response())
}

pub(crate) fn done(state: &AppState, jar: PrivateCookieJar, message: &str, to: &str) -> Response {
    flash_redirect(jar, &state.config, Flash::success(message), to)
}

/// Refusals and missing records go back to `to` with an error flash.
/// Anything else is a server error.
pub(crate) fn bounce(
    state: &AppState,
    jar: PrivateCookieJar,
    err: HrError,
    to: &str,
) -> HttpResult<Response> {
    let message = match err {
        HrError::Denied(message) | HrError::NotFound(message) => message,
        HrError::Invalid(errors) => errors
            .iter()
            .map(|(_, message)| message)
            .collect::<Vec<_>>()
            .join(" "),
        other => return Err(other.into()),
    };
    Ok(flash_redirect(jar, &state.config, Flash::error(message), to))
}

pub(crate) fn pdf(report: PdfReport) -> HttpResult<Response> {
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    let disposition = HeaderValue::from_bytes(disposition.as_bytes()).map_err(HttpError::internal)?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
        (header::CONTENT_DISPOSITION, disposition),
        (header::CONTENT_LENGTH, HeaderValue::from(report.bytes.len())),
    ];
    Ok((headers, report.bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_response_carries_download_headers() {
        let report = PdfReport {
            filename: "fiche_paie_FÉVRIER_2024.pdf".into(),
            bytes: b"%PDF-1.3".to_vec(),
        };
        let response = pdf(report).unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CONTENT_LENGTH], "8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION].as_bytes(),
            "attachment; filename=\"fiche_paie_FÉVRIER_2024.pdf\"".as_bytes()
        );
    }
}
