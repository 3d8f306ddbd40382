use platform_api::{ApiError, FieldErrors};
use platform_authn::AuthnError;
use sea_orm::DbErr;
use thiserror::Error;

use crate::reports::ReportError;

pub type HrResult<T> = Result<T, HrError>;

/// Outcome of an HR workflow that did not succeed.
///
/// `Denied` and `NotFound` carry the message shown to the user.
#[derive(Debug, Error)]
pub enum HrError {
    #[error("{0}")]
    Denied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("validation failed on {} field(s)", .0.len())]
    Invalid(FieldErrors),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Authn(#[from] AuthnError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl HrError {
    pub(crate) fn invalid(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        HrError::Invalid(errors)
    }
}

impl From<FieldErrors> for HrError {
    fn from(value: FieldErrors) -> Self {
        HrError::Invalid(value)
    }
}

impl From<HrError> for ApiError {
    fn from(value: HrError) -> Self {
        match value {
            HrError::Denied(_) => ApiError::Forbidden,
            HrError::NotFound(_) => ApiError::NotFound,
            HrError::Invalid(errors) => ApiError::InvalidInput(
                errors
                    .iter()
                    .map(|(field, msg)| format!("{field}: {msg}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            other => ApiError::internal(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_api_taxonomy() {
        let denied: ApiError = HrError::Denied("non".into()).into();
        assert_eq!(denied.status(), 403);
        let missing: ApiError = HrError::NotFound("Fiche de paie introuvable".into()).into();
        assert_eq!(missing.status(), 404);
        let invalid: ApiError = HrError::invalid("mois", "Vous devez choisir un mois.").into();
        assert_eq!(invalid.to_string(), "bad request: mois: Vous devez choisir un mois.");
        let db: ApiError = HrError::Db(DbErr::Custom("boom".into())).into();
        assert_eq!(db.public_message(), "internal server error");
    }
}
