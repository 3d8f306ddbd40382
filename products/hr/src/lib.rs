//! HR vertical slice.
//!
//! [`HrModule`] owns every workflow behind the HR pages: it checks the caller
//! against [`PolicyEngine`], validates submitted forms, writes through the
//! `platform-db` repositories and renders the PDF reports.

use chrono::{Local, NaiveDate};
use platform_authz::{AuthzError, PolicyEngine, Principal};
use serde::{Deserialize, Serialize};

pub mod affectations;
pub mod departements;
pub mod employees;
pub mod error;
pub mod fiches;
pub mod forms;
pub mod money;
pub mod projets;
pub mod reports;
pub mod roles;
pub mod search;
pub mod seed;
pub mod sessions;
pub mod stats;

pub use error::{HrError, HrResult};

/// Employer block printed on payslips.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "CY-RH Project".into(),
            address: "123 Rue de l'Exemple, 75000 Paris".into(),
        }
    }
}

/// An option of a `<select>` input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: i32,
    pub label: String,
}

impl Choice {
    pub fn employee(model: &entity::employee::Model) -> Self {
        Self {
            id: model.id,
            label: format!("{} ({})", model.full_name(), model.matricule),
        }
    }

    pub fn departement(model: &entity::departement::Model) -> Self {
        Self {
            id: model.id,
            label: model.intitule.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HrModule {
    policy: PolicyEngine,
    company: CompanyInfo,
}

impl HrModule {
    pub fn new(company: CompanyInfo) -> Self {
        Self {
            policy: PolicyEngine,
            company,
        }
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn company(&self) -> &CompanyInfo {
        &self.company
    }

    /// Turns a policy decision into the flash message shown to the caller.
    pub(crate) fn guard(
        &self,
        principal: &Principal,
        allowed: bool,
        action: &str,
        resource: &str,
        message: &str,
    ) -> HrResult<()> {
        self.policy
            .require(allowed, action, resource)
            .map_err(|AuthzError::Denied { action, resource }| {
                tracing::info!(
                    employee_id = principal.employee_id,
                    role = %principal.role,
                    %action,
                    %resource,
                    "permission denied"
                );
                HrError::Denied(message.to_string())
            })
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
