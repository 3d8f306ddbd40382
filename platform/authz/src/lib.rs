//! Authorization primitives for the HR module.
//!
//! Every permission decision the handlers make goes through [`PolicyEngine`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("action {action} denied for resource {resource}")]
    Denied { action: String, resource: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    ChefDept,
    ChefProjet,
    Employe,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::ChefDept, Role::ChefProjet, Role::Employe];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::ChefDept => "CHEF_DEPT",
            Role::ChefProjet => "CHEF_PROJET",
            Role::Employe => "EMPLOYE",
        }
    }

    /// Stored labels are matched exactly; anything else is an employee.
    pub fn parse(label: Option<&str>) -> Role {
        label.and_then(Role::from_label).unwrap_or(Role::Employe)
    }

    /// Strict variant used by form validation.
    pub fn from_label(label: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == label.trim())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub employee_id: i32,
    pub role: Role,
    pub departement_id: Option<i32>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Which payslips a caller may list and view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayslipScope {
    All,
    /// The chief's own payslips plus those of their department's employees.
    Departement {
        chef: i32,
        departement: Option<i32>,
    },
    Own(i32),
}

impl PayslipScope {
    pub fn includes(&self, owner: i32, owner_dept: Option<i32>) -> bool {
        match *self {
            PayslipScope::All => true,
            PayslipScope::Departement { chef, departement } => {
                owner == chef || (departement.is_some() && owner_dept == departement)
            }
            PayslipScope::Own(id) => owner == id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectListing {
    Dashboard,
    Projets,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectScope {
    All,
    AssignedTo(i32),
}

#[derive(Default, Debug, Clone, Copy)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn can_manage_employees(&self, p: &Principal) -> bool {
        p.is_admin()
    }

    pub fn can_create_departement(&self, p: &Principal) -> bool {
        p.is_admin()
    }

    pub fn can_manage_departement(&self, p: &Principal, chef_id: Option<i32>) -> bool {
        p.is_admin() || (p.role == Role::ChefDept && chef_id == Some(p.employee_id))
    }

    pub fn can_create_projet(&self, p: &Principal) -> bool {
        matches!(p.role, Role::Admin | Role::ChefProjet)
    }

    /// Also governs the project's assignments.
    pub fn can_manage_projet(&self, p: &Principal, chef_id: Option<i32>) -> bool {
        p.is_admin() || chef_id == Some(p.employee_id)
    }

    pub fn can_create_fiche(&self, p: &Principal) -> bool {
        matches!(p.role, Role::Admin | Role::ChefDept)
    }

    pub fn can_create_fiche_for(&self, p: &Principal, employee_dept: Option<i32>) -> bool {
        match p.role {
            Role::Admin => true,
            Role::ChefDept => same_departement(p.departement_id, employee_dept),
            _ => false,
        }
    }

    pub fn can_modify_fiche(&self, p: &Principal, employee_dept: Option<i32>) -> bool {
        self.can_create_fiche_for(p, employee_dept)
    }

    pub fn payslip_scope(&self, p: &Principal) -> PayslipScope {
        match p.role {
            Role::Admin => PayslipScope::All,
            Role::ChefDept => PayslipScope::Departement {
                chef: p.employee_id,
                departement: p.departement_id,
            },
            _ => PayslipScope::Own(p.employee_id),
        }
    }

    pub fn can_view_fiche(&self, p: &Principal, owner: i32, owner_dept: Option<i32>) -> bool {
        self.payslip_scope(p).includes(owner, owner_dept)
    }

    pub fn project_scope(&self, p: &Principal, listing: ProjectListing) -> ProjectScope {
        match (p.role, listing) {
            (Role::Admin, _) => ProjectScope::All,
            (Role::ChefDept, ProjectListing::Dashboard) => ProjectScope::All,
            _ => ProjectScope::AssignedTo(p.employee_id),
        }
    }

    pub fn require(&self, allowed: bool, action: &str, resource: &str) -> Result<(), AuthzError> {
        if allowed {
            Ok(())
        } else {
            Err(AuthzError::Denied {
                action: action.to_string(),
                resource: resource.to_string(),
            })
        }
    }
}

fn same_departement(a: Option<i32>, b: Option<i32>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(employee_id: i32, role: Role, departement_id: Option<i32>) -> Principal {
        Principal {
            employee_id,
            role,
            departement_id,
        }
    }

    #[test]
    fn unknown_roles_are_employees() {
        assert_eq!(Role::parse(Some("ADMIN")), Role::Admin);
        assert_eq!(Role::parse(Some("CHEF_PROJET")), Role::ChefProjet);
        assert_eq!(Role::parse(Some("admin")), Role::Employe);
        assert_eq!(Role::parse(None), Role::Employe);
        assert_eq!(Role::from_label("SUPERUSER"), None);
    }

    #[test]
    fn only_admin_manages_employees() {
        let engine = PolicyEngine;
        assert!(engine.can_manage_employees(&principal(1, Role::Admin, None)));
        for role in [Role::ChefDept, Role::ChefProjet, Role::Employe] {
            assert!(!engine.can_manage_employees(&principal(2, role, Some(1))));
        }
    }

    #[test]
    fn chef_dept_manages_only_own_departement() {
        let engine = PolicyEngine;
        let chef = principal(7, Role::ChefDept, Some(3));
        assert!(engine.can_manage_departement(&chef, Some(7)));
        assert!(!engine.can_manage_departement(&chef, Some(8)));
        assert!(!engine.can_manage_departement(&chef, None));
        assert!(!engine.can_create_departement(&chef));
        // Being chief on paper is not enough without the role.
        let employe = principal(7, Role::Employe, Some(3));
        assert!(!engine.can_manage_departement(&employe, Some(7)));
    }

    #[test]
    fn project_chief_manages_only_their_project() {
        let engine = PolicyEngine;
        let chef = principal(5, Role::ChefProjet, None);
        assert!(engine.can_create_projet(&chef));
        assert!(engine.can_manage_projet(&chef, Some(5)));
        assert!(!engine.can_manage_projet(&chef, Some(6)));
        let chef_dept = principal(6, Role::ChefDept, Some(1));
        assert!(!engine.can_create_projet(&chef_dept));
        assert!(engine.can_manage_projet(&chef_dept, Some(6)));
        assert!(engine.can_manage_projet(&principal(1, Role::Admin, None), None));
    }

    #[test]
    fn payslip_rules_follow_the_departement() {
        let engine = PolicyEngine;
        let chef = principal(7, Role::ChefDept, Some(3));
        assert!(engine.can_create_fiche(&chef));
        assert!(engine.can_create_fiche_for(&chef, Some(3)));
        assert!(!engine.can_create_fiche_for(&chef, Some(4)));
        assert!(!engine.can_modify_fiche(&chef, None));

        let homeless_chef = principal(8, Role::ChefDept, None);
        assert!(!engine.can_modify_fiche(&homeless_chef, None));

        let employe = principal(9, Role::Employe, Some(3));
        assert!(!engine.can_create_fiche(&employe));
        assert!(!engine.can_create_fiche_for(&employe, Some(3)));
    }

    #[test]
    fn payslip_scope_per_role() {
        let engine = PolicyEngine;
        assert_eq!(
            engine.payslip_scope(&principal(1, Role::Admin, None)),
            PayslipScope::All
        );
        let chef = principal(7, Role::ChefDept, Some(3));
        assert!(engine.can_view_fiche(&chef, 7, None));
        assert!(engine.can_view_fiche(&chef, 12, Some(3)));
        assert!(!engine.can_view_fiche(&chef, 12, Some(4)));
        let lone_chef = principal(8, Role::ChefDept, None);
        assert!(!engine.can_view_fiche(&lone_chef, 12, None));
        let employe = principal(9, Role::ChefProjet, Some(3));
        assert!(engine.can_view_fiche(&employe, 9, Some(3)));
        assert!(!engine.can_view_fiche(&employe, 10, Some(3)));
    }

    #[test]
    fn project_scope_differs_between_dashboard_and_list() {
        let engine = PolicyEngine;
        let chef_dept = principal(7, Role::ChefDept, Some(3));
        assert_eq!(
            engine.project_scope(&chef_dept, ProjectListing::Dashboard),
            ProjectScope::All
        );
        assert_eq!(
            engine.project_scope(&chef_dept, ProjectListing::Projets),
            ProjectScope::AssignedTo(7)
        );
        let admin = principal(1, Role::Admin, None);
        assert_eq!(
            engine.project_scope(&admin, ProjectListing::Projets),
            ProjectScope::All
        );
    }

    #[test]
    fn require_reports_action_and_resource() {
        let err = PolicyEngine
            .require(false, "delete", "employee:4")
            .unwrap_err();
        assert_eq!(err.to_string(), "action delete denied for resource employee:4");
        assert!(PolicyEngine.require(true, "delete", "employee:4").is_ok());
    }
}
