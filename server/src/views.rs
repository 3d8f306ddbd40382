//! HTML rendering with minijinja. Templates are compiled into the binary.

use axum::response::Html;
use minijinja::{Environment, Value, context};
use platform_api::Flash;
use platform_authz::{PolicyEngine, Principal};
use serde::Serialize;

use crate::http::{HttpError, HttpResult};

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
    ("statistics.html", include_str!("../templates/statistics.html")),
    ("employees/list.html", include_str!("../templates/employees/list.html")),
    ("employees/form.html", include_str!("../templates/employees/form.html")),
    ("departements/list.html", include_str!("../templates/departements/list.html")),
    ("departements/form.html", include_str!("../templates/departements/form.html")),
    ("projets/list.html", include_str!("../templates/projets/list.html")),
    ("projets/form.html", include_str!("../templates/projets/form.html")),
    ("affectations/list.html", include_str!("../templates/affectations/list.html")),
    ("affectations/form.html", include_str!("../templates/affectations/form.html")),
    ("fiches/list.html", include_str!("../templates/fiches/list.html")),
    ("fiches/form.html", include_str!("../templates/fiches/form.html")),
];

/// What the navigation bar needs to know about the caller.
#[derive(Clone, Debug, Serialize)]
pub struct Viewer {
    pub employee_id: i32,
    pub role: &'static str,
    pub is_admin: bool,
    pub can_create_departement: bool,
    pub can_create_projet: bool,
    pub can_create_fiche: bool,
}

impl Viewer {
    pub fn new(policy: &PolicyEngine, principal: &Principal) -> Self {
        Self {
            employee_id: principal.employee_id,
            role: principal.role.as_str(),
            is_admin: principal.is_admin(),
            can_create_departement: policy.can_create_departement(principal),
            can_create_projet: policy.can_create_projet(principal),
            can_create_fiche: policy.can_create_fiche(principal),
        }
    }
}

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Renders `name` with the page chrome values merged into `ctx`.
    pub fn render(
        &self,
        name: &str,
        viewer: Option<&Viewer>,
        flash: Option<Flash>,
        ctx: Value,
    ) -> HttpResult<Html<String>> {
        let template = self.env.get_template(name).map_err(HttpError::internal)?;
        let html = template
            .render(context! { viewer, flash, ..ctx })
            .map_err(HttpError::internal)?;
        Ok(Html(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_authz::Role;

    #[test]
    fn every_template_compiles() {
        let views = Views::new().unwrap();
        assert_eq!(views.env.templates().count(), TEMPLATES.len());
    }

    #[test]
    fn login_page_shows_error_message() {
        let views = Views::new().unwrap();
        let Html(body) = views
            .render("login.html", None, None, context! { error => true, logout => false })
            .unwrap();
        assert!(body.contains("Email ou mot de passe incorrect"));
        assert!(!body.contains("déconnecté"));
    }

    #[test]
    fn navigation_follows_role() {
        let views = Views::new().unwrap();
        let principal = Principal {
            employee_id: 3,
            role: Role::Employe,
            departement_id: None,
        };
        let viewer = Viewer::new(&PolicyEngine, &principal);
        let Html(body) = views
            .render(
                "home.html",
                Some(&viewer),
                Some(Flash::success("Bienvenue")),
                context! {},
            )
            .unwrap();
        assert!(body.contains("Bienvenue"));
        assert!(body.contains("EMPLOYE"));
        assert!(!body.contains("href=\"/employees/add\""));
    }
}
