use std::collections::HashMap;

use chrono::NaiveDate;
use entity::projet;
use platform_api::FieldErrors;
use platform_authz::{Principal, ProjectListing, ProjectScope};
use platform_db::{affectations, departements, employees, projets};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait, TryIntoModel};
use serde::Serialize;
use tracing::instrument;

use crate::forms::ProjetForm;
use crate::reports::{self, PdfReport};
use crate::search::{self, ListFilter, Searchable};
use crate::{Choice, HrError, HrModule, HrResult, roles, today};

const NOT_FOUND: &str = "Projet introuvable";

#[derive(Clone, Debug, Serialize)]
pub struct ProjetRow {
    pub id: i32,
    pub nom_projet: String,
    pub etat_projet: projet::Etat,
    pub date_debut: String,
    pub date_fin_prevue: Option<String>,
    pub date_fin_reelle: Option<String>,
    pub chef: Option<String>,
    pub departement: Option<String>,
    pub can_manage: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProjetEditor {
    pub form: ProjetForm,
    pub employees: Vec<Choice>,
    pub departements: Vec<Choice>,
}

pub(crate) fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

impl Searchable for ProjetRow {
    fn text(&self) -> Vec<&str> {
        vec![
            self.nom_projet.as_str(),
            self.etat_projet.as_str(),
            self.date_debut.as_str(),
            self.date_fin_prevue.as_deref().unwrap_or(""),
            self.date_fin_reelle.as_deref().unwrap_or(""),
            self.chef.as_deref().unwrap_or(""),
            self.departement.as_deref().unwrap_or(""),
        ]
    }

    fn columns(&self, filter: &ListFilter) -> bool {
        filter.matches_etat(self.etat_projet.as_str())
            && filter.matches_departement(self.departement.as_deref())
    }
}

impl HrModule {
    /// Projects visible to `principal` on the given page.
    pub async fn visible_projets(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        listing: ProjectListing,
    ) -> HrResult<Vec<projet::Model>> {
        let rows = match self.policy.project_scope(principal, listing) {
            ProjectScope::All => projets::list(db).await?,
            ProjectScope::AssignedTo(id) => projets::assigned_to(db, id).await?,
        };
        Ok(rows)
    }

    pub async fn projet_rows(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        listing: ProjectListing,
        filter: &ListFilter,
    ) -> HrResult<Vec<ProjetRow>> {
        let names: HashMap<i32, String> = employees::list(db)
            .await?
            .iter()
            .map(|e| (e.id, e.full_name()))
            .collect();
        let labels: HashMap<i32, String> = departements::list(db)
            .await?
            .into_iter()
            .map(|d| (d.id, d.intitule))
            .collect();
        let rows = self
            .visible_projets(db, principal, listing)
            .await?
            .into_iter()
            .map(|p| ProjetRow {
                can_manage: self.policy.can_manage_projet(principal, p.chef_projet),
                chef: p.chef_projet.and_then(|id| names.get(&id).cloned()),
                departement: p.id_departement.and_then(|id| labels.get(&id).cloned()),
                id: p.id,
                etat_projet: p.etat_projet,
                date_debut: display_date(p.date_debut),
                date_fin_prevue: p.date_fin_prevue.map(display_date),
                date_fin_reelle: p.date_fin_reelle.map(display_date),
                nom_projet: p.nom_projet,
            })
            .collect();
        Ok(search::apply(rows, filter))
    }

    pub async fn projet_editor(
        &self,
        db: &DatabaseConnection,
        form: ProjetForm,
    ) -> HrResult<ProjetEditor> {
        Ok(ProjetEditor {
            form,
            employees: self.employee_choices(db).await?,
            departements: self.departement_choices(db).await?,
        })
    }

    pub async fn projet_add_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> HrResult<ProjetEditor> {
        self.guard(
            principal,
            self.policy.can_create_projet(principal),
            "create",
            "projet",
            "Vous n'avez pas la permission de créer un projet",
        )?;
        self.projet_editor(db, ProjetForm::blank()).await
    }

    pub async fn projet_edit_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<ProjetEditor> {
        let model = self.managed_projet(db, principal, id, "update", "Vous ne pouvez pas modifier ce projet").await?;
        self.projet_editor(db, ProjetForm::from_model(&model)).await
    }

    #[instrument(skip(self, db, form), fields(actor = principal.employee_id))]
    pub async fn save_projet(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        form: &ProjetForm,
    ) -> HrResult<projet::Model> {
        let existing = match form.record_id()? {
            Some(id) => Some(
                self.managed_projet(db, principal, id, "update", "Vous ne pouvez pas modifier ce projet")
                    .await?,
            ),
            None => {
                self.guard(
                    principal,
                    self.policy.can_create_projet(principal),
                    "create",
                    "projet",
                    "Vous ne pouvez pas créer de projet",
                )?;
                None
            }
        };

        let draft = form.validate()?;
        let mut errors = FieldErrors::new();
        if let Some(chef) = draft.chef_projet {
            if employees::find(db, chef).await?.is_none() {
                errors.add("chef_projet", "Employé introuvable");
            }
        }
        if let Some(dept) = draft.id_departement {
            if !departements::exists(db, dept).await? {
                errors.add("id_departement", "Département introuvable");
            }
        }
        if !errors.is_empty() {
            return Err(HrError::Invalid(errors));
        }

        let previous_chef = existing.as_ref().and_then(|p| p.chef_projet);
        let txn = db.begin().await?;
        let mut active: projet::ActiveModel = match existing {
            Some(model) => model.into(),
            None => projet::ActiveModel {
                ..Default::default()
            },
        };
        active.nom_projet = Set(draft.nom_projet);
        active.etat_projet = Set(draft.etat_projet);
        active.date_debut = Set(draft.date_debut);
        active.date_fin_prevue = Set(draft.date_fin_prevue);
        active.date_fin_reelle = Set(draft.date_fin_reelle);
        active.chef_projet = Set(draft.chef_projet);
        active.id_departement = Set(draft.id_departement);
        let saved = active.save(&txn).await?.try_into_model()?;
        roles::resync_all(&txn, [previous_chef, saved.chef_projet]).await?;
        txn.commit().await?;

        tracing::info!(projet_id = saved.id, etat = saved.etat_projet.as_str(), "projet saved");
        Ok(saved)
    }

    #[instrument(skip(self, db), fields(actor = principal.employee_id))]
    pub async fn delete_projet(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<()> {
        let model = self
            .managed_projet(db, principal, id, "delete", "Vous ne pouvez pas supprimer ce projet")
            .await?;
        let txn = db.begin().await?;
        let affectations_removed = affectations::delete_for_projet(&txn, id).await?;
        projets::delete(&txn, id).await?;
        roles::resync_all(&txn, [model.chef_projet]).await?;
        txn.commit().await?;
        tracing::info!(projet_id = id, affectations_removed, "projet deleted");
        Ok(())
    }

    pub async fn export_projets(&self, db: &DatabaseConnection) -> HrResult<PdfReport> {
        let rows = projets::list(db).await?;
        Ok(reports::projets_report(&rows, today())?)
    }

    /// Loads a project the caller is allowed to manage.
    pub(crate) async fn managed_projet(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
        action: &str,
        message: &str,
    ) -> HrResult<projet::Model> {
        let model = projets::find(db, id)
            .await?
            .ok_or_else(|| HrError::NotFound(NOT_FOUND.into()))?;
        self.guard(
            principal,
            self.policy.can_manage_projet(principal, model.chef_projet),
            action,
            &format!("projet:{id}"),
            message,
        )?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, employee, memory_db, principal_of, projet as seed_projet};
    use entity::affectation_projet;
    use platform_authz::Role;

    fn form(nom: &str) -> ProjetForm {
        ProjetForm {
            nom_projet: Some(nom.into()),
            date_debut: Some("2024-03-01".into()),
            ..ProjetForm::blank()
        }
    }

    async fn assign(db: &DatabaseConnection, employee_id: i32, projet_id: i32) {
        affectation_projet::ActiveModel {
            id_employer: Set(employee_id),
            id_projet: Set(projet_id),
            date_affectation: Set(date(2024, 3, 1)),
            date_fin_affectation: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn plain_employee_cannot_create() {
        let db = memory_db().await;
        let emp = employee(&db, "e@cy-rh.local", Role::Employe, None).await;
        let hr = HrModule::default();
        assert!(matches!(
            hr.projet_add_form(&db, &principal_of(&emp)).await,
            Err(HrError::Denied(msg)) if msg == "Vous n'avez pas la permission de créer un projet"
        ));
        assert!(matches!(
            hr.save_projet(&db, &principal_of(&emp), &form("Migration")).await,
            Err(HrError::Denied(msg)) if msg == "Vous ne pouvez pas créer de projet"
        ));
    }

    #[tokio::test]
    async fn save_promotes_new_chief_and_demotes_old() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let first = employee(&db, "first@cy-rh.local", Role::Employe, None).await;
        let second = employee(&db, "second@cy-rh.local", Role::Employe, None).await;
        let hr = HrModule::default();
        let p = principal_of(&admin);

        let mut input = form("Migration ERP");
        input.chef_projet = Some(first.id.to_string());
        let saved = hr.save_projet(&db, &p, &input).await.unwrap();
        assert_eq!(employees::find(&db, first.id).await.unwrap().unwrap().role, "CHEF_PROJET");

        let mut edit = ProjetForm::from_model(&saved);
        edit.chef_projet = Some(second.id.to_string());
        hr.save_projet(&db, &p, &edit).await.unwrap();
        assert_eq!(employees::find(&db, first.id).await.unwrap().unwrap().role, "EMPLOYE");
        assert_eq!(employees::find(&db, second.id).await.unwrap().unwrap().role, "CHEF_PROJET");
    }

    #[tokio::test]
    async fn unknown_references_are_field_errors() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let mut input = form("Refonte");
        input.chef_projet = Some("404".into());
        input.id_departement = Some("405".into());
        let err = HrModule::default()
            .save_projet(&db, &principal_of(&admin), &input)
            .await
            .unwrap_err();
        let HrError::Invalid(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("chef_projet"), ["Employé introuvable"]);
        assert_eq!(errors.get("id_departement"), ["Département introuvable"]);
    }

    #[tokio::test]
    async fn only_the_chief_manages_a_projet() {
        let db = memory_db().await;
        let chef = employee(&db, "chef@cy-rh.local", Role::ChefProjet, None).await;
        let other = employee(&db, "other@cy-rh.local", Role::ChefProjet, None).await;
        let proj = seed_projet(&db, "Portail", Some(chef.id)).await;
        let hr = HrModule::default();

        assert!(hr.projet_edit_form(&db, &principal_of(&chef), proj.id).await.is_ok());
        assert!(matches!(
            hr.delete_projet(&db, &principal_of(&other), proj.id).await,
            Err(HrError::Denied(msg)) if msg == "Vous ne pouvez pas supprimer ce projet"
        ));
        assert!(matches!(
            hr.projet_edit_form(&db, &principal_of(&chef), 999).await,
            Err(HrError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_assignments_and_demotes_chief() {
        let db = memory_db().await;
        let chef = employee(&db, "chef@cy-rh.local", Role::ChefProjet, None).await;
        let proj = seed_projet(&db, "Portail", Some(chef.id)).await;
        assign(&db, chef.id, proj.id).await;
        let hr = HrModule::default();

        hr.delete_projet(&db, &principal_of(&chef), proj.id).await.unwrap();
        assert!(affectations::for_projet(&db, proj.id).await.unwrap().is_empty());
        assert_eq!(employees::find(&db, chef.id).await.unwrap().unwrap().role, "EMPLOYE");
    }

    #[tokio::test]
    async fn listing_scope_follows_role() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let chef = employee(&db, "chef@cy-rh.local", Role::ChefDept, None).await;
        let emp = employee(&db, "e@cy-rh.local", Role::Employe, None).await;
        let a = seed_projet(&db, "Alpha", None).await;
        seed_projet(&db, "Beta", None).await;
        assign(&db, emp.id, a.id).await;
        let hr = HrModule::default();
        let any = ListFilter::default();

        let all = hr.projet_rows(&db, &principal_of(&admin), ProjectListing::Projets, &any).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.can_manage));

        let mine = hr.projet_rows(&db, &principal_of(&emp), ProjectListing::Projets, &any).await.unwrap();
        assert_eq!(mine.iter().map(|r| r.id).collect::<Vec<_>>(), vec![a.id]);
        assert!(!mine[0].can_manage);

        let chef_list = hr.projet_rows(&db, &principal_of(&chef), ProjectListing::Projets, &any).await.unwrap();
        assert!(chef_list.is_empty());
        let chef_dash = hr.projet_rows(&db, &principal_of(&chef), ProjectListing::Dashboard, &any).await.unwrap();
        assert_eq!(chef_dash.len(), 2);
    }

    #[tokio::test]
    async fn rows_filter_on_etat_and_text() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        seed_projet(&db, "Portail", None).await;
        let done = seed_projet(&db, "Migration", None).await;
        let mut done: projet::ActiveModel = done.into();
        done.etat_projet = Set(projet::Etat::Termine);
        done.update(&db).await.unwrap();
        let hr = HrModule::default();
        let p = principal_of(&admin);

        let termine = ListFilter {
            etat: Some("TERMINE".into()),
            ..ListFilter::default()
        };
        let rows = hr.projet_rows(&db, &p, ProjectListing::Projets, &termine).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nom_projet, "Migration");

        let rows = hr
            .projet_rows(&db, &p, ProjectListing::Projets, &ListFilter::text("portail"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].etat_projet, projet::Etat::EnCours);

        let in_dept = ListFilter {
            departement: Some("Finance".into()),
            ..ListFilter::default()
        };
        assert!(hr.projet_rows(&db, &p, ProjectListing::Projets, &in_dept).await.unwrap().is_empty());
    }
}
