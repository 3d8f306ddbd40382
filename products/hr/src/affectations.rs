//! Project assignments. Every operation is gated on managing the owning project.

use std::collections::HashMap;

use entity::{affectation_projet, projet};
use platform_authz::Principal;
use platform_db::{affectations, employees, projets};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TryIntoModel};
use serde::Serialize;
use tracing::instrument;

use crate::forms::AffectationForm;
use crate::projets::display_date;
use crate::{Choice, HrError, HrModule, HrResult, today};

const NOT_FOUND: &str = "Affectation introuvable";
const CANNOT_MANAGE: &str = "Vous n'avez pas la permission de gérer ce projet";

#[derive(Clone, Debug, Serialize)]
pub struct AffectationRow {
    pub id: i32,
    pub employee: Option<String>,
    pub date_affectation: String,
    pub date_fin_affectation: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProjetAffectations {
    pub projet_id: i32,
    pub nom_projet: String,
    pub rows: Vec<AffectationRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AffectationEditor {
    pub form: AffectationForm,
    pub nom_projet: String,
    pub employees: Vec<Choice>,
}

impl HrModule {
    pub async fn projet_affectations(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        projet_id: i32,
    ) -> HrResult<ProjetAffectations> {
        let projet = self
            .managed_projet(db, principal, projet_id, "read", CANNOT_MANAGE)
            .await?;
        let names: HashMap<i32, String> = employees::list(db)
            .await?
            .iter()
            .map(|e| (e.id, e.full_name()))
            .collect();
        let rows = affectations::for_projet(db, projet_id)
            .await?
            .into_iter()
            .map(|a| AffectationRow {
                id: a.id,
                employee: names.get(&a.id_employer).cloned(),
                active: a.is_active(),
                date_affectation: display_date(a.date_affectation),
                date_fin_affectation: a.date_fin_affectation.map(display_date),
            })
            .collect();
        Ok(ProjetAffectations {
            projet_id,
            nom_projet: projet.nom_projet,
            rows,
        })
    }

    pub async fn affectation_editor(
        &self,
        db: &DatabaseConnection,
        projet: &projet::Model,
        form: AffectationForm,
    ) -> HrResult<AffectationEditor> {
        Ok(AffectationEditor {
            form,
            nom_projet: projet.nom_projet.clone(),
            employees: self.employee_choices(db).await?,
        })
    }

    pub async fn affectation_add_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        projet_id: i32,
    ) -> HrResult<AffectationEditor> {
        let projet = self
            .managed_projet(db, principal, projet_id, "create", CANNOT_MANAGE)
            .await?;
        self.affectation_editor(db, &projet, AffectationForm::for_projet(projet_id, today()))
            .await
    }

    pub async fn affectation_edit_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<AffectationEditor> {
        let (model, projet) = self
            .managed_affectation(db, principal, id, "update", "Vous n'avez pas la permission de modifier cette affectation")
            .await?;
        self.affectation_editor(db, &projet, AffectationForm::from_model(&model))
            .await
    }

    /// Loads the project a submitted form points at, for re-rendering on error.
    pub async fn affectation_form_projet(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        form: &AffectationForm,
    ) -> HrResult<projet::Model> {
        let projet_id = form
            .projet_id()
            .ok_or_else(|| HrError::NotFound("Projet introuvable".into()))?;
        self.managed_projet(db, principal, projet_id, "update", CANNOT_MANAGE)
            .await
    }

    #[instrument(skip(self, db, form), fields(actor = principal.employee_id))]
    pub async fn save_affectation(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        form: &AffectationForm,
    ) -> HrResult<affectation_projet::Model> {
        self.affectation_form_projet(db, principal, form).await?;
        let existing = match form.record_id()? {
            Some(id) => Some(
                self.managed_affectation(
                    db,
                    principal,
                    id,
                    "update",
                    "Vous n'avez pas la permission de modifier cette affectation",
                )
                .await?
                .0,
            ),
            None => None,
        };

        let draft = form.validate()?;
        if employees::find(db, draft.id_employer).await?.is_none() {
            return Err(HrError::invalid("id_employer", "Employé introuvable"));
        }

        let mut active: affectation_projet::ActiveModel = match existing {
            Some(model) => model.into(),
            None => affectation_projet::ActiveModel {
                ..Default::default()
            },
        };
        active.id_employer = Set(draft.id_employer);
        active.id_projet = Set(draft.id_projet);
        active.date_affectation = Set(draft.date_affectation);
        active.date_fin_affectation = Set(draft.date_fin_affectation);
        let saved = active.save(db).await?.try_into_model()?;
        tracing::info!(
            affectation_id = saved.id,
            projet_id = saved.id_projet,
            employee_id = saved.id_employer,
            "affectation saved"
        );
        Ok(saved)
    }

    /// Deletes an assignment and returns its project id.
    #[instrument(skip(self, db), fields(actor = principal.employee_id))]
    pub async fn delete_affectation(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<i32> {
        let (model, _) = self
            .managed_affectation(db, principal, id, "delete", "Vous n'avez pas la permission de supprimer cette affectation")
            .await?;
        affectations::delete(db, id).await?;
        tracing::info!(affectation_id = id, projet_id = model.id_projet, "affectation deleted");
        Ok(model.id_projet)
    }

    async fn managed_affectation(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
        action: &str,
        message: &str,
    ) -> HrResult<(affectation_projet::Model, projet::Model)> {
        let model = affectations::find(db, id)
            .await?
            .ok_or_else(|| HrError::NotFound(NOT_FOUND.into()))?;
        let projet = projets::find(db, model.id_projet)
            .await?
            .ok_or_else(|| HrError::NotFound("Projet introuvable".into()))?;
        self.guard(
            principal,
            self.policy.can_manage_projet(principal, projet.chef_projet),
            action,
            &format!("affectation:{id}"),
            message,
        )?;
        Ok((model, projet))
    }
}
