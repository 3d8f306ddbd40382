use std::collections::HashMap;

use entity::departement;
use platform_authz::Principal;
use platform_db::{departements, employees, projets};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use tracing::instrument;

use crate::forms::DepartementForm;
use crate::reports::{self, PdfReport};
use crate::search::{self, ListFilter, Searchable};
use crate::{Choice, HrError, HrModule, HrResult, roles, today};

const NOT_FOUND: &str = "Département introuvable";

#[derive(Clone, Debug, Serialize)]
pub struct DepartementRow {
    pub id: i32,
    pub intitule: String,
    pub chef: Option<String>,
    pub chef_id: Option<i32>,
    pub can_manage: bool,
}

/// Form plus the employees that may be picked as chief.
#[derive(Clone, Debug, Serialize)]
pub struct DepartementEditor {
    pub form: DepartementForm,
    pub candidates: Vec<Choice>,
}

impl Searchable for DepartementRow {
    fn text(&self) -> Vec<&str> {
        vec![self.intitule.as_str(), self.chef.as_deref().unwrap_or("")]
    }
}

impl HrModule {
    pub async fn departement_rows(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        filter: &ListFilter,
    ) -> HrResult<Vec<DepartementRow>> {
        let names: HashMap<i32, String> = employees::list(db)
            .await?
            .iter()
            .map(|e| (e.id, e.full_name()))
            .collect();
        let rows = departements::list(db)
            .await?
            .into_iter()
            .map(|d| DepartementRow {
                chef: d.chef_departement.and_then(|id| names.get(&id).cloned()),
                chef_id: d.chef_departement,
                can_manage: self.policy.can_manage_departement(principal, d.chef_departement),
                id: d.id,
                intitule: d.intitule,
            })
            .collect();
        Ok(search::apply(rows, filter))
    }

    pub async fn departement_choices(&self, db: &DatabaseConnection) -> HrResult<Vec<Choice>> {
        Ok(departements::list(db).await?.iter().map(Choice::departement).collect())
    }

    /// Chief candidates: unassigned employees for a new department, members
    /// (and the sitting chief) for an existing one.
    pub async fn chief_candidates(
        &self,
        db: &DatabaseConnection,
        departement_id: Option<i32>,
    ) -> HrResult<Vec<Choice>> {
        let Some(id) = departement_id else {
            return Ok(employees::without_departement(db)
                .await?
                .iter()
                .map(Choice::employee)
                .collect());
        };
        let mut members = employees::in_departement(db, id).await?;
        if let Some(chef) = departements::find(db, id).await?.and_then(|d| d.chef_departement) {
            if !members.iter().any(|m| m.id == chef) {
                if let Some(model) = employees::find(db, chef).await? {
                    members.push(model);
                }
            }
        }
        Ok(members.iter().map(Choice::employee).collect())
    }

    pub async fn departement_add_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> HrResult<DepartementEditor> {
        self.guard(
            principal,
            self.policy.can_create_departement(principal),
            "create",
            "departement",
            "Seul un administrateur peut ajouter un département",
        )?;
        Ok(DepartementEditor {
            form: DepartementForm::default(),
            candidates: self.chief_candidates(db, None).await?,
        })
    }

    pub async fn departement_edit_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<DepartementEditor> {
        let model = self.load_departement(db, id).await?;
        self.guard(
            principal,
            self.policy.can_manage_departement(principal, model.chef_departement),
            "update",
            &format!("departement:{id}"),
            "Vous n'avez pas la permission de modifier ce département",
        )?;
        Ok(DepartementEditor {
            form: DepartementForm::from_model(&model),
            candidates: self.chief_candidates(db, Some(id)).await?,
        })
    }

    #[instrument(skip(self, db, form), fields(actor = principal.employee_id))]
    pub async fn save_departement(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        form: &DepartementForm,
    ) -> HrResult<departement::Model> {
        let existing = match form.record_id()? {
            Some(id) => {
                let model = self.load_departement(db, id).await?;
                self.guard(
                    principal,
                    self.policy.can_manage_departement(principal, model.chef_departement),
                    "update",
                    &format!("departement:{id}"),
                    "Vous n'avez pas la permission de modifier ce département",
                )?;
                Some(model)
            }
            None => {
                self.guard(
                    principal,
                    self.policy.can_create_departement(principal),
                    "create",
                    "departement",
                    "Seul un administrateur peut créer un département",
                )?;
                None
            }
        };

        let draft = form.validate()?;
        if departements::intitule_taken(db, &draft.intitule, draft.id).await? {
            return Err(HrError::invalid("intitule", "Cet intitulé existe déjà"));
        }
        let chef = match draft.chef_departement {
            Some(chef_id) => {
                let Some(chef) = employees::find(db, chef_id).await? else {
                    return Err(HrError::invalid("chef_departement", "Employé introuvable"));
                };
                if !departements::headed_by(db, chef_id, draft.id).await?.is_empty() {
                    return Err(HrError::invalid(
                        "chef_departement",
                        "Cet employé est déjà chef d'un autre département",
                    ));
                }
                Some(chef)
            }
            None => None,
        };

        let previous_chef = existing.as_ref().and_then(|d| d.chef_departement);
        let txn = db.begin().await?;
        let saved = match existing {
            Some(model) => {
                let mut active: departement::ActiveModel = model.into();
                active.intitule = Set(draft.intitule);
                active.chef_departement = Set(draft.chef_departement);
                active.update(&txn).await?
            }
            None => {
                departement::ActiveModel {
                    intitule: Set(draft.intitule),
                    chef_departement: Set(draft.chef_departement),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };
        if let Some(chef) = chef.filter(|c| c.id_departement.is_none()) {
            let mut active: entity::employee::ActiveModel = chef.into();
            active.id_departement = Set(Some(saved.id));
            active.update(&txn).await?;
        }
        roles::resync_all(&txn, [previous_chef, saved.chef_departement]).await?;
        txn.commit().await?;

        tracing::info!(departement_id = saved.id, "departement saved");
        Ok(saved)
    }

    #[instrument(skip(self, db), fields(actor = principal.employee_id))]
    pub async fn delete_departement(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<()> {
        let model = self.load_departement(db, id).await?;
        self.guard(
            principal,
            self.policy.can_manage_departement(principal, model.chef_departement),
            "delete",
            &format!("departement:{id}"),
            "Vous n'avez pas la permission de supprimer ce département",
        )?;

        let txn = db.begin().await?;
        let employees_detached = employees::detach_departement(&txn, id).await?;
        let projets_detached = projets::detach_departement(&txn, id).await?;
        departements::delete(&txn, id).await?;
        roles::resync_all(&txn, [model.chef_departement]).await?;
        txn.commit().await?;

        tracing::info!(
            departement_id = id,
            employees_detached,
            projets_detached,
            "departement deleted"
        );
        Ok(())
    }

    pub async fn export_departements(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> HrResult<PdfReport> {
        let rows = self.departement_rows(db, principal, &ListFilter::default()).await?;
        Ok(reports::departements_report(&rows, today())?)
    }

    async fn load_departement(
        &self,
        db: &DatabaseConnection,
        id: i32,
    ) -> HrResult<departement::Model> {
        departements::find(db, id)
            .await?
            .ok_or_else(|| HrError::NotFound(NOT_FOUND.into()))
    }
}
