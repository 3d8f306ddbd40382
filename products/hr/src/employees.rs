use std::collections::HashMap;

use entity::employee;
use platform_api::FieldErrors;
use platform_authn::hash_password;
use platform_authz::Principal;
use platform_db::{affectations, departements, employees, fiches, projets, sessions};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use tracing::instrument;

use crate::forms::{EmployeeDraft, EmployeeForm};
use crate::reports::{self, PdfReport};
use crate::search::{self, ListFilter, Searchable};
use crate::{Choice, HrError, HrModule, HrResult, money, today};

const NOT_FOUND: &str = "Employé introuvable";

/// One line of the employee list.
#[derive(Clone, Debug, Serialize)]
pub struct EmployeeRow {
    pub id: i32,
    pub matricule: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: Option<String>,
    pub poste: String,
    pub grade: String,
    pub salaire: String,
    pub date_embauche: String,
    pub departement: Option<String>,
    pub role: String,
}

impl Searchable for EmployeeRow {
    fn text(&self) -> Vec<&str> {
        vec![
            self.matricule.as_str(),
            self.nom.as_str(),
            self.prenom.as_str(),
            self.email.as_str(),
            self.telephone.as_deref().unwrap_or(""),
            self.poste.as_str(),
            self.grade.as_str(),
            self.salaire.as_str(),
            self.date_embauche.as_str(),
            self.departement.as_deref().unwrap_or(""),
            self.role.as_str(),
        ]
    }

    fn columns(&self, filter: &ListFilter) -> bool {
        filter.matches_departement(self.departement.as_deref()) && filter.matches_role(&self.role)
    }
}

impl HrModule {
    pub async fn employee_rows(
        &self,
        db: &DatabaseConnection,
        filter: &ListFilter,
    ) -> HrResult<Vec<EmployeeRow>> {
        let labels: HashMap<i32, String> = departements::list(db)
            .await?
            .into_iter()
            .map(|d| (d.id, d.intitule))
            .collect();
        let rows = employees::list(db)
            .await?
            .into_iter()
            .map(|e| EmployeeRow {
                departement: e.id_departement.and_then(|id| labels.get(&id).cloned()),
                id: e.id,
                salaire: money::format_euros(e.salaire_base_cents),
                date_embauche: e.date_embauche.format("%d/%m/%Y").to_string(),
                matricule: e.matricule,
                nom: e.nom,
                prenom: e.prenom,
                email: e.email,
                telephone: e.telephone,
                poste: e.poste,
                grade: e.grade,
                role: e.role,
            })
            .collect();
        Ok(search::apply(rows, filter))
    }

    pub async fn employee_choices(&self, db: &DatabaseConnection) -> HrResult<Vec<Choice>> {
        Ok(employees::list(db).await?.iter().map(Choice::employee).collect())
    }

    pub fn check_can_add_employee(&self, principal: &Principal) -> HrResult<()> {
        self.guard(
            principal,
            self.policy.can_manage_employees(principal),
            "create",
            "employee",
            "Seul un administrateur peut ajouter un employé",
        )
    }

    pub async fn employee_edit_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<EmployeeForm> {
        self.guard(
            principal,
            self.policy.can_manage_employees(principal),
            "update",
            &format!("employee:{id}"),
            "Seul un administrateur peut modifier un employé",
        )?;
        let model = employees::find(db, id)
            .await?
            .ok_or_else(|| HrError::NotFound(NOT_FOUND.into()))?;
        Ok(EmployeeForm::from_model(&model))
    }

    #[instrument(skip(self, db, form), fields(actor = principal.employee_id))]
    pub async fn save_employee(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        form: &EmployeeForm,
    ) -> HrResult<employee::Model> {
        let record_id = form.record_id()?;
        let message = if record_id.is_some() {
            "Seul un administrateur peut modifier un employé"
        } else {
            "Seul un administrateur peut ajouter un employé"
        };
        self.guard(
            principal,
            self.policy.can_manage_employees(principal),
            "save",
            "employee",
            message,
        )?;
        let existing = match record_id {
            Some(id) => Some(
                employees::find(db, id)
                    .await?
                    .ok_or_else(|| HrError::NotFound(NOT_FOUND.into()))?,
            ),
            None => None,
        };

        let draft = form.validate(today())?;
        let mut errors = FieldErrors::new();
        if employees::email_taken(db, &draft.email, draft.id).await? {
            errors.add("email", "Cet email est déjà utilisé");
        }
        if let Some(dept) = draft.id_departement {
            if !departements::exists(db, dept).await? {
                errors.add("id_departement", "Le département sélectionné est invalide");
            }
        }
        if !errors.is_empty() {
            return Err(HrError::Invalid(errors));
        }

        let saved = match existing {
            None => self.insert_employee(db, draft).await?,
            Some(model) => self.update_employee(db, model, draft).await?,
        };
        tracing::info!(employee_id = saved.id, "employee saved");
        Ok(saved)
    }

    async fn insert_employee(
        &self,
        db: &DatabaseConnection,
        draft: EmployeeDraft,
    ) -> HrResult<employee::Model> {
        let plain = draft.password.as_deref().unwrap_or_default();
        let password_hash = hash_password(plain)?;
        let model = employee::ActiveModel {
            matricule: Set(draft.matricule),
            nom: Set(draft.nom),
            prenom: Set(draft.prenom),
            email: Set(draft.email),
            telephone: Set(draft.telephone),
            password_hash: Set(password_hash),
            poste: Set(draft.poste),
            grade: Set(draft.grade),
            salaire_base_cents: Set(draft.salaire_base_cents),
            date_embauche: Set(draft.date_embauche),
            id_departement: Set(draft.id_departement),
            role: Set(draft.role.as_str().to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(model)
    }

    async fn update_employee(
        &self,
        db: &DatabaseConnection,
        current: employee::Model,
        draft: EmployeeDraft,
    ) -> HrResult<employee::Model> {
        let mut active: employee::ActiveModel = current.into();
        if let Some(plain) = draft.password.as_deref() {
            active.password_hash = Set(hash_password(plain)?);
        }
        active.matricule = Set(draft.matricule);
        active.nom = Set(draft.nom);
        active.prenom = Set(draft.prenom);
        active.email = Set(draft.email);
        active.telephone = Set(draft.telephone);
        active.poste = Set(draft.poste);
        active.grade = Set(draft.grade);
        active.salaire_base_cents = Set(draft.salaire_base_cents);
        active.date_embauche = Set(draft.date_embauche);
        active.id_departement = Set(draft.id_departement);
        active.role = Set(draft.role.as_str().to_string());
        Ok(active.update(db).await?)
    }

    /// Removes the employee with everything that references them, freeing
    /// the department and project chief positions they held.
    #[instrument(skip(self, db), fields(actor = principal.employee_id))]
    pub async fn delete_employee(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<()> {
        self.guard(
            principal,
            self.policy.can_manage_employees(principal),
            "delete",
            &format!("employee:{id}"),
            "Seul un administrateur peut supprimer un employé",
        )?;
        if id == principal.employee_id {
            return Err(HrError::Denied(
                "Vous ne pouvez pas supprimer votre propre compte".into(),
            ));
        }
        if employees::find(db, id).await?.is_none() {
            return Err(HrError::NotFound(NOT_FOUND.into()));
        }

        let txn = db.begin().await?;
        let departements_freed = departements::release_chief(&txn, id).await?;
        let projets_freed = projets::release_chief(&txn, id).await?;
        let fiches_removed = fiches::delete_for_employee(&txn, id).await?;
        affectations::delete_for_employee(&txn, id).await?;
        sessions::delete_for_employee(&txn, id).await?;
        employees::delete(&txn, id).await?;
        txn.commit().await?;

        tracing::info!(
            employee_id = id,
            departements_freed,
            projets_freed,
            fiches_removed,
            "employee deleted"
        );
        Ok(())
    }

    pub async fn export_employees(&self, db: &DatabaseConnection) -> HrResult<PdfReport> {
        let rows = employees::list(db).await?;
        Ok(reports::employees_report(&rows, today())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{departement, employee, memory_db, principal_of, projet};
    use entity::{affectation_projet, fiche_de_paie};
    use platform_authz::Role;
    use sea_orm::EntityTrait;

    fn form(email: &str) -> EmployeeForm {
        EmployeeForm {
            matricule: Some("EMP100".into()),
            nom: Some("Bernard".into()),
            prenom: Some("Louis".into()),
            email: Some(email.into()),
            password: Some("motdepasse".into()),
            poste: Some("Technicien".into()),
            grade: Some("C1".into()),
            salaire_base: Some("2100".into()),
            date_embauche: Some("2020-02-10".into()),
            ..EmployeeForm::default()
        }
    }

    #[tokio::test]
    async fn only_admin_creates_employees() {
        let db = memory_db().await;
        let chef = employee(&db, "chef@cy-rh.local", Role::ChefDept, None).await;
        let hr = HrModule::default();
        let err = hr
            .save_employee(&db, &principal_of(&chef), &form("louis@cy-rh.local"))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::Denied(msg) if msg == "Seul un administrateur peut ajouter un employé"));
        assert!(hr.check_can_add_employee(&principal_of(&chef)).is_err());
    }

    #[tokio::test]
    async fn create_hashes_password_and_rejects_duplicate_email() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let hr = HrModule::default();
        let saved = hr
            .save_employee(&db, &principal_of(&admin), &form("Louis@CY-RH.local"))
            .await
            .unwrap();
        assert_eq!(saved.email, "louis@cy-rh.local");
        assert!(platform_authn::verify_password("motdepasse", &saved.password_hash));
        assert_eq!(saved.role, "EMPLOYE");

        let err = hr
            .save_employee(&db, &principal_of(&admin), &form("louis@cy-rh.local"))
            .await
            .unwrap_err();
        let HrError::Invalid(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("email"), ["Cet email est déjà utilisé"]);
    }

    #[tokio::test]
    async fn blank_password_on_update_keeps_hash() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let hr = HrModule::default();
        let saved = hr
            .save_employee(&db, &principal_of(&admin), &form("louis@cy-rh.local"))
            .await
            .unwrap();
        let mut edit = EmployeeForm::from_model(&saved);
        edit.poste = Some("Chef d'équipe".into());
        edit.password = Some(String::new());
        let updated = hr
            .save_employee(&db, &principal_of(&admin), &edit)
            .await
            .unwrap();
        assert_eq!(updated.poste, "Chef d'équipe");
        assert_eq!(updated.password_hash, saved.password_hash);
    }

    #[tokio::test]
    async fn unknown_departement_is_a_field_error() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let mut input = form("louis@cy-rh.local");
        input.id_departement = Some("77".into());
        let err = HrModule::default()
            .save_employee(&db, &principal_of(&admin), &input)
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::Invalid(e) if e.has("id_departement")));
    }

    #[tokio::test]
    async fn delete_cascades_and_frees_positions() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let chef = employee(&db, "chef@cy-rh.local", Role::ChefDept, None).await;
        let dept = departement(&db, "Logistique", Some(chef.id)).await;
        let proj = projet(&db, "Entrepôt Nord", Some(chef.id)).await;
        fiche_de_paie::ActiveModel {
            id_employer: Set(chef.id),
            mois: Set(1),
            annee: Set(2024),
            salaire_base_cents: Set(300_000),
            primes_cents: Set(0),
            deductions_cents: Set(0),
            net_a_payer_cents: Set(300_000),
            date_generation: Set(crate::testing::date(2024, 1, 31)),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        affectation_projet::ActiveModel {
            id_employer: Set(chef.id),
            id_projet: Set(proj.id),
            date_affectation: Set(crate::testing::date(2024, 1, 15)),
            date_fin_affectation: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let hr = HrModule::default();
        hr.delete_employee(&db, &principal_of(&admin), chef.id)
            .await
            .unwrap();

        assert!(employees::find(&db, chef.id).await.unwrap().is_none());
        let dept = departements::find(&db, dept.id).await.unwrap().unwrap();
        assert_eq!(dept.chef_departement, None);
        let proj = projets::find(&db, proj.id).await.unwrap().unwrap();
        assert_eq!(proj.chef_projet, None);
        assert!(fiche_de_paie::Entity::find().all(&db).await.unwrap().is_empty());
        assert!(affectation_projet::Entity::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_cannot_delete_self_and_missing_is_not_found() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let hr = HrModule::default();
        let p = principal_of(&admin);
        assert!(matches!(
            hr.delete_employee(&db, &p, admin.id).await,
            Err(HrError::Denied(_))
        ));
        assert!(matches!(
            hr.delete_employee(&db, &p, 4242).await,
            Err(HrError::NotFound(msg)) if msg == "Employé introuvable"
        ));
    }

    #[tokio::test]
    async fn rows_resolve_departement_labels() {
        let db = memory_db().await;
        let dept = departement(&db, "Achats", None).await;
        employee(&db, "a@cy-rh.local", Role::Employe, Some(dept.id)).await;
        employee(&db, "b@cy-rh.local", Role::Employe, None).await;
        let rows = HrModule::default()
            .employee_rows(&db, &ListFilter::default())
            .await
            .unwrap();
        assert_eq!(rows[0].departement.as_deref(), Some("Achats"));
        assert_eq!(rows[0].salaire, "3 200,00 €");
        assert_eq!(rows[1].departement, None);
    }

    #[tokio::test]
    async fn rows_follow_search_and_column_filters() {
        let db = memory_db().await;
        let dept = departement(&db, "Achats", None).await;
        employee(&db, "a@cy-rh.local", Role::Employe, Some(dept.id)).await;
        employee(&db, "b@cy-rh.local", Role::Admin, None).await;
        let hr = HrModule::default();

        let found = hr.employee_rows(&db, &ListFilter::text("B@CY")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "b@cy-rh.local");

        let by_dept = ListFilter {
            departement: Some("achats".into()),
            ..ListFilter::default()
        };
        let rows = hr.employee_rows(&db, &by_dept).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "a@cy-rh.local");

        let by_role = ListFilter {
            role: Some("ADMIN".into()),
            q: Some("durand".into()),
            ..ListFilter::default()
        };
        let rows = hr.employee_rows(&db, &by_role).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, "ADMIN");

        assert!(hr.employee_rows(&db, &ListFilter::text("inconnu")).await.unwrap().is_empty());
    }
}
