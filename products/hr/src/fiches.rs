use std::collections::HashMap;

use entity::{employee, fiche_de_paie};
use platform_api::FieldErrors;
use platform_authz::{PayslipScope, Principal};
use platform_db::{employees, fiches};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TryIntoModel};
use serde::Serialize;
use tracing::instrument;

use crate::forms::FicheForm;
use crate::projets::display_date;
use crate::reports::{self, PdfReport};
use crate::search::{self, ListFilter, Searchable};
use crate::{Choice, HrError, HrModule, HrResult, money, today};

const NOT_FOUND: &str = "Fiche de paie introuvable";

#[derive(Clone, Debug, Serialize)]
pub struct FicheRow {
    pub id: i32,
    pub employee: Option<String>,
    pub matricule: Option<String>,
    pub periode: String,
    pub mois: i32,
    pub annee: i32,
    pub salaire_base: String,
    pub primes: String,
    pub deductions: String,
    pub net_a_payer: String,
    pub date_generation: String,
    pub can_modify: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct FicheEditor {
    pub form: FicheForm,
    pub employees: Vec<Choice>,
}

impl Searchable for FicheRow {
    fn text(&self) -> Vec<&str> {
        vec![
            self.employee.as_deref().unwrap_or(""),
            self.matricule.as_deref().unwrap_or(""),
            self.periode.as_str(),
            self.salaire_base.as_str(),
            self.primes.as_str(),
            self.deductions.as_str(),
            self.net_a_payer.as_str(),
            self.date_generation.as_str(),
        ]
    }

    fn columns(&self, filter: &ListFilter) -> bool {
        filter.matches_periode(self.mois, self.annee)
    }
}

impl HrModule {
    pub async fn fiche_rows(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        filter: &ListFilter,
    ) -> HrResult<Vec<FicheRow>> {
        let owners: HashMap<i32, employee::Model> = employees::list(db)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        let scope = self.policy.payslip_scope(principal);
        let fiches = match scope {
            PayslipScope::Own(id) => fiches::for_employees(db, vec![id]).await?,
            _ => fiches::list(db).await?,
        };
        let rows = fiches
            .into_iter()
            .filter_map(|f| {
                let owner = owners.get(&f.id_employer);
                let owner_dept = owner.and_then(|o| o.id_departement);
                if !scope.includes(f.id_employer, owner_dept) {
                    return None;
                }
                Some(FicheRow {
                    id: f.id,
                    employee: owner.map(|o| o.full_name()),
                    matricule: owner.map(|o| o.matricule.clone()),
                    periode: money::periode(f.mois, f.annee),
                    mois: f.mois,
                    annee: f.annee,
                    salaire_base: money::format_euros(f.salaire_base_cents),
                    primes: money::format_euros(f.primes_cents),
                    deductions: money::format_euros(f.deductions_cents),
                    net_a_payer: money::format_euros(f.net_a_payer_cents),
                    date_generation: display_date(f.date_generation),
                    can_modify: self.policy.can_modify_fiche(principal, owner_dept),
                })
            })
            .collect();
        Ok(search::apply(rows, filter))
    }

    /// Employees a payslip may be written for: everyone for an admin, the
    /// department's members for a chief.
    pub async fn fiche_candidates(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> HrResult<Vec<Choice>> {
        let models = if principal.is_admin() {
            employees::list(db).await?
        } else {
            match principal.departement_id {
                Some(dept) => employees::in_departement(db, dept).await?,
                None => Vec::new(),
            }
        };
        Ok(models.iter().map(Choice::employee).collect())
    }

    pub async fn fiche_add_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> HrResult<FicheEditor> {
        self.check_can_create_fiche(principal)?;
        Ok(FicheEditor {
            form: FicheForm::blank(today()),
            employees: self.fiche_candidates(db, principal).await?,
        })
    }

    pub async fn fiche_edit_form(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<FicheEditor> {
        let model = self
            .modifiable_fiche(db, principal, id, "update", "Vous n'avez pas la permission de modifier cette fiche de paie")
            .await?;
        Ok(FicheEditor {
            form: FicheForm::from_model(&model),
            employees: self.fiche_candidates(db, principal).await?,
        })
    }

    #[instrument(skip(self, db, form), fields(actor = principal.employee_id))]
    pub async fn save_fiche(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        form: &FicheForm,
    ) -> HrResult<fiche_de_paie::Model> {
        let existing = match form.record_id()? {
            Some(id) => Some(
                self.modifiable_fiche(db, principal, id, "update", "Vous n'avez pas la permission de modifier cette fiche de paie")
                    .await?,
            ),
            None => {
                self.check_can_create_fiche(principal)?;
                None
            }
        };

        let draft = form.validate(today())?;
        let mut errors = FieldErrors::new();
        match employees::find(db, draft.id_employer).await? {
            None => errors.add("id_employer", "Employé introuvable"),
            Some(owner) if !self.policy.can_create_fiche_for(principal, owner.id_departement) => {
                errors.add(
                    "id_employer",
                    "Vous ne pouvez gérer que les fiches de paie de votre département",
                )
            }
            Some(_) => {}
        }
        if fiches::period_taken(db, draft.id_employer, draft.mois, draft.annee, draft.id).await? {
            errors.add(
                "mois",
                "Une fiche de paie existe déjà pour cet employé et cette période",
            );
        }
        if !errors.is_empty() {
            return Err(HrError::Invalid(errors));
        }

        let net = draft.net_a_payer_cents();
        let mut active: fiche_de_paie::ActiveModel = match existing {
            Some(model) => model.into(),
            None => fiche_de_paie::ActiveModel {
                ..Default::default()
            },
        };
        active.id_employer = Set(draft.id_employer);
        active.mois = Set(draft.mois);
        active.annee = Set(draft.annee);
        active.salaire_base_cents = Set(draft.salaire_base_cents);
        active.primes_cents = Set(draft.primes_cents);
        active.deductions_cents = Set(draft.deductions_cents);
        active.net_a_payer_cents = Set(net);
        active.date_generation = Set(draft.date_generation);
        let saved = active.save(db).await?.try_into_model()?;
        tracing::info!(fiche_id = saved.id, employee_id = saved.id_employer, "fiche de paie saved");
        Ok(saved)
    }

    #[instrument(skip(self, db), fields(actor = principal.employee_id))]
    pub async fn delete_fiche(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<()> {
        self.modifiable_fiche(db, principal, id, "delete", "Vous n'avez pas la permission de supprimer cette fiche de paie")
            .await?;
        fiches::delete(db, id).await?;
        tracing::info!(fiche_id = id, "fiche de paie deleted");
        Ok(())
    }

    /// Renders one payslip for a caller allowed to view it.
    pub async fn export_fiche(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
    ) -> HrResult<PdfReport> {
        let fiche = fiches::find(db, id)
            .await?
            .ok_or_else(|| HrError::NotFound(NOT_FOUND.into()))?;
        let owner = employees::find(db, fiche.id_employer).await?;
        let owner_dept = owner.as_ref().and_then(|o| o.id_departement);
        self.guard(
            principal,
            self.policy.can_view_fiche(principal, fiche.id_employer, owner_dept),
            "export",
            &format!("fiche:{id}"),
            "Vous n'avez pas la permission de consulter cette fiche de paie",
        )?;
        Ok(reports::payslip_report(&fiche, owner.as_ref(), &self.company)?)
    }

    fn check_can_create_fiche(&self, principal: &Principal) -> HrResult<()> {
        self.guard(
            principal,
            self.policy.can_create_fiche(principal),
            "create",
            "fiche",
            "Vous n'avez pas la permission de créer une fiche de paie",
        )
    }

    async fn modifiable_fiche(
        &self,
        db: &DatabaseConnection,
        principal: &Principal,
        id: i32,
        action: &str,
        message: &str,
    ) -> HrResult<fiche_de_paie::Model> {
        let model = fiches::find(db, id)
            .await?
            .ok_or_else(|| HrError::NotFound(NOT_FOUND.into()))?;
        let owner_dept = employees::find(db, model.id_employer)
            .await?
            .and_then(|o| o.id_departement);
        self.guard(
            principal,
            self.policy.can_modify_fiche(principal, owner_dept),
            action,
            &format!("fiche:{id}"),
            message,
        )?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{departement, employee, memory_db, principal_of};
    use platform_authz::Role;

    fn form(employee_id: i32, mois: i32) -> FicheForm {
        FicheForm {
            id_employer: Some(employee_id.to_string()),
            mois: Some(mois.to_string()),
            annee: Some("2024".into()),
            salaire_base: Some("2500".into()),
            primes: Some("300.50".into()),
            deductions: Some("120".into()),
            ..FicheForm::default()
        }
    }

    #[tokio::test]
    async fn net_is_computed_and_dated_today() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let emp = employee(&db, "e@cy-rh.local", Role::Employe, None).await;
        let saved = HrModule::default()
            .save_fiche(&db, &principal_of(&admin), &form(emp.id, 2))
            .await
            .unwrap();
        assert_eq!(saved.net_a_payer_cents, 268_050);
        assert_eq!(saved.date_generation, today());
    }

    #[tokio::test]
    async fn duplicate_period_is_rejected() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let emp = employee(&db, "e@cy-rh.local", Role::Employe, None).await;
        let hr = HrModule::default();
        let p = principal_of(&admin);
        let first = hr.save_fiche(&db, &p, &form(emp.id, 3)).await.unwrap();
        assert!(matches!(
            hr.save_fiche(&db, &p, &form(emp.id, 3)).await,
            Err(HrError::Invalid(e)) if e.has("mois")
        ));
        // Re-saving the same payslip is not a duplicate.
        let edit = FicheForm::from_model(&first);
        assert!(hr.save_fiche(&db, &p, &edit).await.is_ok());
    }

    #[tokio::test]
    async fn chief_is_limited_to_own_departement() {
        let db = memory_db().await;
        let dept = departement(&db, "Finance", None).await;
        let other = departement(&db, "Ventes", None).await;
        let chef = employee(&db, "chef@cy-rh.local", Role::ChefDept, Some(dept.id)).await;
        let member = employee(&db, "m@cy-rh.local", Role::Employe, Some(dept.id)).await;
        let outsider = employee(&db, "o@cy-rh.local", Role::Employe, Some(other.id)).await;
        let hr = HrModule::default();
        let p = principal_of(&chef);

        assert!(hr.save_fiche(&db, &p, &form(member.id, 1)).await.is_ok());
        assert!(matches!(
            hr.save_fiche(&db, &p, &form(outsider.id, 1)).await,
            Err(HrError::Invalid(e)) if e.has("id_employer")
        ));

        let candidates = hr.fiche_candidates(&db, &p).await.unwrap();
        let ids: Vec<i32> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![chef.id, member.id]);
    }

    #[tokio::test]
    async fn listing_and_export_follow_scope() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let dept = departement(&db, "Finance", None).await;
        let chef = employee(&db, "chef@cy-rh.local", Role::ChefDept, Some(dept.id)).await;
        let member = employee(&db, "m@cy-rh.local", Role::Employe, Some(dept.id)).await;
        let loner = employee(&db, "l@cy-rh.local", Role::Employe, None).await;
        let hr = HrModule::default();
        let a = principal_of(&admin);
        hr.save_fiche(&db, &a, &form(member.id, 1)).await.unwrap();
        let lone = hr.save_fiche(&db, &a, &form(loner.id, 1)).await.unwrap();

        let any = ListFilter::default();
        assert_eq!(hr.fiche_rows(&db, &a, &any).await.unwrap().len(), 2);
        let chef_rows = hr.fiche_rows(&db, &principal_of(&chef), &any).await.unwrap();
        assert_eq!(chef_rows.len(), 1);
        assert!(chef_rows[0].can_modify);
        let own = hr.fiche_rows(&db, &principal_of(&loner), &any).await.unwrap();
        assert_eq!(own.len(), 1);
        assert!(!own[0].can_modify);
        assert_eq!(own[0].net_a_payer, "2 680,50 €");

        let report = hr.export_fiche(&db, &principal_of(&loner), lone.id).await.unwrap();
        assert_eq!(report.filename, "fiche_paie_JANVIER_2024.pdf");
        assert!(report.bytes.starts_with(b"%PDF"));
        assert!(matches!(
            hr.export_fiche(&db, &principal_of(&member), lone.id).await,
            Err(HrError::Denied(_))
        ));
        assert!(matches!(
            hr.export_fiche(&db, &a, 9999).await,
            Err(HrError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn employee_cannot_create_or_delete() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let emp = employee(&db, "e@cy-rh.local", Role::Employe, None).await;
        let hr = HrModule::default();
        let fiche = hr.save_fiche(&db, &principal_of(&admin), &form(emp.id, 5)).await.unwrap();
        let p = principal_of(&emp);
        assert!(matches!(
            hr.fiche_add_form(&db, &p).await,
            Err(HrError::Denied(msg)) if msg == "Vous n'avez pas la permission de créer une fiche de paie"
        ));
        assert!(matches!(
            hr.delete_fiche(&db, &p, fiche.id).await,
            Err(HrError::Denied(msg)) if msg == "Vous n'avez pas la permission de supprimer cette fiche de paie"
        ));
    }

    #[tokio::test]
    async fn rows_filter_on_periode_and_text() {
        let db = memory_db().await;
        let admin = employee(&db, "admin@cy-rh.local", Role::Admin, None).await;
        let emp = employee(&db, "e@cy-rh.local", Role::Employe, None).await;
        let hr = HrModule::default();
        let a = principal_of(&admin);
        hr.save_fiche(&db, &a, &form(emp.id, 1)).await.unwrap();
        hr.save_fiche(&db, &a, &form(emp.id, 2)).await.unwrap();

        let february = ListFilter {
            mois: Some("2".into()),
            annee: Some("2024".into()),
            ..ListFilter::default()
        };
        let rows = hr.fiche_rows(&db, &a, &february).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].periode, "FÉVRIER 2024");

        let rows = hr.fiche_rows(&db, &a, &ListFilter::text("janvier")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mois, 1);

        let other_year = ListFilter {
            annee: Some("2023".into()),
            ..ListFilter::default()
        };
        assert!(hr.fiche_rows(&db, &a, &other_year).await.unwrap().is_empty());
    }
}
