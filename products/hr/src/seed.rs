//! First-run data: the admin account and a small demo organisation.

use chrono::NaiveDate;
use entity::{affectation_projet, departement, employee, fiche_de_paie, projet};
use platform_authn::hash_password;
use platform_authz::Role;
use platform_db::{departements, employees};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};

use crate::forms::normalize_email;
use crate::{HrResult, roles};

#[derive(Clone, Debug)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl Default for SeedAdmin {
    fn default() -> Self {
        Self {
            email: "admin@cy-rh.local".into(),
            password: "admin123".into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    pub admin_created: bool,
    pub demo_created: bool,
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

struct Person {
    matricule: &'static str,
    prenom: &'static str,
    nom: &'static str,
    email: &'static str,
    poste: &'static str,
    grade: &'static str,
    salaire_cents: i64,
    hired: NaiveDate,
}

/// Safe to run repeatedly: the admin is keyed by email and the demo data is
/// only written into an empty department table.
#[tracing::instrument(skip_all, fields(admin = %admin.email))]
pub async fn run(db: &DatabaseConnection, admin: &SeedAdmin) -> HrResult<SeedOutcome> {
    let mut outcome = SeedOutcome::default();
    let email = normalize_email(&admin.email);
    if employees::find_by_email(db, &email).await?.is_none() {
        employee::ActiveModel {
            matricule: Set("ADMIN001".into()),
            nom: Set("Système".into()),
            prenom: Set("Administrateur".into()),
            email: Set(email),
            telephone: Set(None),
            password_hash: Set(hash_password(&admin.password)?),
            poste: Set("Administrateur RH".into()),
            grade: Set("Cadre".into()),
            salaire_base_cents: Set(450_000),
            date_embauche: Set(day(2020, 1, 6)),
            id_departement: Set(None),
            role: Set(Role::Admin.as_str().into()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        outcome.admin_created = true;
        tracing::info!("admin account created");
    }

    if departements::count(db).await? == 0 {
        demo(db, &admin.password).await?;
        outcome.demo_created = true;
        tracing::info!("demo organisation created");
    }
    Ok(outcome)
}

async fn demo(db: &DatabaseConnection, password: &str) -> HrResult<()> {
    let people = [
        Person { matricule: "EMP001", prenom: "Claire", nom: "Martin", email: "claire.martin@cy-rh.local", poste: "Responsable financière", grade: "Cadre", salaire_cents: 420_000, hired: day(2019, 3, 4) },
        Person { matricule: "EMP002", prenom: "Hugo", nom: "Lefèvre", email: "hugo.lefevre@cy-rh.local", poste: "Comptable", grade: "Technicien", salaire_cents: 260_000, hired: day(2021, 9, 1) },
        Person { matricule: "EMP003", prenom: "Inès", nom: "Moreau", email: "ines.moreau@cy-rh.local", poste: "Directrice technique", grade: "Cadre", salaire_cents: 510_000, hired: day(2018, 1, 15) },
        Person { matricule: "EMP004", prenom: "Yanis", nom: "Girard", email: "yanis.girard@cy-rh.local", poste: "Développeur", grade: "Ingénieur", salaire_cents: 350_000, hired: day(2022, 2, 7) },
        Person { matricule: "EMP005", prenom: "Léa", nom: "Roux", email: "lea.roux@cy-rh.local", poste: "Développeuse", grade: "Ingénieur", salaire_cents: 340_000, hired: day(2023, 4, 3) },
    ];
    let password_hash = hash_password(password)?;

    let txn = db.begin().await?;
    let finance = departement::ActiveModel {
        intitule: Set("Finance".into()),
        chef_departement: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let tech = departement::ActiveModel {
        intitule: Set("Informatique".into()),
        chef_departement: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut staff = Vec::with_capacity(people.len());
    for (i, person) in people.iter().enumerate() {
        let dept = if i < 2 { finance.id } else { tech.id };
        let model = employee::ActiveModel {
            matricule: Set(person.matricule.into()),
            nom: Set(person.nom.into()),
            prenom: Set(person.prenom.into()),
            email: Set(person.email.into()),
            telephone: Set(Some(format!("06 12 34 56 {:02}", i + 10))),
            password_hash: Set(password_hash.clone()),
            poste: Set(person.poste.into()),
            grade: Set(person.grade.into()),
            salaire_base_cents: Set(person.salaire_cents),
            date_embauche: Set(person.hired),
            id_departement: Set(Some(dept)),
            role: Set(Role::Employe.as_str().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        staff.push(model);
    }

    let mut finance: departement::ActiveModel = finance.into();
    finance.chef_departement = Set(Some(staff[0].id));
    finance.update(&txn).await?;
    let mut tech: departement::ActiveModel = tech.into();
    tech.chef_departement = Set(Some(staff[2].id));
    let tech = tech.update(&txn).await?;

    let portail = projet::ActiveModel {
        nom_projet: Set("Portail collaborateurs".into()),
        etat_projet: Set(projet::Etat::EnCours),
        date_debut: Set(day(2024, 1, 8)),
        date_fin_prevue: Set(Some(day(2024, 12, 20))),
        date_fin_reelle: Set(None),
        chef_projet: Set(Some(staff[3].id)),
        id_departement: Set(Some(tech.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    projet::ActiveModel {
        nom_projet: Set("Migration comptable".into()),
        etat_projet: Set(projet::Etat::Termine),
        date_debut: Set(day(2023, 3, 1)),
        date_fin_prevue: Set(Some(day(2023, 9, 30))),
        date_fin_reelle: Set(Some(day(2023, 10, 13))),
        chef_projet: Set(None),
        id_departement: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for member in &staff[3..] {
        affectation_projet::ActiveModel {
            id_employer: Set(member.id),
            id_projet: Set(portail.id),
            date_affectation: Set(day(2024, 1, 8)),
            date_fin_affectation: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for member in &staff {
        let primes = member.salaire_base_cents / 20;
        let deductions = member.salaire_base_cents * 22 / 100;
        fiche_de_paie::ActiveModel {
            id_employer: Set(member.id),
            mois: Set(1),
            annee: Set(2024),
            salaire_base_cents: Set(member.salaire_base_cents),
            primes_cents: Set(primes),
            deductions_cents: Set(deductions),
            net_a_payer_cents: Set(member.salaire_base_cents + primes - deductions),
            date_generation: Set(day(2024, 1, 31)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    roles::resync_all(&txn, staff.iter().map(|m| Some(m.id))).await?;
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_db;
    use platform_authn::verify_password;
    use platform_db::{fiches, projets};

    #[tokio::test]
    async fn seeding_twice_is_harmless() {
        let db = memory_db().await;
        let admin = SeedAdmin::default();
        let first = run(&db, &admin).await.unwrap();
        assert_eq!(first, SeedOutcome { admin_created: true, demo_created: true });
        let second = run(&db, &admin).await.unwrap();
        assert_eq!(second, SeedOutcome::default());

        let stored = employees::find_by_email(&db, "admin@cy-rh.local").await.unwrap().unwrap();
        assert_eq!(stored.role, "ADMIN");
        assert!(verify_password("admin123", &stored.password_hash));
        assert_eq!(employees::count(&db).await.unwrap(), 6);
        assert_eq!(projets::count(&db).await.unwrap(), 2);
        assert_eq!(fiches::list(&db).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn demo_roles_match_positions() {
        let db = memory_db().await;
        run(&db, &SeedAdmin::default()).await.unwrap();
        let claire = employees::find_by_email(&db, "claire.martin@cy-rh.local").await.unwrap().unwrap();
        assert_eq!(claire.role, "CHEF_DEPT");
        let yanis = employees::find_by_email(&db, "yanis.girard@cy-rh.local").await.unwrap().unwrap();
        assert_eq!(yanis.role, "CHEF_PROJET");
        let hugo = employees::find_by_email(&db, "hugo.lefevre@cy-rh.local").await.unwrap().unwrap();
        assert_eq!(hugo.role, "EMPLOYE");
    }
}
