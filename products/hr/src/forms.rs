//! Submitted HTML forms and their field-level validation.
//!
//! Every form arrives as optional strings so a rejected submission can be
//! echoed back unchanged. `validate` turns a form into a typed draft or a
//! [`FieldErrors`] map; rules that need the database live in the services.

use chrono::NaiveDate;
use entity::{affectation_projet, departement, employee, fiche_de_paie, projet};
use once_cell::sync::Lazy;
use platform_api::FieldErrors;
use platform_authz::Role;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::money;

static MATRICULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]+$").expect("matricule regex"));
static PERSON_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L} .'-]+$").expect("person name regex"));
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));
static PHONE_FR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:\+|00)33|0)\s*[1-9](?:[\s.-]*\d{2}){4}$").expect("phone regex")
});

const SALAIRE_MIN_CENTS: i64 = 100_000;
const SALAIRE_MAX_CENTS: i64 = 100_000_000;
const EXTRA_MAX_CENTS: i64 = 10_000_000;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trimmed value, `None` when blank.
pub fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn parse_id(errors: &mut FieldErrors, field: &str, raw: &Option<String>, message: &str) -> Option<i32> {
    let value = filled(raw)?;
    match value.parse::<i32>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.add(field, message);
            None
        }
    }
}

fn parse_date(errors: &mut FieldErrors, field: &str, raw: &Option<String>) -> Option<NaiveDate> {
    let value = filled(raw)?;
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Date invalide (format attendu AAAA-MM-JJ)");
            None
        }
    }
}

fn parse_amount(errors: &mut FieldErrors, field: &str, raw: &Option<String>) -> Option<i64> {
    let value = filled(raw)?;
    match money::parse_cents(value) {
        Some(cents) => Some(cents),
        None => {
            errors.add(field, "Montant invalide");
            None
        }
    }
}

fn parse_int(errors: &mut FieldErrors, field: &str, raw: &Option<String>, message: &str) -> Option<i32> {
    let value = filled(raw)?;
    match value.parse::<i32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, message);
            None
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Record id carried by a hidden input; blank means "create".
fn record_id(raw: &Option<String>) -> Result<Option<i32>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let id = parse_id(&mut errors, "id", raw, "Identifiant invalide");
    errors.into_result(id)
}

// ---------------------------------------------------------------------------
// Employees

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EmployeeForm {
    pub id: Option<String>,
    pub matricule: Option<String>,
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub poste: Option<String>,
    pub grade: Option<String>,
    pub salaire_base: Option<String>,
    pub date_embauche: Option<String>,
    pub id_departement: Option<String>,
    pub role: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub id: Option<i32>,
    pub matricule: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: Option<String>,
    /// `None` on update keeps the stored hash.
    pub password: Option<String>,
    pub poste: String,
    pub grade: String,
    pub salaire_base_cents: i64,
    pub date_embauche: NaiveDate,
    pub id_departement: Option<i32>,
    pub role: Role,
}

impl EmployeeForm {
    pub fn from_model(model: &employee::Model) -> Self {
        Self {
            id: Some(model.id.to_string()),
            matricule: Some(model.matricule.clone()),
            nom: Some(model.nom.clone()),
            prenom: Some(model.prenom.clone()),
            email: Some(model.email.clone()),
            telephone: model.telephone.clone(),
            password: None,
            poste: Some(model.poste.clone()),
            grade: Some(model.grade.clone()),
            salaire_base: Some(money::format_plain(model.salaire_base_cents)),
            date_embauche: Some(format_date(model.date_embauche)),
            id_departement: model.id_departement.map(|id| id.to_string()),
            role: Some(model.role.clone()),
        }
    }

    pub fn record_id(&self) -> Result<Option<i32>, FieldErrors> {
        record_id(&self.id)
    }

    pub fn validate(&self, today: NaiveDate) -> Result<EmployeeDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = parse_id(&mut errors, "id", &self.id, "Identifiant invalide");
        let is_new = id.is_none();

        let matricule = filled(&self.matricule).unwrap_or_default();
        if matricule.is_empty() {
            errors.add("matricule", "Le matricule est obligatoire");
        } else {
            if !(3..=30).contains(&char_len(matricule)) {
                errors.add("matricule", "Le matricule doit contenir entre 3 et 30 caractères");
            }
            if !MATRICULE.is_match(matricule) {
                errors.add(
                    "matricule",
                    "Le matricule ne doit contenir que des lettres majuscules et chiffres",
                );
            }
        }

        let nom = filled(&self.nom).unwrap_or_default();
        check_person_name(&mut errors, "nom", nom, "Le nom de l'employé est obligatoire", "Le nom");
        let prenom = filled(&self.prenom).unwrap_or_default();
        check_person_name(
            &mut errors,
            "prenom",
            prenom,
            "Le prénom de l'employé est obligatoire",
            "Le prénom",
        );

        let email = filled(&self.email).map(normalize_email).unwrap_or_default();
        if email.is_empty() {
            errors.add("email", "L'email est obligatoire");
        } else {
            if !EMAIL.is_match(&email) {
                errors.add("email", "L'email doit être valide");
            }
            if char_len(&email) > 100 {
                errors.add("email", "L'email ne doit pas dépasser 100 caractères");
            }
        }

        let telephone = filled(&self.telephone).map(str::to_string);
        if let Some(phone) = &telephone {
            if !PHONE_FR.is_match(phone) {
                errors.add(
                    "telephone",
                    "Le numéro de téléphone doit être au format français valide",
                );
            }
        }

        // Passwords are not trimmed.
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        match &password {
            None if is_new => errors.add("password", "Le mot de passe est obligatoire"),
            Some(p) if !(6..=255).contains(&char_len(p)) => {
                errors.add("password", "Le mot de passe doit contenir au moins 6 caractères")
            }
            _ => {}
        }

        let poste = filled(&self.poste).unwrap_or_default();
        if poste.is_empty() {
            errors.add("poste", "Le poste est obligatoire");
        } else if !(3..=100).contains(&char_len(poste)) {
            errors.add("poste", "Le poste doit contenir entre 3 et 100 caractères");
        }

        let grade = filled(&self.grade).unwrap_or_default();
        if grade.is_empty() {
            errors.add("grade", "Le grade est obligatoire");
        }

        let salaire = parse_amount(&mut errors, "salaire_base", &self.salaire_base);
        match salaire {
            None if !errors.has("salaire_base") => {
                errors.add("salaire_base", "Le salaire de base est obligatoire")
            }
            Some(c) if c < SALAIRE_MIN_CENTS => {
                errors.add("salaire_base", "Le salaire de base doit être au minimum 1000€")
            }
            Some(c) if c > SALAIRE_MAX_CENTS => errors.add(
                "salaire_base",
                "Le salaire de base ne peut pas dépasser 1 000 000€",
            ),
            _ => {}
        }

        let date_embauche = parse_date(&mut errors, "date_embauche", &self.date_embauche);
        match date_embauche {
            None if !errors.has("date_embauche") => {
                errors.add("date_embauche", "La date d'embauche est obligatoire")
            }
            Some(d) if d > today => errors.add(
                "date_embauche",
                "La date d'embauche ne peut pas être dans le futur",
            ),
            _ => {}
        }

        let id_departement = parse_id(
            &mut errors,
            "id_departement",
            &self.id_departement,
            "Le département sélectionné est invalide",
        );

        let role = match filled(&self.role) {
            None => Some(Role::Employe),
            Some(label) => {
                let role = Role::from_label(label);
                if role.is_none() {
                    errors.add("role", "Rôle inconnu");
                }
                role
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        match (salaire, date_embauche, role) {
            (Some(salaire_base_cents), Some(date_embauche), Some(role)) => Ok(EmployeeDraft {
                id,
                matricule: matricule.to_string(),
                nom: nom.to_string(),
                prenom: prenom.to_string(),
                email,
                telephone,
                password,
                poste: poste.to_string(),
                grade: grade.to_string(),
                salaire_base_cents,
                date_embauche,
                id_departement,
                role,
            }),
            _ => Err(errors),
        }
    }
}

fn check_person_name(errors: &mut FieldErrors, field: &str, value: &str, missing: &str, label: &str) {
    if value.is_empty() {
        errors.add(field, missing);
        return;
    }
    if !PERSON_NAME.is_match(value) {
        errors.add(field, format!("{label} ne doit contenir que des lettres"));
    }
    if !(2..=50).contains(&char_len(value)) {
        errors.add(field, format!("{label} doit contenir entre 2 et 50 caractères"));
    }
}

// ---------------------------------------------------------------------------
// Departments

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DepartementForm {
    pub id: Option<String>,
    pub intitule: Option<String>,
    pub chef_departement: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepartementDraft {
    pub id: Option<i32>,
    pub intitule: String,
    pub chef_departement: Option<i32>,
}

impl DepartementForm {
    pub fn from_model(model: &departement::Model) -> Self {
        Self {
            id: Some(model.id.to_string()),
            intitule: Some(model.intitule.clone()),
            chef_departement: model.chef_departement.map(|id| id.to_string()),
        }
    }

    pub fn record_id(&self) -> Result<Option<i32>, FieldErrors> {
        record_id(&self.id)
    }

    pub fn validate(&self) -> Result<DepartementDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = parse_id(&mut errors, "id", &self.id, "Identifiant invalide");
        let intitule = filled(&self.intitule).unwrap_or_default();
        if intitule.is_empty() {
            errors.add("intitule", "L'intitulé est obligatoire");
        } else if char_len(intitule) > 100 {
            errors.add("intitule", "L'intitulé ne doit pas dépasser 100 caractères");
        }
        let chef_departement = parse_id(
            &mut errors,
            "chef_departement",
            &self.chef_departement,
            "Employé introuvable",
        );
        errors.into_result(DepartementDraft {
            id,
            intitule: intitule.to_string(),
            chef_departement,
        })
    }
}

// ---------------------------------------------------------------------------
// Projects

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ProjetForm {
    pub id: Option<String>,
    pub nom_projet: Option<String>,
    pub etat_projet: Option<String>,
    pub date_debut: Option<String>,
    pub date_fin_prevue: Option<String>,
    pub date_fin_reelle: Option<String>,
    pub chef_projet: Option<String>,
    pub id_departement: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjetDraft {
    pub id: Option<i32>,
    pub nom_projet: String,
    pub etat_projet: projet::Etat,
    pub date_debut: NaiveDate,
    pub date_fin_prevue: Option<NaiveDate>,
    pub date_fin_reelle: Option<NaiveDate>,
    pub chef_projet: Option<i32>,
    pub id_departement: Option<i32>,
}

impl ProjetForm {
    /// Blank form for a new project, defaulting to `EN_COURS`.
    pub fn blank() -> Self {
        Self {
            etat_projet: Some(projet::Etat::EnCours.as_str().into()),
            ..Self::default()
        }
    }

    pub fn from_model(model: &projet::Model) -> Self {
        Self {
            id: Some(model.id.to_string()),
            nom_projet: Some(model.nom_projet.clone()),
            etat_projet: Some(model.etat_projet.as_str().into()),
            date_debut: Some(format_date(model.date_debut)),
            date_fin_prevue: model.date_fin_prevue.map(format_date),
            date_fin_reelle: model.date_fin_reelle.map(format_date),
            chef_projet: model.chef_projet.map(|id| id.to_string()),
            id_departement: model.id_departement.map(|id| id.to_string()),
        }
    }

    pub fn record_id(&self) -> Result<Option<i32>, FieldErrors> {
        record_id(&self.id)
    }

    pub fn validate(&self) -> Result<ProjetDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = parse_id(&mut errors, "id", &self.id, "Identifiant invalide");

        let nom_projet = filled(&self.nom_projet).unwrap_or_default();
        if nom_projet.is_empty() {
            errors.add("nom_projet", "Le nom du projet est obligatoire");
        } else if !(3..=150).contains(&char_len(nom_projet)) {
            errors.add("nom_projet", "Le nom doit contenir entre 3 et 150 caractères");
        }

        let etat_projet = match filled(&self.etat_projet) {
            None => {
                errors.add("etat_projet", "L'état du projet est obligatoire");
                None
            }
            Some(raw) => {
                let etat = projet::Etat::parse(raw);
                if etat.is_none() {
                    errors.add("etat_projet", "État de projet inconnu");
                }
                etat
            }
        };

        let date_debut = parse_date(&mut errors, "date_debut", &self.date_debut);
        if date_debut.is_none() && !errors.has("date_debut") {
            errors.add("date_debut", "La date de début est obligatoire");
        }
        let date_fin_prevue = parse_date(&mut errors, "date_fin_prevue", &self.date_fin_prevue);
        let date_fin_reelle = parse_date(&mut errors, "date_fin_reelle", &self.date_fin_reelle);

        if let Some(debut) = date_debut {
            if date_fin_prevue.is_some_and(|fin| fin < debut) {
                errors.add(
                    "date_fin_prevue",
                    "La date de fin prévue doit être après la date de début",
                );
            }
            if date_fin_reelle.is_some_and(|fin| fin < debut) {
                errors.add(
                    "date_fin_reelle",
                    "La date de fin réelle doit être après la date de début",
                );
            }
        }
        if etat_projet == Some(projet::Etat::Termine)
            && date_fin_reelle.is_none()
            && !errors.has("date_fin_reelle")
        {
            errors.add(
                "date_fin_reelle",
                "Vous devez renseigner la date de fin réelle pour un projet terminé",
            );
        }

        let chef_projet = parse_id(&mut errors, "chef_projet", &self.chef_projet, "Employé introuvable");
        let id_departement = parse_id(
            &mut errors,
            "id_departement",
            &self.id_departement,
            "Département introuvable",
        );

        if !errors.is_empty() {
            return Err(errors);
        }
        match (etat_projet, date_debut) {
            (Some(etat_projet), Some(date_debut)) => Ok(ProjetDraft {
                id,
                nom_projet: nom_projet.to_string(),
                etat_projet,
                date_debut,
                date_fin_prevue,
                date_fin_reelle,
                chef_projet,
                id_departement,
            }),
            _ => Err(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// Assignments

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AffectationForm {
    pub id: Option<String>,
    pub id_employer: Option<String>,
    pub id_projet: Option<String>,
    pub date_affectation: Option<String>,
    pub date_fin_affectation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectationDraft {
    pub id: Option<i32>,
    pub id_employer: i32,
    pub id_projet: i32,
    pub date_affectation: NaiveDate,
    pub date_fin_affectation: Option<NaiveDate>,
}

impl AffectationForm {
    pub fn for_projet(projet_id: i32, today: NaiveDate) -> Self {
        Self {
            id_projet: Some(projet_id.to_string()),
            date_affectation: Some(format_date(today)),
            ..Self::default()
        }
    }

    pub fn from_model(model: &affectation_projet::Model) -> Self {
        Self {
            id: Some(model.id.to_string()),
            id_employer: Some(model.id_employer.to_string()),
            id_projet: Some(model.id_projet.to_string()),
            date_affectation: Some(format_date(model.date_affectation)),
            date_fin_affectation: model.date_fin_affectation.map(format_date),
        }
    }

    pub fn record_id(&self) -> Result<Option<i32>, FieldErrors> {
        record_id(&self.id)
    }

    /// The owning project, needed before anything else to check permissions.
    pub fn projet_id(&self) -> Option<i32> {
        filled(&self.id_projet).and_then(|v| v.parse().ok())
    }

    pub fn validate(&self) -> Result<AffectationDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = parse_id(&mut errors, "id", &self.id, "Identifiant invalide");
        let id_employer = parse_id(&mut errors, "id_employer", &self.id_employer, "Employé introuvable");
        if id_employer.is_none() && !errors.has("id_employer") {
            errors.add("id_employer", "L'employé est obligatoire");
        }
        let id_projet = parse_id(&mut errors, "id_projet", &self.id_projet, "Projet introuvable");
        if id_projet.is_none() && !errors.has("id_projet") {
            errors.add("id_projet", "Le projet est obligatoire");
        }
        let date_affectation = parse_date(&mut errors, "date_affectation", &self.date_affectation);
        if date_affectation.is_none() && !errors.has("date_affectation") {
            errors.add("date_affectation", "La date d'affectation est obligatoire");
        }
        let date_fin_affectation =
            parse_date(&mut errors, "date_fin_affectation", &self.date_fin_affectation);
        if let (Some(debut), Some(fin)) = (date_affectation, date_fin_affectation) {
            if fin < debut {
                errors.add(
                    "date_fin_affectation",
                    "La date de fin d'affectation doit être après la date d'affectation",
                );
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        match (id_employer, id_projet, date_affectation) {
            (Some(id_employer), Some(id_projet), Some(date_affectation)) => Ok(AffectationDraft {
                id,
                id_employer,
                id_projet,
                date_affectation,
                date_fin_affectation,
            }),
            _ => Err(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// Payslips

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FicheForm {
    pub id: Option<String>,
    pub id_employer: Option<String>,
    pub mois: Option<String>,
    pub annee: Option<String>,
    pub salaire_base: Option<String>,
    pub primes: Option<String>,
    pub deductions: Option<String>,
    pub date_generation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FicheDraft {
    pub id: Option<i32>,
    pub id_employer: i32,
    pub mois: i32,
    pub annee: i32,
    pub salaire_base_cents: i64,
    pub primes_cents: i64,
    pub deductions_cents: i64,
    pub date_generation: NaiveDate,
}

impl FicheDraft {
    pub fn net_a_payer_cents(&self) -> i64 {
        self.salaire_base_cents + self.primes_cents - self.deductions_cents
    }
}

impl FicheForm {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            primes: Some(money::format_plain(0)),
            deductions: Some(money::format_plain(0)),
            date_generation: Some(format_date(today)),
            ..Self::default()
        }
    }

    pub fn from_model(model: &fiche_de_paie::Model) -> Self {
        Self {
            id: Some(model.id.to_string()),
            id_employer: Some(model.id_employer.to_string()),
            mois: Some(model.mois.to_string()),
            annee: Some(model.annee.to_string()),
            salaire_base: Some(money::format_plain(model.salaire_base_cents)),
            primes: Some(money::format_plain(model.primes_cents)),
            deductions: Some(money::format_plain(model.deductions_cents)),
            date_generation: Some(format_date(model.date_generation)),
        }
    }

    pub fn record_id(&self) -> Result<Option<i32>, FieldErrors> {
        record_id(&self.id)
    }

    /// A new payslip is always dated `today`; a blank date on update defaults to it too.
    pub fn validate(&self, today: NaiveDate) -> Result<FicheDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = parse_id(&mut errors, "id", &self.id, "Identifiant invalide");

        let id_employer = parse_id(&mut errors, "id_employer", &self.id_employer, "Employé introuvable");
        if id_employer.is_none() && !errors.has("id_employer") {
            errors.add("id_employer", "L'employé est obligatoire");
        }

        let mois = parse_int(&mut errors, "mois", &self.mois, "Vous devez choisir un mois.");
        match mois {
            None if !errors.has("mois") => errors.add("mois", "Vous devez choisir un mois."),
            Some(m) if !(1..=12).contains(&m) => errors.add("mois", "Le mois doit être entre 1 et 12"),
            _ => {}
        }

        let annee = parse_int(&mut errors, "annee", &self.annee, "L'année est obligatoire.");
        match annee {
            None if !errors.has("annee") => errors.add("annee", "L'année est obligatoire."),
            Some(a) if a < 2020 => errors.add("annee", "L'année doit être au minimum 2020"),
            Some(a) if a > 2100 => errors.add("annee", "L'année est trop élevée"),
            _ => {}
        }

        let salaire = parse_amount(&mut errors, "salaire_base", &self.salaire_base);
        match salaire {
            None if !errors.has("salaire_base") => {
                errors.add("salaire_base", "Le salaire de base est obligatoire.")
            }
            Some(c) if c < SALAIRE_MIN_CENTS => {
                errors.add("salaire_base", "Le salaire de base doit être au minimum 1000€")
            }
            Some(c) if c > SALAIRE_MAX_CENTS => errors.add(
                "salaire_base",
                "Le salaire de base ne peut pas dépasser 1 000 000€",
            ),
            _ => {}
        }

        let primes = parse_amount(&mut errors, "primes", &self.primes).unwrap_or(0);
        if primes < 0 {
            errors.add("primes", "Les primes doivent être positives");
        } else if primes > EXTRA_MAX_CENTS {
            errors.add("primes", "Les primes ne peuvent pas dépasser 100 000€");
        }
        let deductions = parse_amount(&mut errors, "deductions", &self.deductions).unwrap_or(0);
        if deductions < 0 {
            errors.add("deductions", "Les déductions doivent être positives");
        } else if deductions > EXTRA_MAX_CENTS {
            errors.add("deductions", "Les déductions ne peuvent pas dépasser 100 000€");
        }

        let date_generation = if id.is_none() {
            Some(today)
        } else {
            let parsed = parse_date(&mut errors, "date_generation", &self.date_generation);
            match parsed {
                Some(d) if d > today => {
                    errors.add(
                        "date_generation",
                        "La date de génération ne peut pas être dans le futur",
                    );
                    None
                }
                None if !errors.has("date_generation") => Some(today),
                other => other,
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        match (id_employer, mois, annee, salaire, date_generation) {
            (Some(id_employer), Some(mois), Some(annee), Some(salaire_base_cents), Some(date_generation)) => {
                Ok(FicheDraft {
                    id,
                    id_employer,
                    mois,
                    annee,
                    salaire_base_cents,
                    primes_cents: primes,
                    deductions_cents: deductions,
                    date_generation,
                })
            }
            _ => Err(errors),
        }
    }
}
