use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "employer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub matricule: String,
    pub nom: String,
    pub prenom: String,
    #[sea_orm(unique)]
    pub email: String,
    pub telephone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub poste: String,
    pub grade: String,
    pub salaire_base_cents: i64,
    pub date_embauche: Date,
    #[sea_orm(indexed)]
    pub id_departement: Option<i32>,
    pub role: String,
}

impl Model {
    /// "Prénom Nom", as printed on reports and list pages.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departement::Entity",
        from = "Column::IdDepartement",
        to = "super::departement::Column::Id",
        on_delete = "SetNull"
    )]
    Departement,
    #[sea_orm(has_many = "super::fiche_de_paie::Entity")]
    FicheDePaie,
    #[sea_orm(has_many = "super::affectation_projet::Entity")]
    AffectationProjet,
}

impl Related<super::departement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departement.def()
    }
}

impl Related<super::fiche_de_paie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FicheDePaie.def()
    }
}

impl Related<super::affectation_projet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffectationProjet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
