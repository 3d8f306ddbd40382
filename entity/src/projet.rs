use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "projet")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nom_projet: String,
    pub etat_projet: Etat,
    pub date_debut: Date,
    pub date_fin_prevue: Option<Date>,
    pub date_fin_reelle: Option<Date>,
    #[sea_orm(indexed)]
    pub chef_projet: Option<i32>,
    #[sea_orm(indexed)]
    pub id_departement: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::ChefProjet",
        to = "super::employee::Column::Id",
        on_delete = "SetNull"
    )]
    Chef,
    #[sea_orm(
        belongs_to = "super::departement::Entity",
        from = "Column::IdDepartement",
        to = "super::departement::Column::Id",
        on_delete = "SetNull"
    )]
    Departement,
    #[sea_orm(has_many = "super::affectation_projet::Entity")]
    AffectationProjet,
}

impl Related<super::departement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departement.def()
    }
}

impl Related<super::affectation_projet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffectationProjet.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Hash, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(30))")]
pub enum Etat {
    #[sea_orm(string_value = "EN_COURS")]
    #[serde(rename = "EN_COURS")]
    EnCours,
    #[sea_orm(string_value = "TERMINE")]
    #[serde(rename = "TERMINE")]
    Termine,
    #[sea_orm(string_value = "ANNULE")]
    #[serde(rename = "ANNULE")]
    Annule,
}

impl Etat {
    pub fn as_str(self) -> &'static str {
        match self {
            Etat::EnCours => "EN_COURS",
            Etat::Termine => "TERMINE",
            Etat::Annule => "ANNULE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "EN_COURS" => Some(Etat::EnCours),
            "TERMINE" => Some(Etat::Termine),
            "ANNULE" => Some(Etat::Annule),
            _ => None,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
