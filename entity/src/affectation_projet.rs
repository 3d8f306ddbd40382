use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "affectation_projet")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub id_employer: i32,
    #[sea_orm(indexed)]
    pub id_projet: i32,
    pub date_affectation: Date,
    pub date_fin_affectation: Option<Date>,
}

impl Model {
    /// An assignment without an end date is still running.
    pub fn is_active(&self) -> bool {
        self.date_fin_affectation.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::IdEmployer",
        to = "super::employee::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::projet::Entity",
        from = "Column::IdProjet",
        to = "super::projet::Column::Id",
        on_delete = "Cascade"
    )]
    Projet,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::projet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
