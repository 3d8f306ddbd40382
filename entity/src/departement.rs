use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "departement")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub intitule: String,
    #[sea_orm(indexed)]
    pub chef_departement: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::ChefDepartement",
        to = "super::employee::Column::Id",
        on_delete = "SetNull"
    )]
    Chef,
}

impl ActiveModelBehavior for ActiveModel {}
