use entity::{affectation_projet, projet};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<projet::Model>, DbErr> {
    projet::Entity::find()
        .order_by_asc(projet::Column::Id)
        .all(db)
        .await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<projet::Model>, DbErr> {
    projet::Entity::find_by_id(id).one(db).await
}

/// Projects the employee has at least one assignment on, past or present.
pub async fn assigned_to<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
) -> Result<Vec<projet::Model>, DbErr> {
    let ids: Vec<i32> = affectation_projet::Entity::find()
        .select_only()
        .column(affectation_projet::Column::IdProjet)
        .filter(affectation_projet::Column::IdEmployer.eq(employee_id))
        .distinct()
        .into_tuple()
        .all(db)
        .await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    projet::Entity::find()
        .filter(projet::Column::Id.is_in(ids))
        .order_by_asc(projet::Column::Id)
        .all(db)
        .await
}

pub async fn led_by<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
) -> Result<Vec<projet::Model>, DbErr> {
    projet::Entity::find()
        .filter(projet::Column::ChefProjet.eq(employee_id))
        .all(db)
        .await
}

pub async fn release_chief<C: ConnectionTrait>(db: &C, employee_id: i32) -> Result<u64, DbErr> {
    let res = projet::Entity::update_many()
        .col_expr(projet::Column::ChefProjet, Expr::value(Option::<i32>::None))
        .filter(projet::Column::ChefProjet.eq(employee_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn detach_departement<C: ConnectionTrait>(
    db: &C,
    departement_id: i32,
) -> Result<u64, DbErr> {
    let res = projet::Entity::update_many()
        .col_expr(
            projet::Column::IdDepartement,
            Expr::value(Option::<i32>::None),
        )
        .filter(projet::Column::IdDepartement.eq(departement_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    projet::Entity::find().count(db).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    let res = projet::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}
