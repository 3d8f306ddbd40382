use entity::affectation_projet;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

pub async fn find<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<affectation_projet::Model>, DbErr> {
    affectation_projet::Entity::find_by_id(id).one(db).await
}

pub async fn for_projet<C: ConnectionTrait>(
    db: &C,
    projet_id: i32,
) -> Result<Vec<affectation_projet::Model>, DbErr> {
    affectation_projet::Entity::find()
        .filter(affectation_projet::Column::IdProjet.eq(projet_id))
        .order_by_asc(affectation_projet::Column::DateAffectation)
        .order_by_asc(affectation_projet::Column::Id)
        .all(db)
        .await
}

/// Assignments without an end date.
pub async fn active<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<affectation_projet::Model>, DbErr> {
    affectation_projet::Entity::find()
        .filter(affectation_projet::Column::DateFinAffectation.is_null())
        .all(db)
        .await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    let res = affectation_projet::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}

pub async fn delete_for_projet<C: ConnectionTrait>(db: &C, projet_id: i32) -> Result<u64, DbErr> {
    let res = affectation_projet::Entity::delete_many()
        .filter(affectation_projet::Column::IdProjet.eq(projet_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn delete_for_employee<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
) -> Result<u64, DbErr> {
    let res = affectation_projet::Entity::delete_many()
        .filter(affectation_projet::Column::IdEmployer.eq(employee_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
