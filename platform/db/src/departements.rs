use entity::departement;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<departement::Model>, DbErr> {
    departement::Entity::find()
        .order_by_asc(departement::Column::Id)
        .all(db)
        .await
}

pub async fn find<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<departement::Model>, DbErr> {
    departement::Entity::find_by_id(id).one(db).await
}

pub async fn exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    Ok(find(db, id).await?.is_some())
}

pub async fn intitule_taken<C: ConnectionTrait>(
    db: &C,
    intitule: &str,
    except: Option<i32>,
) -> Result<bool, DbErr> {
    let mut query =
        departement::Entity::find().filter(departement::Column::Intitule.eq(intitule));
    if let Some(id) = except {
        query = query.filter(departement::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// Departments whose chief is `employee_id`, other than `except`.
pub async fn headed_by<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
    except: Option<i32>,
) -> Result<Vec<departement::Model>, DbErr> {
    let mut query =
        departement::Entity::find().filter(departement::Column::ChefDepartement.eq(employee_id));
    if let Some(id) = except {
        query = query.filter(departement::Column::Id.ne(id));
    }
    query.all(db).await
}

/// Frees every chief position held by `employee_id`.
pub async fn release_chief<C: ConnectionTrait>(db: &C, employee_id: i32) -> Result<u64, DbErr> {
    let res = departement::Entity::update_many()
        .col_expr(
            departement::Column::ChefDepartement,
            Expr::value(Option::<i32>::None),
        )
        .filter(departement::Column::ChefDepartement.eq(employee_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    departement::Entity::find().count(db).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    let res = departement::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}
