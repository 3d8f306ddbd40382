use chrono::{DateTime, Utc};
use entity::sessions;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

pub async fn create<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    employee_id: i32,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<sessions::Model, DbErr> {
    let created_at: DateTimeWithTimeZone = now.into();
    let expires_at: DateTimeWithTimeZone = expires_at.into();
    sessions::ActiveModel {
        id: Set(id),
        employee_id: Set(employee_id),
        created_at: Set(created_at),
        expires_at: Set(expires_at),
    }
    .insert(db)
    .await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<sessions::Model>, DbErr> {
    sessions::Entity::find_by_id(id).one(db).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    let res = sessions::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}

pub async fn delete_for_employee<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
) -> Result<u64, DbErr> {
    let res = sessions::Entity::delete_many()
        .filter(sessions::Column::EmployeeId.eq(employee_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn purge_expired<C: ConnectionTrait>(db: &C, now: DateTime<Utc>) -> Result<u64, DbErr> {
    let now: DateTimeWithTimeZone = now.into();
    let res = sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
