use entity::employee;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<employee::Model>, DbErr> {
    employee::Entity::find()
        .order_by_asc(employee::Column::Id)
        .all(db)
        .await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<employee::Model>, DbErr> {
    employee::Entity::find_by_id(id).one(db).await
}

/// Emails are stored lower-cased; callers pass the normalized form.
pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<employee::Model>, DbErr> {
    employee::Entity::find()
        .filter(employee::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn email_taken<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<i32>,
) -> Result<bool, DbErr> {
    let mut query = employee::Entity::find().filter(employee::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(employee::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn in_departement<C: ConnectionTrait>(
    db: &C,
    departement_id: i32,
) -> Result<Vec<employee::Model>, DbErr> {
    employee::Entity::find()
        .filter(employee::Column::IdDepartement.eq(departement_id))
        .order_by_asc(employee::Column::Id)
        .all(db)
        .await
}

pub async fn without_departement<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<employee::Model>, DbErr> {
    employee::Entity::find()
        .filter(employee::Column::IdDepartement.is_null())
        .order_by_asc(employee::Column::Id)
        .all(db)
        .await
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    employee::Entity::find().count(db).await
}

pub async fn set_role<C: ConnectionTrait>(db: &C, id: i32, role: &str) -> Result<(), DbErr> {
    employee::ActiveModel {
        id: Set(id),
        role: Set(role.to_string()),
        ..Default::default()
    }
    .update(db)
    .await
    .map(|_| ())
}

/// Clears `id_departement` for every member of the department.
pub async fn detach_departement<C: ConnectionTrait>(
    db: &C,
    departement_id: i32,
) -> Result<u64, DbErr> {
    let res = employee::Entity::update_many()
        .col_expr(
            employee::Column::IdDepartement,
            Expr::value(Option::<i32>::None),
        )
        .filter(employee::Column::IdDepartement.eq(departement_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    let res = employee::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_db;
    use chrono::NaiveDate;

    async fn insert(db: &impl ConnectionTrait, email: &str, dept: Option<i32>) -> employee::Model {
        employee::ActiveModel {
            matricule: Set("E001".into()),
            nom: Set("Martin".into()),
            prenom: Set("Claire".into()),
            email: Set(email.into()),
            telephone: Set(None),
            password_hash: Set("x".into()),
            poste: Set("Analyste".into()),
            grade: Set("B".into()),
            salaire_base_cents: Set(250_000),
            date_embauche: Set(NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()),
            id_departement: Set(dept),
            role: Set("EMPLOYE".into()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_self() {
        let db = memory_db().await;
        let claire = insert(&db, "claire@cy-rh.local", None).await;
        assert!(email_taken(&db, "claire@cy-rh.local", None).await.unwrap());
        assert!(!email_taken(&db, "claire@cy-rh.local", Some(claire.id)).await.unwrap());
        assert!(!email_taken(&db, "other@cy-rh.local", None).await.unwrap());
    }

    #[tokio::test]
    async fn role_update_touches_only_role() {
        let db = memory_db().await;
        let claire = insert(&db, "claire@cy-rh.local", None).await;
        set_role(&db, claire.id, "CHEF_PROJET").await.unwrap();
        let reloaded = find(&db, claire.id).await.unwrap().unwrap();
        assert_eq!(reloaded.role, "CHEF_PROJET");
        assert_eq!(reloaded.email, claire.email);
        assert_eq!(count(&db).await.unwrap(), 1);
    }
}
