use entity::fiche_de_paie;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<fiche_de_paie::Model>, DbErr> {
    fiche_de_paie::Entity::find()
        .order_by_desc(fiche_de_paie::Column::Annee)
        .order_by_desc(fiche_de_paie::Column::Mois)
        .order_by_asc(fiche_de_paie::Column::Id)
        .all(db)
        .await
}

pub async fn find<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<fiche_de_paie::Model>, DbErr> {
    fiche_de_paie::Entity::find_by_id(id).one(db).await
}

pub async fn for_employees<C: ConnectionTrait>(
    db: &C,
    employee_ids: Vec<i32>,
) -> Result<Vec<fiche_de_paie::Model>, DbErr> {
    if employee_ids.is_empty() {
        return Ok(Vec::new());
    }
    fiche_de_paie::Entity::find()
        .filter(fiche_de_paie::Column::IdEmployer.is_in(employee_ids))
        .order_by_desc(fiche_de_paie::Column::Annee)
        .order_by_desc(fiche_de_paie::Column::Mois)
        .order_by_asc(fiche_de_paie::Column::Id)
        .all(db)
        .await
}

/// Whether another payslip already covers this employee and period.
pub async fn period_taken<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
    mois: i32,
    annee: i32,
    except: Option<i32>,
) -> Result<bool, DbErr> {
    let mut query = fiche_de_paie::Entity::find()
        .filter(fiche_de_paie::Column::IdEmployer.eq(employee_id))
        .filter(fiche_de_paie::Column::Mois.eq(mois))
        .filter(fiche_de_paie::Column::Annee.eq(annee));
    if let Some(id) = except {
        query = query.filter(fiche_de_paie::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, DbErr> {
    let res = fiche_de_paie::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}

pub async fn delete_for_employee<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
) -> Result<u64, DbErr> {
    let res = fiche_de_paie::Entity::delete_many()
        .filter(fiche_de_paie::Column::IdEmployer.eq(employee_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
