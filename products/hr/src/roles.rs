//! Keeps the stored role in line with the chief positions an employee holds.

use platform_authz::Role;
use platform_db::{departements, employees, projets};
use sea_orm::{ConnectionTrait, DbErr};

/// Role an employee should carry given the positions they hold.
pub fn derived_role(current: Role, heads_departement: bool, leads_projet: bool) -> Role {
    match current {
        Role::Admin => Role::Admin,
        _ if heads_departement => Role::ChefDept,
        _ if leads_projet => Role::ChefProjet,
        _ => Role::Employe,
    }
}

/// Recomputes and stores the role of one employee. Missing employees are ignored.
pub async fn resync<C: ConnectionTrait>(db: &C, employee_id: i32) -> Result<Option<Role>, DbErr> {
    let Some(employee) = employees::find(db, employee_id).await? else {
        return Ok(None);
    };
    let current = Role::parse(Some(&employee.role));
    let heads = !departements::headed_by(db, employee_id, None).await?.is_empty();
    let leads = !projets::led_by(db, employee_id).await?.is_empty();
    let next = derived_role(current, heads, leads);
    if next.as_str() != employee.role {
        tracing::info!(employee_id, from = %employee.role, to = %next, "role resynchronised");
        employees::set_role(db, employee_id, next.as_str()).await?;
    }
    Ok(Some(next))
}

/// Resyncs every distinct id in `ids`.
pub async fn resync_all<C, I>(db: &C, ids: I) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = Option<i32>>,
{
    let mut seen = Vec::new();
    for id in ids.into_iter().flatten() {
        if !seen.contains(&id) {
            seen.push(id);
            resync(db, id).await?;
        }
    }
    Ok(())
}
