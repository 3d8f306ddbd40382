//! Login, session lookup and logout on top of the `sessions` table.

use chrono::{DateTime, Utc};
use platform_authn::{Credentials, SessionPolicy, verify_password};
use platform_authz::{Principal, Role};
use platform_db::{employees, sessions};
use sea_orm::{ConnectionTrait, DbErr};
use uuid::Uuid;

use crate::forms::normalize_email;

/// Checks the credentials and opens a session. `None` on a bad email or password.
#[tracing::instrument(skip(db, policy, credentials))]
pub async fn login<C: ConnectionTrait>(
    db: &C,
    policy: &SessionPolicy,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>, DbErr> {
    let email = normalize_email(&credentials.email);
    let Some(employee) = employees::find_by_email(db, &email).await? else {
        tracing::info!("login rejected: unknown email");
        return Ok(None);
    };
    if !verify_password(&credentials.password, &employee.password_hash) {
        tracing::info!(employee_id = employee.id, "login rejected: bad password");
        return Ok(None);
    }
    let id = policy.new_session_id();
    sessions::create(db, id, employee.id, now, policy.expires_at(now)).await?;
    tracing::info!(employee_id = employee.id, "session opened");
    Ok(Some(id))
}

/// The caller behind a session cookie. Expired sessions are removed.
pub async fn resolve<C: ConnectionTrait>(
    db: &C,
    session_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Principal>, DbErr> {
    let Some(session) = sessions::find(db, session_id).await? else {
        return Ok(None);
    };
    if SessionPolicy::is_expired(&session.expires_at, now) {
        sessions::delete(db, session_id).await?;
        tracing::debug!(employee_id = session.employee_id, "expired session dropped");
        return Ok(None);
    }
    let principal = employees::find(db, session.employee_id)
        .await?
        .map(|e| Principal {
            employee_id: e.id,
            role: Role::parse(Some(&e.role)),
            departement_id: e.id_departement,
        });
    Ok(principal)
}

pub async fn logout<C: ConnectionTrait>(db: &C, session_id: Uuid) -> Result<(), DbErr> {
    sessions::delete(db, session_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{employee, memory_db};
    use chrono::Duration;
    use sea_orm::{ActiveModelTrait, Set};

    async fn with_password(db: &sea_orm::DatabaseConnection, email: &str, plain: &str) -> i32 {
        let model = employee(db, email, Role::ChefDept, None).await;
        let mut active: entity::employee::ActiveModel = model.into();
        active.password_hash = Set(platform_authn::hash_password(plain).unwrap());
        active.update(db).await.unwrap().id
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_resolve_logout() {
        let db = memory_db().await;
        let id = with_password(&db, "chef@cy-rh.local", "secret1").await;
        let policy = SessionPolicy::default();
        let now = Utc::now();

        let session = login(&db, &policy, &creds(" Chef@CY-RH.local ", "secret1"), now)
            .await
            .unwrap()
            .expect("session");
        let principal = resolve(&db, session, now).await.unwrap().expect("principal");
        assert_eq!(principal.employee_id, id);
        assert_eq!(principal.role, Role::ChefDept);

        logout(&db, session).await.unwrap();
        assert!(resolve(&db, session, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bad_credentials_open_nothing() {
        let db = memory_db().await;
        with_password(&db, "chef@cy-rh.local", "secret1").await;
        let policy = SessionPolicy::default();
        let now = Utc::now();
        assert!(login(&db, &policy, &creds("chef@cy-rh.local", "wrong"), now).await.unwrap().is_none());
        assert!(login(&db, &policy, &creds("nobody@cy-rh.local", "secret1"), now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_removed() {
        let db = memory_db().await;
        with_password(&db, "chef@cy-rh.local", "secret1").await;
        let policy = SessionPolicy::from_hours(1).unwrap();
        let opened = Utc::now() - Duration::hours(2);
        let session = login(&db, &policy, &creds("chef@cy-rh.local", "secret1"), opened)
            .await
            .unwrap()
            .unwrap();
        assert!(resolve(&db, session, Utc::now()).await.unwrap().is_none());
        assert!(sessions::find(&db, session).await.unwrap().is_none());
    }
}
