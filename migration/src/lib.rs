pub use sea_orm_migration::prelude::*;

mod m20240101_000001_hr_tables;
mod m20240102_000002_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_hr_tables::Migration),
            Box::new(m20240102_000002_sessions::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::Database;

    #[tokio::test]
    async fn migrates_up_and_down_on_sqlite() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let manager = SchemaManager::new(&db);
        for table in [
            "employer",
            "departement",
            "projet",
            "affectation_projet",
            "fiche_de_paie",
            "sessions",
        ] {
            assert!(manager.has_table(table).await.unwrap(), "{table} missing");
        }
        Migrator::down(&db, None).await.unwrap();
        assert!(!manager.has_table("employer").await.unwrap());
    }
}
