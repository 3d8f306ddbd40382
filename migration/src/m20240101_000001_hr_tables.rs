use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Departement {
    Table,
    Id,
    Intitule,
    ChefDepartement,
}

#[derive(DeriveIden)]
enum Employer {
    Table,
    Id,
    Matricule,
    Nom,
    Prenom,
    Email,
    Telephone,
    PasswordHash,
    Poste,
    Grade,
    SalaireBaseCents,
    DateEmbauche,
    IdDepartement,
    Role,
}

#[derive(DeriveIden)]
enum Projet {
    Table,
    Id,
    NomProjet,
    EtatProjet,
    DateDebut,
    DateFinPrevue,
    DateFinReelle,
    ChefProjet,
    IdDepartement,
}

#[derive(DeriveIden)]
enum AffectationProjet {
    Table,
    Id,
    IdEmployer,
    IdProjet,
    DateAffectation,
    DateFinAffectation,
}

#[derive(DeriveIden)]
enum FicheDePaie {
    Table,
    Id,
    IdEmployer,
    Mois,
    Annee,
    SalaireBaseCents,
    PrimesCents,
    DeductionsCents,
    NetAPayerCents,
    DateGeneration,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The chief column has no database-level FK: employer references
        // departement, so the reverse edge is maintained by the HR services.
        manager
            .create_table(
                Table::create()
                    .table(Departement::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Departement::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Departement::Intitule)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Departement::ChefDepartement).integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employer::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employer::Matricule).string_len(30).not_null())
                    .col(ColumnDef::new(Employer::Nom).string_len(50).not_null())
                    .col(ColumnDef::new(Employer::Prenom).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Employer::Email)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employer::Telephone).string_len(30))
                    .col(
                        ColumnDef::new(Employer::PasswordHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Employer::Poste).string_len(100).not_null())
                    .col(ColumnDef::new(Employer::Grade).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Employer::SalaireBaseCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Employer::DateEmbauche).date().not_null())
                    .col(ColumnDef::new(Employer::IdDepartement).integer())
                    .col(
                        ColumnDef::new(Employer::Role)
                            .string_len(30)
                            .not_null()
                            .default("EMPLOYE"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employer_departement")
                            .from(Employer::Table, Employer::IdDepartement)
                            .to(Departement::Table, Departement::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employer_departement")
                    .table(Employer::Table)
                    .col(Employer::IdDepartement)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Projet::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projet::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projet::NomProjet).string_len(150).not_null())
                    .col(
                        ColumnDef::new(Projet::EtatProjet)
                            .string_len(30)
                            .not_null()
                            .default("EN_COURS"),
                    )
                    .col(ColumnDef::new(Projet::DateDebut).date().not_null())
                    .col(ColumnDef::new(Projet::DateFinPrevue).date())
                    .col(ColumnDef::new(Projet::DateFinReelle).date())
                    .col(ColumnDef::new(Projet::ChefProjet).integer())
                    .col(ColumnDef::new(Projet::IdDepartement).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projet_chef")
                            .from(Projet::Table, Projet::ChefProjet)
                            .to(Employer::Table, Employer::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projet_departement")
                            .from(Projet::Table, Projet::IdDepartement)
                            .to(Departement::Table, Departement::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AffectationProjet::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AffectationProjet::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AffectationProjet::IdEmployer)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AffectationProjet::IdProjet).integer().not_null())
                    .col(
                        ColumnDef::new(AffectationProjet::DateAffectation)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AffectationProjet::DateFinAffectation).date())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_affectation_employer")
                            .from(AffectationProjet::Table, AffectationProjet::IdEmployer)
                            .to(Employer::Table, Employer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_affectation_projet")
                            .from(AffectationProjet::Table, AffectationProjet::IdProjet)
                            .to(Projet::Table, Projet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_affectation_projet")
                    .table(AffectationProjet::Table)
                    .col(AffectationProjet::IdProjet)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FicheDePaie::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FicheDePaie::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FicheDePaie::IdEmployer).integer().not_null())
                    .col(ColumnDef::new(FicheDePaie::Mois).integer().not_null())
                    .col(ColumnDef::new(FicheDePaie::Annee).integer().not_null())
                    .col(
                        ColumnDef::new(FicheDePaie::SalaireBaseCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FicheDePaie::PrimesCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FicheDePaie::DeductionsCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FicheDePaie::NetAPayerCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FicheDePaie::DateGeneration).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fiche_employer")
                            .from(FicheDePaie::Table, FicheDePaie::IdEmployer)
                            .to(Employer::Table, Employer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_fiche_employer_periode")
                    .table(FicheDePaie::Table)
                    .col(FicheDePaie::IdEmployer)
                    .col(FicheDePaie::Mois)
                    .col(FicheDePaie::Annee)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FicheDePaie::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(AffectationProjet::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Projet::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employer::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departement::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
