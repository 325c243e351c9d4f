use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Anketa: the public listing always filters on is_active
        manager
            .create_index(
                Index::create()
                    .name("idx_anketa_active_created")
                    .table(Anketa::Table)
                    .col(Anketa::IsActive)
                    .col(Anketa::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Anketa: owner lookups for the active-listing limit and admin counts
        manager
            .create_index(
                Index::create()
                    .name("idx_anketa_owner")
                    .table(Anketa::Table)
                    .col(Anketa::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_anketa_city")
                    .table(Anketa::Table)
                    .col(Anketa::CityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_anketa_category")
                    .table(Anketa::Table)
                    .col(Anketa::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Review: aggregate refresh scans by anketa
        manager
            .create_index(
                Index::create()
                    .name("idx_review_anketa")
                    .table(Review::Table)
                    .col(Review::AnketaId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_anketa_active_created").table(Anketa::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_anketa_owner").table(Anketa::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_anketa_city").table(Anketa::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_anketa_category").table(Anketa::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_review_anketa").table(Review::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Anketa { Table, IsActive, CreatedAt, OwnerId, CityId, CategoryId }

#[derive(DeriveIden)]
enum Review { Table, AnketaId }
