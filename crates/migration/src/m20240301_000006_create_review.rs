//! Create `review` table: ratings and comments left on an anketa.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(uuid(Review::Id).primary_key())
                    .col(uuid(Review::AnketaId).not_null())
                    .col(uuid(Review::AuthorId).not_null())
                    .col(small_integer(Review::Rating).not_null())
                    .col(text(Review::Body).not_null())
                    .col(timestamp_with_time_zone(Review::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_anketa")
                            .from(Review::Table, Review::AnketaId)
                            .to(Anketa::Table, Anketa::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_author")
                            .from(Review::Table, Review::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Review::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Review { Table, Id, AnketaId, AuthorId, Rating, Body, CreatedAt }

#[derive(DeriveIden)]
enum Anketa { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
