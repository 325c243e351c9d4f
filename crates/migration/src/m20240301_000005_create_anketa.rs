//! Create `anketa` table with FKs to `user`, `category` and `city`.
//!
//! `rating` and `review_count` are aggregates over `review`, refreshed whenever
//! a review is added.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Anketa::Table)
                    .if_not_exists()
                    .col(uuid(Anketa::Id).primary_key())
                    .col(string_len(Anketa::Title, 120).not_null())
                    .col(text(Anketa::Description).not_null())
                    .col(uuid(Anketa::CategoryId).not_null())
                    .col(uuid(Anketa::CityId).not_null())
                    .col(uuid(Anketa::OwnerId).not_null())
                    .col(boolean(Anketa::IsActive).not_null().default(true))
                    .col(double_null(Anketa::Latitude))
                    .col(double_null(Anketa::Longitude))
                    .col(string_len_null(Anketa::Telegram, 64))
                    .col(string_len_null(Anketa::Whatsapp, 32))
                    .col(double(Anketa::Rating).not_null().default(0.0))
                    .col(integer(Anketa::ReviewCount).not_null().default(0))
                    .col(timestamp_with_time_zone(Anketa::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Anketa::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_anketa_owner")
                            .from(Anketa::Table, Anketa::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_anketa_category")
                            .from(Anketa::Table, Anketa::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_anketa_city")
                            .from(Anketa::Table, Anketa::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Anketa::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Anketa {
    Table,
    Id,
    Title,
    Description,
    CategoryId,
    CityId,
    OwnerId,
    IsActive,
    Latitude,
    Longitude,
    Telegram,
    Whatsapp,
    Rating,
    ReviewCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Category { Table, Id }

#[derive(DeriveIden)]
enum City { Table, Id }
