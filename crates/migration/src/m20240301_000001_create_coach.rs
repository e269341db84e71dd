//! Create `coach` table. Clients reference it through `coach_id`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Coach::Table)
                    .if_not_exists()
                    .col(pk_auto(Coach::Id))
                    .col(string_len(Coach::Name, 128).not_null())
                    .col(timestamp_with_time_zone(Coach::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Coach::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Coach { Table, Id, Name, CreatedAt }
