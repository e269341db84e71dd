use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Client: default listing order
        manager
            .create_index(
                Index::create()
                    .name("idx_client_updated_at")
                    .table(Client::Table)
                    .col(Client::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        // Client: index on coach_id
        manager
            .create_index(
                Index::create()
                    .name("idx_client_coach")
                    .table(Client::Table)
                    .col(Client::CoachId)
                    .to_owned(),
            )
            .await?;

        // Client: status filters
        manager
            .create_index(
                Index::create()
                    .name("idx_client_flags")
                    .table(Client::Table)
                    .col(Client::IsActive)
                    .col(Client::IsPending)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_client_updated_at").table(Client::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_client_coach").table(Client::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_client_flags").table(Client::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Client { Table, UpdatedAt, CoachId, IsActive, IsPending }
