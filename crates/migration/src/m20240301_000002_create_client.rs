//! Create `client` table with FK to `coach`.
//!
//! `mail_address` is unique; only the password digest is stored.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Client::Table)
                    .if_not_exists()
                    .col(pk_auto(Client::Id))
                    .col(string_len(Client::MailAddress, 255).unique_key().not_null())
                    .col(string_len(Client::PasswordDigest, 255).not_null())
                    .col(string_len(Client::Name, 128).not_null())
                    .col(string_len(Client::LastName, 128).not_null())
                    .col(integer(Client::CoachId).not_null())
                    .col(boolean(Client::IsActive).not_null().default(false))
                    .col(boolean(Client::IsPending).not_null().default(true))
                    .col(
                        ColumnDef::new(Client::DietPlan)
                            .string_len(255)
                            .null(),
                    )
                    .col(timestamp_with_time_zone(Client::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Client::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_coach")
                            .from(Client::Table, Client::CoachId)
                            .to(Coach::Table, Coach::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Client::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Client {
    Table,
    Id,
    MailAddress,
    PasswordDigest,
    Name,
    LastName,
    CoachId,
    IsActive,
    IsPending,
    DietPlan,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Coach { Table, Id }
