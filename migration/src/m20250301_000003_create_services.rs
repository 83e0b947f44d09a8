use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(uuid(Services::Id).primary_key())
                    .col(uuid(Services::CarWashId).not_null())
                    .col(string_len(Services::Kind, 32).not_null())
                    .col(double(Services::Price).not_null())
                    .col(string_len_null(Services::Description, 255))
                    .col(
                        timestamp_with_time_zone(Services::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_car_wash")
                            .from(Services::Table, Services::CarWashId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Services::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Services {
    Table,
    Id,
    CarWashId,
    Kind,
    Price,
    Description,
    CreatedAt,
}
