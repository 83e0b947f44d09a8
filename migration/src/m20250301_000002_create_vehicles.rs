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
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(uuid(Vehicles::Id).primary_key())
                    .col(uuid(Vehicles::ClientId).not_null())
                    .col(string_len(Vehicles::Plate, 20).not_null().unique_key())
                    .col(string_len(Vehicles::Make, 50).not_null())
                    .col(string_len(Vehicles::Model, 50).not_null())
                    .col(string_len(Vehicles::Color, 30).not_null())
                    .col(
                        timestamp_with_time_zone(Vehicles::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_client")
                            .from(Vehicles::Table, Vehicles::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicles {
    Table,
    Id,
    ClientId,
    Plate,
    Make,
    Model,
    Color,
    CreatedAt,
}
