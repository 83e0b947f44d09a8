use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000004_create_bookings::Bookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(uuid(Payments::Id).primary_key())
                    // One payment per booking
                    .col(uuid(Payments::BookingId).not_null().unique_key())
                    .col(string_len(Payments::Reference, 32).not_null().unique_key())
                    .col(double(Payments::Amount).not_null())
                    .col(string_len_null(Payments::Method, 16))
                    .col(string_len(Payments::Status, 16).not_null())
                    .col(timestamp_with_time_zone_null(Payments::PaidAt))
                    .col(
                        timestamp_with_time_zone(Payments::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_booking")
                            .from(Payments::Table, Payments::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Payments {
    Table,
    Id,
    BookingId,
    Reference,
    Amount,
    Method,
    Status,
    PaidAt,
    CreatedAt,
}
