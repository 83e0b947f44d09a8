use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::Users;
use super::m20250301_000002_create_vehicles::Vehicles;
use super::m20250301_000003_create_services::Services;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(uuid(Bookings::Id).primary_key())
                    .col(uuid(Bookings::ClientId).not_null())
                    .col(uuid_null(Bookings::DriverId))
                    .col(uuid(Bookings::CarWashId).not_null())
                    .col(uuid(Bookings::VehicleId).not_null())
                    .col(uuid(Bookings::ServiceId).not_null())
                    .col(string_len(Bookings::Status, 32).not_null())
                    .col(string_len(Bookings::PaymentStatus, 16).not_null())
                    .col(double(Bookings::TotalAmount).not_null())
                    .col(string_len(Bookings::PickupAddress, 255).not_null())
                    .col(double(Bookings::PickupLat).not_null())
                    .col(double(Bookings::PickupLng).not_null())
                    .col(timestamp_with_time_zone(Bookings::ScheduledPickupTime).not_null())
                    .col(timestamp_with_time_zone_null(Bookings::ActualPickupTime))
                    .col(timestamp_with_time_zone_null(Bookings::WashStartTime))
                    .col(timestamp_with_time_zone_null(Bookings::WashCompleteTime))
                    .col(timestamp_with_time_zone_null(Bookings::DeliveryTime))
                    .col(
                        timestamp_with_time_zone(Bookings::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_client")
                            .from(Bookings::Table, Bookings::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_driver")
                            .from(Bookings::Table, Bookings::DriverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_car_wash")
                            .from(Bookings::Table, Bookings::CarWashId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_vehicle")
                            .from(Bookings::Table, Bookings::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_service")
                            .from(Bookings::Table, Bookings::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    ClientId,
    DriverId,
    CarWashId,
    VehicleId,
    ServiceId,
    Status,
    PaymentStatus,
    TotalAmount,
    PickupAddress,
    PickupLat,
    PickupLng,
    ScheduledPickupTime,
    ActualPickupTime,
    WashStartTime,
    WashCompleteTime,
    DeliveryTime,
    CreatedAt,
}
