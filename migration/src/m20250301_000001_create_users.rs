use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create user role enum
        manager
            .create_type(
                Type::create()
                    .as_enum(UserRole::Enum)
                    .values([
                        UserRole::Admin,
                        UserRole::Client,
                        UserRole::Driver,
                        UserRole::Carwash,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(uuid(Users::Id).primary_key())
                    .col(string_len(Users::Email, 255).not_null().unique_key())
                    .col(string_len(Users::NationalId, 50).not_null().unique_key())
                    .col(string_len(Users::PasswordHash, 255).not_null())
                    .col(string_len(Users::Name, 100).not_null())
                    .col(string_len(Users::Phone, 30).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .custom(UserRole::Enum)
                            .not_null(),
                    )
                    // Driver-specific
                    .col(string_len_null(Users::LicenseNumber, 50))
                    // Car-wash-specific
                    .col(string_len_null(Users::BusinessName, 100))
                    .col(double_null(Users::BaseLat))
                    .col(double_null(Users::BaseLng))
                    .col(double_null(Users::PickupRadiusKm))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(UserRole::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Email,
    NationalId,
    PasswordHash,
    Name,
    Phone,
    Role,
    LicenseNumber,
    BusinessName,
    BaseLat,
    BaseLng,
    PickupRadiusKm,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum UserRole {
    #[sea_orm(iden = "user_role")]
    Enum,
    #[sea_orm(iden = "admin")]
    Admin,
    #[sea_orm(iden = "client")]
    Client,
    #[sea_orm(iden = "driver")]
    Driver,
    #[sea_orm(iden = "carwash")]
    Carwash,
}
