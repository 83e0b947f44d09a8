use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Booking lifecycle status. The legal edges between these states live in
/// `crate::lifecycle`; nothing writes this column outside a conditional
/// update keyed on the previous status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    #[sea_orm(string_value = "at_wash")]
    AtWash,
    #[sea_orm(string_value = "waiting_bay")]
    WaitingBay,
    #[sea_orm(string_value = "washing_bay")]
    WashingBay,
    #[sea_orm(string_value = "drying_bay")]
    DryingBay,
    #[sea_orm(string_value = "wash_completed")]
    WashCompleted,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    /// Unassigned until a driver accepts.
    pub driver_id: Option<Uuid>,
    pub car_wash_id: Uuid,
    pub vehicle_id: Uuid,
    pub service_id: Uuid,
    pub status: BookingStatus,
    pub payment_status: super::payment::PaymentStatus,
    pub total_amount: f64,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub scheduled_pickup_time: DateTimeWithTimeZone,
    // Lifecycle milestones, stamped by the transition that reaches them
    pub actual_pickup_time: Option<DateTimeWithTimeZone>,
    pub wash_start_time: Option<DateTimeWithTimeZone>,
    pub wash_complete_time: Option<DateTimeWithTimeZone>,
    pub delivery_time: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ClientId",
        to = "super::user::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id"
    )]
    Driver,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CarWashId",
        to = "super::user::Column::Id"
    )]
    CarWash,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
    #[sea_orm(has_one = "super::payment::Entity")]
    Payment,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
