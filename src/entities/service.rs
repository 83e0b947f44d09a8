use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The fixed service catalog. Car washes choose what they offer and at
/// what price, but only from these kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    #[sea_orm(string_value = "basic_wash")]
    BasicWash,
    #[sea_orm(string_value = "premium_wash")]
    PremiumWash,
    #[sea_orm(string_value = "interior_clean")]
    InteriorClean,
    #[sea_orm(string_value = "full_detail")]
    FullDetail,
    #[sea_orm(string_value = "wax_and_polish")]
    WaxAndPolish,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub car_wash_id: Uuid,
    pub kind: ServiceKind,
    pub price: f64,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CarWashId",
        to = "super::user::Column::Id"
    )]
    CarWash,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CarWash.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
