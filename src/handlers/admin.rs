use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::lifecycle;
use crate::reports::{self, DashboardStats};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ User Management ============

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// List all users (admin)
pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<UserResponse> = users
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Serialize)]
pub struct DriverResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub license_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// List all drivers (admin)
pub async fn list_drivers(State(state): State<AppState>) -> AppResult<Json<Vec<DriverResponse>>> {
    let drivers = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Driver))
        .all(&state.db)
        .await?;

    let responses: Vec<DriverResponse> = drivers
        .into_iter()
        .map(|d| DriverResponse {
            id: d.id,
            email: d.email,
            name: d.name,
            license_number: d.license_number,
            created_at: d.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

/// Delete a user account (admin). Related rows follow the schema's
/// foreign-key actions: vehicles, services and client bookings cascade,
/// driver assignments are nulled out.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role == UserRole::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be deleted".to_string(),
        ));
    }

    user::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Booking Oversight ============

#[derive(Debug, Serialize)]
pub struct BookingInfo {
    pub id: Uuid,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub client_name: String,
    pub driver_name: Option<String>,
    pub car_wash: String,
    pub vehicle_plate: String,
    pub total_amount: f64,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// List all bookings (admin)
pub async fn list_all_bookings(State(state): State<AppState>) -> AppResult<Json<Vec<BookingInfo>>> {
    let bookings = booking::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;
    let vehicles = vehicle::Entity::find().all(&state.db).await?;

    let responses: Vec<BookingInfo> = bookings
        .into_iter()
        .map(|b| {
            let client = users.iter().find(|u| u.id == b.client_id);
            let driver = b.driver_id.and_then(|id| users.iter().find(|u| u.id == id));
            let car_wash = users.iter().find(|u| u.id == b.car_wash_id);
            let vehicle = vehicles.iter().find(|v| v.id == b.vehicle_id);

            BookingInfo {
                id: b.id,
                status: b.status,
                payment_status: b.payment_status,
                client_name: client.map(|c| c.name.clone()).unwrap_or_default(),
                driver_name: driver.map(|d| d.name.clone()),
                car_wash: car_wash
                    .and_then(|w| w.business_name.clone())
                    .unwrap_or_default(),
                vehicle_plate: vehicle.map(|v| v.plate.clone()).unwrap_or_default(),
                total_amount: b.total_amount,
                scheduled_pickup_time: b.scheduled_pickup_time.with_timezone(&Utc),
                created_at: b.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

/// Force a booking along any legal edge (admin)
pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    // An admin accepting on a driver's behalf leaves the booking unassigned
    let updated =
        lifecycle::apply_transition(&state.db, &booking, payload.status, &claims.role, None)
            .await?;

    Ok(Json(updated))
}

// ============ Payments ============

/// List all payments (admin)
pub async fn list_payments(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<payment::Model>>> {
    let payments = payment::Entity::find().all(&state.db).await?;
    Ok(Json(payments))
}

/// Refund a settled payment (admin)
pub async fn refund_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<payment::Model>> {
    let payment = payment::Entity::find_by_id(payment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    if payment.status != PaymentStatus::Paid {
        return Err(AppError::Validation(
            "Only settled payments can be refunded".to_string(),
        ));
    }

    // Conditional on still being paid, in case a refund races another
    let result = payment::Entity::update_many()
        .col_expr(
            payment::Column::Status,
            Expr::value(PaymentStatus::Refunded),
        )
        .filter(payment::Column::Id.eq(payment.id))
        .filter(payment::Column::Status.eq(PaymentStatus::Paid))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Payment was modified concurrently".to_string(),
        ));
    }

    booking::Entity::update_many()
        .col_expr(
            booking::Column::PaymentStatus,
            Expr::value(PaymentStatus::Refunded),
        )
        .filter(booking::Column::Id.eq(payment.booking_id))
        .exec(&state.db)
        .await?;

    let updated = payment::Entity::find_by_id(payment.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    Ok(Json(updated))
}

// ============ Dashboard ============

/// Booking counts and revenue across the whole marketplace (admin)
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let stats = reports::dashboard(&state.db, None).await?;
    Ok(Json(stats))
}
