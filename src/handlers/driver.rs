use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::handlers::notifications::notify;
use crate::lifecycle;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DriverBookingResponse {
    pub id: Uuid,
    pub status: BookingStatus,
    pub vehicle_plate: String,
    pub vehicle_description: String,
    pub car_wash: String,
    pub client_name: String,
    pub client_phone: String,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub total_amount: f64,
}

fn driver_booking_response(
    b: booking::Model,
    vehicles: &[vehicle::Model],
    users: &[user::Model],
) -> DriverBookingResponse {
    let vehicle = vehicles.iter().find(|v| v.id == b.vehicle_id);
    let client = users.iter().find(|u| u.id == b.client_id);
    let car_wash = users.iter().find(|u| u.id == b.car_wash_id);

    DriverBookingResponse {
        id: b.id,
        status: b.status,
        vehicle_plate: vehicle.map(|v| v.plate.clone()).unwrap_or_default(),
        vehicle_description: vehicle
            .map(|v| format!("{} {} ({})", v.make, v.model, v.color))
            .unwrap_or_default(),
        car_wash: car_wash
            .and_then(|w| w.business_name.clone())
            .unwrap_or_default(),
        client_name: client.map(|c| c.name.clone()).unwrap_or_default(),
        client_phone: client.map(|c| c.phone.clone()).unwrap_or_default(),
        pickup_address: b.pickup_address,
        pickup_lat: b.pickup_lat,
        pickup_lng: b.pickup_lng,
        scheduled_pickup_time: b.scheduled_pickup_time.with_timezone(&Utc),
        total_amount: b.total_amount,
    }
}

/// List pending bookings no driver has claimed yet
pub async fn available_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<DriverBookingResponse>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .filter(booking::Column::DriverId.is_null())
        .all(&state.db)
        .await?;

    let vehicles = vehicle::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<DriverBookingResponse> = bookings
        .into_iter()
        .map(|b| driver_booking_response(b, &vehicles, &users))
        .collect();

    Ok(Json(responses))
}

/// List bookings assigned to the logged-in driver
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<DriverBookingResponse>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::DriverId.eq(claims.sub))
        .all(&state.db)
        .await?;

    let vehicles = vehicle::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<DriverBookingResponse> = bookings
        .into_iter()
        .map(|b| driver_booking_response(b, &vehicles, &users))
        .collect();

    Ok(Json(responses))
}

/// Accept a pending booking. The winning driver is assigned in the same
/// conditional write as the status change, and the payment record is
/// opened at this point: acceptance is what makes a booking billable.
pub async fn accept_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let updated = lifecycle::apply_transition(
        &state.db,
        &booking,
        BookingStatus::Accepted,
        &UserRole::Driver,
        Some(claims.sub),
    )
    .await?;

    // The unique booking_id constraint backs this check up
    let existing_payment = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(updated.id))
        .one(&state.db)
        .await?;

    if existing_payment.is_none() {
        let reference: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();

        let new_payment = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(updated.id),
            reference: Set(reference),
            amount: Set(updated.total_amount),
            method: Set(None),
            status: Set(PaymentStatus::Pending),
            ..Default::default()
        };
        new_payment.insert(&state.db).await?;
    }

    notify(
        &state.db,
        updated.client_id,
        "A driver has accepted your booking".to_string(),
    )
    .await?;

    Ok(Json(updated))
}

/// Decline a pending booking
pub async fn decline_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let updated = lifecycle::apply_transition(
        &state.db,
        &booking,
        BookingStatus::Declined,
        &UserRole::Driver,
        None,
    )
    .await?;

    notify(
        &state.db,
        updated.client_id,
        "Your booking was declined".to_string(),
    )
    .await?;

    Ok(Json(updated))
}

/// Confirm the vehicle has been picked up from the client
pub async fn confirm_pickup(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = assigned_booking(&state, booking_id, claims.sub).await?;

    let updated = lifecycle::apply_transition(
        &state.db,
        &booking,
        BookingStatus::PickedUp,
        &UserRole::Driver,
        None,
    )
    .await?;

    notify(
        &state.db,
        updated.client_id,
        "Your vehicle has been picked up".to_string(),
    )
    .await?;

    Ok(Json(updated))
}

/// Confirm the washed vehicle has been delivered back to the client
pub async fn confirm_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = assigned_booking(&state, booking_id, claims.sub).await?;

    let updated = lifecycle::apply_transition(
        &state.db,
        &booking,
        BookingStatus::Delivered,
        &UserRole::Driver,
        None,
    )
    .await?;

    notify(
        &state.db,
        updated.client_id,
        "Your vehicle has been delivered".to_string(),
    )
    .await?;

    Ok(Json(updated))
}

async fn assigned_booking(
    state: &AppState,
    booking_id: Uuid,
    driver_id: Uuid,
) -> AppResult<booking::Model> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.driver_id != Some(driver_id) {
        return Err(AppError::Forbidden(
            "You are not assigned to this booking".to_string(),
        ));
    }

    Ok(booking)
}
