use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentMethod, PaymentStatus};
use crate::entities::service::{self, ServiceKind};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::handlers::notifications::notify;
use crate::lifecycle;
use crate::utils::geo::is_within_radius;
use crate::utils::jwt::Claims;
use crate::utils::plate::normalize_plate;
use crate::AppState;

const TERMINAL_STATUSES: [BookingStatus; 3] = [
    BookingStatus::Declined,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
];

// ============ Car Washes (public) ============

#[derive(Debug, Serialize)]
pub struct CarWashInfo {
    pub id: Uuid,
    pub business_name: String,
    pub phone: String,
    pub base_lat: Option<f64>,
    pub base_lng: Option<f64>,
    pub pickup_radius_km: Option<f64>,
}

/// List all car washes
pub async fn list_car_washes(State(state): State<AppState>) -> AppResult<Json<Vec<CarWashInfo>>> {
    let car_washes = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Carwash))
        .all(&state.db)
        .await?;

    let responses: Vec<CarWashInfo> = car_washes
        .into_iter()
        .map(|w| CarWashInfo {
            id: w.id,
            business_name: w.business_name.unwrap_or_default(),
            phone: w.phone,
            base_lat: w.base_lat,
            base_lng: w.base_lng,
            pickup_radius_km: w.pickup_radius_km,
        })
        .collect();

    Ok(Json(responses))
}

/// List the services offered by one car wash
pub async fn list_car_wash_services(
    State(state): State<AppState>,
    Path(car_wash_id): Path<Uuid>,
) -> AppResult<Json<Vec<service::Model>>> {
    let car_wash = user::Entity::find_by_id(car_wash_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Car wash not found".to_string()))?;

    if car_wash.role != UserRole::Carwash {
        return Err(AppError::NotFound("Car wash not found".to_string()));
    }

    let services = service::Entity::find()
        .filter(service::Column::CarWashId.eq(car_wash_id))
        .all(&state.db)
        .await?;

    Ok(Json(services))
}

// ============ Vehicles ============

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub plate: String,
    pub make: String,
    pub model: String,
    pub color: String,
}

/// Register a vehicle
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    let plate = normalize_plate(&payload.plate);

    if plate.is_empty()
        || payload.make.trim().is_empty()
        || payload.model.trim().is_empty()
        || payload.color.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Plate, make, model and color are required".to_string(),
        ));
    }

    // Plates are unique across all clients
    let existing = vehicle::Entity::find()
        .filter(vehicle::Column::Plate.eq(&plate))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "A vehicle with this plate is already registered".to_string(),
        ));
    }

    let new_vehicle = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(claims.sub),
        plate: Set(plate),
        make: Set(payload.make.trim().to_string()),
        model: Set(payload.model.trim().to_string()),
        color: Set(payload.color.trim().to_string()),
        ..Default::default()
    };

    let vehicle = new_vehicle.insert(&state.db).await?;
    Ok(Json(vehicle))
}

/// List the logged-in client's vehicles
pub async fn my_vehicles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::ClientId.eq(claims.sub))
        .all(&state.db)
        .await?;

    Ok(Json(vehicles))
}

/// Remove a vehicle (only while it has no active booking)
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.client_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only remove your own vehicles".to_string(),
        ));
    }

    let active = booking::Entity::find()
        .filter(booking::Column::VehicleId.eq(vehicle_id))
        .filter(booking::Column::Status.is_not_in(TERMINAL_STATUSES))
        .one(&state.db)
        .await?;

    if active.is_some() {
        return Err(AppError::Conflict(
            "Vehicle has an active booking".to_string(),
        ));
    }

    vehicle::Entity::delete_by_id(vehicle_id)
        .exec(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Vehicle removed" })))
}

// ============ Bookings ============

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub vehicle_id: Uuid,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub scheduled_pickup_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub car_wash: String,
    pub service: ServiceKind,
    pub vehicle_plate: String,
    pub total_amount: f64,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub wash_start_time: Option<DateTime<Utc>>,
    pub wash_complete_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn booking_response(
    b: booking::Model,
    car_wash_name: String,
    service_kind: ServiceKind,
    vehicle_plate: String,
) -> BookingResponse {
    BookingResponse {
        id: b.id,
        status: b.status,
        payment_status: b.payment_status,
        car_wash: car_wash_name,
        service: service_kind,
        vehicle_plate,
        total_amount: b.total_amount,
        pickup_address: b.pickup_address,
        pickup_lat: b.pickup_lat,
        pickup_lng: b.pickup_lng,
        scheduled_pickup_time: b.scheduled_pickup_time.with_timezone(&Utc),
        actual_pickup_time: b.actual_pickup_time.map(|t| t.with_timezone(&Utc)),
        wash_start_time: b.wash_start_time.map(|t| t.with_timezone(&Utc)),
        wash_complete_time: b.wash_complete_time.map(|t| t.with_timezone(&Utc)),
        delivery_time: b.delivery_time.map(|t| t.with_timezone(&Utc)),
        created_at: b.created_at.with_timezone(&Utc),
    }
}

/// Book a wash: a pickup, the chosen service, and delivery back
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    // Validate vehicle ownership
    let vehicle = vehicle::Entity::find_by_id(payload.vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.client_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only book washes for your own vehicles".to_string(),
        ));
    }

    // Validate service; the service determines the car wash and the price
    let service = service::Entity::find_by_id(payload.service_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    let car_wash = user::Entity::find_by_id(service.car_wash_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Car wash not found".to_string()))?;

    if payload.pickup_address.trim().is_empty() {
        return Err(AppError::Validation(
            "Pickup address is required".to_string(),
        ));
    }

    if payload.scheduled_pickup_time < Utc::now() {
        return Err(AppError::BadRequest(
            "Pickup time must be in the future".to_string(),
        ));
    }

    // Validate pickup point is within the car wash's service area
    if let (Some(base_lat), Some(base_lng), Some(radius)) =
        (car_wash.base_lat, car_wash.base_lng, car_wash.pickup_radius_km)
    {
        if !is_within_radius(payload.pickup_lat, payload.pickup_lng, base_lat, base_lng, radius) {
            return Err(AppError::BadRequest(format!(
                "Pickup point must be within {} km of {}",
                radius,
                car_wash.business_name.as_deref().unwrap_or("the car wash")
            )));
        }
    }

    // One active booking per vehicle at a time
    let existing = booking::Entity::find()
        .filter(booking::Column::VehicleId.eq(vehicle.id))
        .filter(booking::Column::Status.is_not_in(TERMINAL_STATUSES))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "This vehicle already has an active booking".to_string(),
        ));
    }

    let booking_id = Uuid::new_v4();
    let new_booking = booking::ActiveModel {
        id: Set(booking_id),
        client_id: Set(claims.sub),
        driver_id: Set(None),
        car_wash_id: Set(service.car_wash_id),
        vehicle_id: Set(vehicle.id),
        service_id: Set(service.id),
        status: Set(BookingStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        total_amount: Set(service.price),
        pickup_address: Set(payload.pickup_address.trim().to_string()),
        pickup_lat: Set(payload.pickup_lat),
        pickup_lng: Set(payload.pickup_lng),
        scheduled_pickup_time: Set(payload.scheduled_pickup_time.into()),
        ..Default::default()
    };

    let booking = new_booking.insert(&state.db).await?;

    notify(
        &state.db,
        car_wash.id,
        format!("New booking for {} ({})", vehicle.plate, claims.email),
    )
    .await?;

    Ok(Json(booking_response(
        booking,
        car_wash.business_name.unwrap_or_default(),
        service.kind,
        vehicle.plate,
    )))
}

/// List the logged-in client's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::ClientId.eq(claims.sub))
        .all(&state.db)
        .await?;

    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::ClientId.eq(claims.sub))
        .all(&state.db)
        .await?;
    let services = service::Entity::find().all(&state.db).await?;
    let car_washes = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Carwash))
        .all(&state.db)
        .await?;

    let responses: Vec<BookingResponse> = bookings
        .into_iter()
        .filter_map(|b| {
            let service = services.iter().find(|s| s.id == b.service_id)?;
            let vehicle = vehicles.iter().find(|v| v.id == b.vehicle_id);
            let car_wash = car_washes.iter().find(|w| w.id == b.car_wash_id);

            Some(booking_response(
                b,
                car_wash
                    .and_then(|w| w.business_name.clone())
                    .unwrap_or_default(),
                service.kind.clone(),
                vehicle.map(|v| v.plate.clone()).unwrap_or_default(),
            ))
        })
        .collect();

    Ok(Json(responses))
}

/// Get one booking
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.client_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only view your own bookings".to_string(),
        ));
    }

    let service = service::Entity::find_by_id(booking.service_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Service not found".to_string()))?;
    let vehicle = vehicle::Entity::find_by_id(booking.vehicle_id)
        .one(&state.db)
        .await?;
    let car_wash = user::Entity::find_by_id(booking.car_wash_id)
        .one(&state.db)
        .await?;

    Ok(Json(booking_response(
        booking,
        car_wash
            .and_then(|w| w.business_name)
            .unwrap_or_default(),
        service.kind,
        vehicle.map(|v| v.plate).unwrap_or_default(),
    )))
}

/// Cancel a booking (only before pickup)
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.client_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only cancel your own bookings".to_string(),
        ));
    }

    let updated = lifecycle::apply_transition(
        &state.db,
        &booking,
        BookingStatus::Cancelled,
        &UserRole::Client,
        None,
    )
    .await?;

    notify(
        &state.db,
        updated.car_wash_id,
        "A booking has been cancelled by the client".to_string(),
    )
    .await?;
    if let Some(driver_id) = updated.driver_id {
        notify(
            &state.db,
            driver_id,
            "A booking you accepted has been cancelled".to_string(),
        )
        .await?;
    }

    Ok(Json(updated))
}

// ============ Payment ============

#[derive(Debug, Deserialize)]
pub struct PayBookingRequest {
    pub method: PaymentMethod,
}

/// Settle the payment for a booking
pub async fn pay_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<PayBookingRequest>,
) -> AppResult<Json<payment::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.client_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only pay for your own bookings".to_string(),
        ));
    }

    if matches!(
        booking.status,
        BookingStatus::Cancelled | BookingStatus::Declined
    ) {
        return Err(AppError::Validation(
            "Cannot pay for a cancelled booking".to_string(),
        ));
    }

    // Payment is created when a driver accepts; nothing is owed before that
    let payment = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No payment is due on this booking yet".to_string()))?;

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

    // Settle only if still pending; a concurrent settlement loses here
    let result = payment::Entity::update_many()
        .col_expr(payment::Column::Status, Expr::value(PaymentStatus::Paid))
        .col_expr(payment::Column::Method, Expr::value(Some(payload.method)))
        .col_expr(payment::Column::PaidAt, Expr::value(Some(now)))
        .filter(payment::Column::Id.eq(payment.id))
        .filter(payment::Column::Status.eq(PaymentStatus::Pending))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Payment has already been settled".to_string(),
        ));
    }

    // Mirror onto the booking so the lifecycle can gate completion on it
    booking::Entity::update_many()
        .col_expr(
            booking::Column::PaymentStatus,
            Expr::value(PaymentStatus::Paid),
        )
        .filter(booking::Column::Id.eq(booking.id))
        .exec(&state.db)
        .await?;

    let updated = payment::Entity::find_by_id(payment.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    Ok(Json(updated))
}

/// Confirm receipt of the delivered vehicle, closing the booking
pub async fn confirm_completion(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.client_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only confirm your own bookings".to_string(),
        ));
    }

    let updated = lifecycle::apply_transition(
        &state.db,
        &booking,
        BookingStatus::Completed,
        &UserRole::Client,
        None,
    )
    .await?;

    notify(
        &state.db,
        updated.car_wash_id,
        "A booking has been confirmed as completed".to_string(),
    )
    .await?;

    Ok(Json(updated))
}
