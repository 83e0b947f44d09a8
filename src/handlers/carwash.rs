use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::PaymentStatus;
use crate::entities::service::{self, ServiceKind};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::handlers::notifications::notify;
use crate::lifecycle;
use crate::reports::{self, DashboardStats};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Service Management ============

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub kind: ServiceKind,
    pub price: f64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub price: Option<f64>,
    pub description: Option<String>,
}

/// List the logged-in car wash's services
pub async fn my_services(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<service::Model>>> {
    let services = service::Entity::find()
        .filter(service::Column::CarWashId.eq(claims.sub))
        .all(&state.db)
        .await?;

    Ok(Json(services))
}

/// Offer a service from the fixed catalog
pub async fn create_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<Json<service::Model>> {
    if payload.price < 0.0 {
        return Err(AppError::Validation(
            "Price must not be negative".to_string(),
        ));
    }

    let new_service = service::ActiveModel {
        id: Set(Uuid::new_v4()),
        car_wash_id: Set(claims.sub),
        kind: Set(payload.kind),
        price: Set(payload.price),
        description: Set(payload.description),
        ..Default::default()
    };

    let service = new_service.insert(&state.db).await?;
    Ok(Json(service))
}

/// Update a service's price or description (the kind is fixed)
pub async fn update_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(service_id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> AppResult<Json<service::Model>> {
    let service = owned_service(&state, service_id, claims.sub).await?;

    let mut active: service::ActiveModel = service.into();

    if let Some(price) = payload.price {
        if price < 0.0 {
            return Err(AppError::Validation(
                "Price must not be negative".to_string(),
            ));
        }
        active.price = Set(price);
    }

    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }

    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

/// Withdraw a service (only while no active booking references it)
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(service_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    owned_service(&state, service_id, claims.sub).await?;

    let active = booking::Entity::find()
        .filter(booking::Column::ServiceId.eq(service_id))
        .filter(booking::Column::Status.is_not_in([
            BookingStatus::Declined,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ]))
        .one(&state.db)
        .await?;

    if active.is_some() {
        return Err(AppError::Conflict(
            "Service is referenced by an active booking".to_string(),
        ));
    }

    service::Entity::delete_by_id(service_id)
        .exec(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Service removed" })))
}

async fn owned_service(
    state: &AppState,
    service_id: Uuid,
    car_wash_id: Uuid,
) -> AppResult<service::Model> {
    let service = service::Entity::find_by_id(service_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    if service.car_wash_id != car_wash_id {
        return Err(AppError::Forbidden(
            "You can only manage your own services".to_string(),
        ));
    }

    Ok(service)
}

// ============ Booking Management ============

#[derive(Debug, Serialize)]
pub struct CarWashBookingResponse {
    pub id: Uuid,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub service: ServiceKind,
    pub vehicle_plate: String,
    pub vehicle_description: String,
    pub client_name: String,
    pub client_phone: String,
    pub driver_name: Option<String>,
    pub scheduled_pickup_time: DateTime<Utc>,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub total_amount: f64,
}

/// List bookings placed with the logged-in car wash
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<CarWashBookingResponse>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::CarWashId.eq(claims.sub))
        .all(&state.db)
        .await?;

    let services = service::Entity::find()
        .filter(service::Column::CarWashId.eq(claims.sub))
        .all(&state.db)
        .await?;
    let vehicles = vehicle::Entity::find().all(&state.db).await?;
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<CarWashBookingResponse> = bookings
        .into_iter()
        .filter_map(|b| {
            let service = services.iter().find(|s| s.id == b.service_id)?;
            let vehicle = vehicles.iter().find(|v| v.id == b.vehicle_id);
            let client = users.iter().find(|u| u.id == b.client_id);
            let driver = b.driver_id.and_then(|id| users.iter().find(|u| u.id == id));

            Some(CarWashBookingResponse {
                id: b.id,
                status: b.status,
                payment_status: b.payment_status,
                service: service.kind.clone(),
                vehicle_plate: vehicle.map(|v| v.plate.clone()).unwrap_or_default(),
                vehicle_description: vehicle
                    .map(|v| format!("{} {} ({})", v.make, v.model, v.color))
                    .unwrap_or_default(),
                client_name: client.map(|c| c.name.clone()).unwrap_or_default(),
                client_phone: client.map(|c| c.phone.clone()).unwrap_or_default(),
                driver_name: driver.map(|d| d.name.clone()),
                scheduled_pickup_time: b.scheduled_pickup_time.with_timezone(&Utc),
                actual_pickup_time: b.actual_pickup_time.map(|t| t.with_timezone(&Utc)),
                total_amount: b.total_amount,
            })
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

/// Advance a booking through the wash stages (at_wash through
/// wash_completed, or delivered when the wash hands the car back itself)
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

    if booking.car_wash_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only update bookings placed with your car wash".to_string(),
        ));
    }

    let updated = lifecycle::apply_transition(
        &state.db,
        &booking,
        payload.status,
        &UserRole::Carwash,
        None,
    )
    .await?;

    match updated.status {
        BookingStatus::WashCompleted => {
            notify(
                &state.db,
                updated.client_id,
                "Your vehicle's wash is complete".to_string(),
            )
            .await?;
            if let Some(driver_id) = updated.driver_id {
                notify(
                    &state.db,
                    driver_id,
                    "A vehicle is ready for delivery".to_string(),
                )
                .await?;
            }
        }
        BookingStatus::Delivered => {
            notify(
                &state.db,
                updated.client_id,
                "Your vehicle has been delivered".to_string(),
            )
            .await?;
        }
        _ => {}
    }

    Ok(Json(updated))
}

/// Booking counts and revenue for the logged-in car wash
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<DashboardStats>> {
    let stats = reports::dashboard(&state.db, Some(claims.sub)).await?;
    Ok(Json(stats))
}
