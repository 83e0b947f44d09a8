use axum::{extract::State, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::create_token;
use crate::utils::password::{hash_password, verify_password};
use crate::AppState;

/// Roles that can self-register. Admin accounts are seeded, never registered.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterRole {
    Client,
    Driver,
    Carwash,
}

impl From<RegisterRole> for UserRole {
    fn from(role: RegisterRole) -> Self {
        match role {
            RegisterRole::Client => UserRole::Client,
            RegisterRole::Driver => UserRole::Driver,
            RegisterRole::Carwash => UserRole::Carwash,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub national_id: String,
    pub role: RegisterRole,
    // Driver-specific
    pub license_number: Option<String>,
    // Car-wash-specific
    pub business_name: Option<String>,
    pub base_lat: Option<f64>,
    pub base_lng: Option<f64>,
    pub pickup_radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

/// Register a new client, driver or car wash account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".to_string()));
    }
    if payload.email.is_empty() || payload.national_id.is_empty() {
        return Err(AppError::Validation(
            "Email and national ID are required".to_string(),
        ));
    }

    // Role-specific required fields
    match payload.role {
        RegisterRole::Driver => {
            if payload.license_number.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::Validation(
                    "Drivers must provide a license number".to_string(),
                ));
            }
        }
        RegisterRole::Carwash => {
            if payload.business_name.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::Validation(
                    "Car washes must provide a business name".to_string(),
                ));
            }
            if payload.base_lat.is_none() || payload.base_lng.is_none() {
                return Err(AppError::Validation(
                    "Car washes must provide a base location".to_string(),
                ));
            }
            if payload.pickup_radius_km.unwrap_or(0.0) <= 0.0 {
                return Err(AppError::Validation(
                    "Car washes must provide a positive pickup radius".to_string(),
                ));
            }
        }
        RegisterRole::Client => {}
    }

    // Check if email or national ID already registered
    let existing = user::Entity::find()
        .filter(
            user::Column::Email
                .eq(&payload.email)
                .or(user::Column::NationalId.eq(&payload.national_id)),
        )
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Email or national ID already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let role: UserRole = payload.role.into();

    let user_id = Uuid::new_v4();
    let new_user = user::ActiveModel {
        id: Set(user_id),
        email: Set(payload.email.clone()),
        national_id: Set(payload.national_id.clone()),
        password_hash: Set(password_hash),
        name: Set(payload.name.clone()),
        phone: Set(payload.phone.clone()),
        role: Set(role),
        license_number: Set(payload.license_number.clone()),
        business_name: Set(payload.business_name.clone()),
        base_lat: Set(payload.base_lat),
        base_lng: Set(payload.base_lng),
        pickup_radius_km: Set(payload.pickup_radius_km),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await?;

    let token = create_token(
        user.id,
        &user.email,
        user.role.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        },
    }))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    // The same message covers both unknown email and wrong password, so a
    // response never reveals which one failed
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = create_token(
        user.id,
        &user.email,
        user.role.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        },
    }))
}
