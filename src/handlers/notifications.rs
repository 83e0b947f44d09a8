use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::notification;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

/// Insert a notification row for `user_id`. Called from booking handlers
/// after the state change has been persisted.
pub async fn notify(db: &DatabaseConnection, user_id: Uuid, body: String) -> AppResult<()> {
    let row = notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        body: Set(body),
        is_read: Set(false),
        ..Default::default()
    };

    row.insert(db).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// List the logged-in user's notifications, newest first
pub async fn my_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    let rows = notification::Entity::find()
        .filter(notification::Column::UserId.eq(claims.sub))
        .order_by_desc(notification::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let responses: Vec<NotificationResponse> = rows
        .into_iter()
        .map(|n| NotificationResponse {
            id: n.id,
            body: n.body,
            is_read: n.is_read,
            created_at: n.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

/// Mark one of the logged-in user's notifications as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let row = notification::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    if row.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only read your own notifications".to_string(),
        ));
    }

    let mut active: notification::ActiveModel = row.into();
    active.is_read = Set(true);
    active.update(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "Notification marked as read" })))
}
