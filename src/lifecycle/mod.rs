//! Booking lifecycle state machine.
//!
//! The transition table here is the single source of truth for which
//! status edges exist, which actor roles may drive each edge, and which
//! milestone timestamp an edge stamps. Status writes go through
//! [`apply_transition`], which issues a single conditional UPDATE keyed on
//! the status the caller read: when two requests race on the same booking,
//! exactly one matches and the other gets `Conflict`.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::PaymentStatus;
use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};

/// Legal direct successors of a status. Terminal states have none.
pub fn allowed_next(from: &BookingStatus) -> &'static [BookingStatus] {
    use BookingStatus::*;
    match from {
        Pending => &[Accepted, Declined, Cancelled],
        // Cancellation is only permitted before pickup
        Accepted => &[PickedUp, Cancelled],
        PickedUp => &[AtWash],
        AtWash => &[WaitingBay],
        WaitingBay => &[WashingBay],
        WashingBay => &[DryingBay],
        DryingBay => &[WashCompleted],
        WashCompleted => &[Delivered],
        Delivered => &[Completed],
        Declined | Completed | Cancelled => &[],
    }
}

pub fn is_terminal(status: &BookingStatus) -> bool {
    allowed_next(status).is_empty()
}

/// Whether `role` may move a booking into `to`. Edges are keyed by their
/// target status, which is unique per edge group in this machine. Admin
/// may drive any edge.
pub fn role_may_enter(to: &BookingStatus, role: &UserRole) -> bool {
    use BookingStatus::*;

    if *role == UserRole::Admin {
        return true;
    }

    match to {
        Accepted | Declined | PickedUp => *role == UserRole::Driver,
        AtWash | WaitingBay | WashingBay | DryingBay | WashCompleted => {
            *role == UserRole::Carwash
        }
        // The wash hands the car back, or the driver returns it
        Delivered => *role == UserRole::Carwash || *role == UserRole::Driver,
        Completed | Cancelled => *role == UserRole::Client,
        Pending => false,
    }
}

/// Milestone timestamp stamped when a booking enters `to`, if any.
pub fn milestone_column(to: &BookingStatus) -> Option<booking::Column> {
    use BookingStatus::*;
    match to {
        PickedUp => Some(booking::Column::ActualPickupTime),
        WashingBay => Some(booking::Column::WashStartTime),
        WashCompleted => Some(booking::Column::WashCompleteTime),
        Delivered => Some(booking::Column::DeliveryTime),
        _ => None,
    }
}

/// Move `booking` to `to` on behalf of an actor with `role`.
///
/// `booking` is the record as the caller read it; its status is the
/// expected prior state of the conditional write. `assign_driver` is set
/// on the accept edge and written in the same UPDATE as the status, so a
/// booking can never gain two drivers.
pub async fn apply_transition(
    db: &DatabaseConnection,
    booking: &booking::Model,
    to: BookingStatus,
    role: &UserRole,
    assign_driver: Option<Uuid>,
) -> AppResult<booking::Model> {
    if !allowed_next(&booking.status).contains(&to) {
        return Err(AppError::InvalidTransition(format!(
            "Cannot move booking from '{}' to '{}'",
            booking.status.to_value(),
            to.to_value()
        )));
    }

    if !role_may_enter(&to, role) {
        return Err(AppError::Forbidden(format!(
            "Your role is not allowed to move a booking to '{}'",
            to.to_value()
        )));
    }

    if to == BookingStatus::Completed && booking.payment_status != PaymentStatus::Paid {
        return Err(AppError::Validation(
            "Booking cannot be completed until payment is settled".to_string(),
        ));
    }

    // Status, milestone timestamp and driver assignment land in one
    // UPDATE, guarded by the status the caller read
    let mut update = booking::Entity::update_many()
        .col_expr(booking::Column::Status, Expr::value(to.clone()))
        .filter(booking::Column::Id.eq(booking.id))
        .filter(booking::Column::Status.eq(booking.status.clone()));

    if let Some(column) = milestone_column(&to) {
        let now: DateTimeWithTimeZone = Utc::now().into();
        update = update.col_expr(column, Expr::value(Some(now)));
    }

    if let Some(driver_id) = assign_driver {
        update = update
            .col_expr(booking::Column::DriverId, Expr::value(Some(driver_id)))
            .filter(booking::Column::DriverId.is_null());
    }

    if to == BookingStatus::Completed {
        // Guard against a refund racing the completion
        update = update.filter(booking::Column::PaymentStatus.eq(PaymentStatus::Paid));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Booking was modified concurrently, re-read and retry".to_string(),
        ));
    }

    booking::Entity::find_by_id(booking.id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_happy_path_is_connected() {
        use BookingStatus::*;
        let path = [
            Pending,
            Accepted,
            PickedUp,
            AtWash,
            WaitingBay,
            WashingBay,
            DryingBay,
            WashCompleted,
            Delivered,
            Completed,
        ];

        for pair in path.windows(2) {
            assert!(
                allowed_next(&pair[0]).contains(&pair[1]),
                "{:?} -> {:?} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_terminal_states_have_no_successors() {
        use BookingStatus::*;
        for status in [Declined, Completed, Cancelled] {
            assert!(is_terminal(&status));
            for to in BookingStatus::iter() {
                assert!(!allowed_next(&status).contains(&to));
            }
        }
    }

    #[test]
    fn test_no_skipping_wash_stages() {
        use BookingStatus::*;
        assert!(!allowed_next(&PickedUp).contains(&WashingBay));
        assert!(!allowed_next(&AtWash).contains(&DryingBay));
        assert!(!allowed_next(&WaitingBay).contains(&WashCompleted));
    }

    #[test]
    fn test_no_moving_backwards() {
        use BookingStatus::*;
        assert!(!allowed_next(&Delivered).contains(&WashCompleted));
        assert!(!allowed_next(&PickedUp).contains(&Accepted));
        assert!(!allowed_next(&Accepted).contains(&Pending));
    }

    #[test]
    fn test_cancellation_only_before_pickup() {
        use BookingStatus::*;
        assert!(allowed_next(&Pending).contains(&Cancelled));
        assert!(allowed_next(&Accepted).contains(&Cancelled));

        for status in [
            PickedUp, AtWash, WaitingBay, WashingBay, DryingBay, WashCompleted, Delivered,
        ] {
            assert!(
                !allowed_next(&status).contains(&Cancelled),
                "{:?} should not be cancellable",
                status
            );
        }
    }

    #[test]
    fn test_role_table() {
        use BookingStatus::*;

        // Driver accepts, declines, picks up and may hand back
        assert!(role_may_enter(&Accepted, &UserRole::Driver));
        assert!(role_may_enter(&Declined, &UserRole::Driver));
        assert!(role_may_enter(&PickedUp, &UserRole::Driver));
        assert!(role_may_enter(&Delivered, &UserRole::Driver));

        // Car wash runs the wash stages and may hand back
        for to in [AtWash, WaitingBay, WashingBay, DryingBay, WashCompleted, Delivered] {
            assert!(role_may_enter(&to, &UserRole::Carwash));
        }

        // Client cancels and confirms completion, nothing else
        assert!(role_may_enter(&Cancelled, &UserRole::Client));
        assert!(role_may_enter(&Completed, &UserRole::Client));
        assert!(!role_may_enter(&Accepted, &UserRole::Client));
        assert!(!role_may_enter(&WashingBay, &UserRole::Client));

        // Cross-role attempts are rejected
        assert!(!role_may_enter(&Accepted, &UserRole::Carwash));
        assert!(!role_may_enter(&AtWash, &UserRole::Driver));

        // Admin may drive any edge
        for to in BookingStatus::iter() {
            if to != BookingStatus::Pending {
                assert!(role_may_enter(&to, &UserRole::Admin));
            }
        }
    }

    #[test]
    fn test_milestone_columns() {
        use BookingStatus::*;
        assert!(matches!(
            milestone_column(&PickedUp),
            Some(booking::Column::ActualPickupTime)
        ));
        assert!(matches!(
            milestone_column(&WashingBay),
            Some(booking::Column::WashStartTime)
        ));
        assert!(matches!(
            milestone_column(&WashCompleted),
            Some(booking::Column::WashCompleteTime)
        ));
        assert!(matches!(
            milestone_column(&Delivered),
            Some(booking::Column::DeliveryTime)
        ));
        assert!(milestone_column(&Accepted).is_none());
        assert!(milestone_column(&Completed).is_none());
    }
}
