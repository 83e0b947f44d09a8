//! Dashboard aggregation.
//!
//! Stats are computed from a single SELECT over the booking collection so
//! every number in a response describes the same snapshot; nothing is
//! counted in a second query that could observe later writes.

use std::collections::BTreeMap;

use sea_orm::{ActiveEnum, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::PaymentStatus;
use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_bookings: i64,
    pub by_status: BTreeMap<String, i64>,
    /// Bookings somewhere between acceptance and the end of the wash.
    pub in_progress: i64,
    pub completed: i64,
    /// Sum of totals over bookings whose payment has settled.
    pub revenue: f64,
}

fn is_in_progress(status: &BookingStatus) -> bool {
    use BookingStatus::*;
    matches!(
        status,
        Accepted | PickedUp | AtWash | WaitingBay | WashingBay | DryingBay | WashCompleted
    )
}

pub fn compute_stats(bookings: &[booking::Model]) -> DashboardStats {
    let mut by_status: BTreeMap<String, i64> = BTreeMap::new();
    let mut in_progress = 0;
    let mut completed = 0;
    let mut revenue = 0.0;

    for b in bookings {
        *by_status.entry(b.status.to_value()).or_insert(0) += 1;

        if is_in_progress(&b.status) {
            in_progress += 1;
        }
        if b.status == BookingStatus::Completed {
            completed += 1;
        }
        if b.payment_status == PaymentStatus::Paid {
            revenue += b.total_amount;
        }
    }

    DashboardStats {
        total_bookings: bookings.len() as i64,
        by_status,
        in_progress,
        completed,
        revenue,
    }
}

/// Load the snapshot and aggregate, scoped to one car wash when given.
pub async fn dashboard(
    db: &DatabaseConnection,
    car_wash_id: Option<Uuid>,
) -> AppResult<DashboardStats> {
    let mut query = booking::Entity::find();
    if let Some(id) = car_wash_id {
        query = query.filter(booking::Column::CarWashId.eq(id));
    }

    let bookings = query.all(db).await?;
    Ok(compute_stats(&bookings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixture(status: BookingStatus, payment_status: PaymentStatus, total: f64) -> booking::Model {
        let now = Utc::now().into();
        booking::Model {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            driver_id: None,
            car_wash_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            status,
            payment_status,
            total_amount: total,
            pickup_address: "1 Test Lane".to_string(),
            pickup_lat: 0.0,
            pickup_lng: 0.0,
            scheduled_pickup_time: now,
            actual_pickup_time: None,
            wash_start_time: None,
            wash_complete_time: None,
            delivery_time: None,
            created_at: now,
        }
    }

    #[test]
    fn test_revenue_counts_paid_only() {
        use BookingStatus::*;
        let bookings = vec![
            fixture(Pending, PaymentStatus::Pending, 100.0),
            fixture(PickedUp, PaymentStatus::Pending, 200.0),
            fixture(Completed, PaymentStatus::Paid, 300.0),
            fixture(Completed, PaymentStatus::Paid, 400.0),
        ];

        let stats = compute_stats(&bookings);
        assert_eq!(stats.total_bookings, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.revenue, 700.0);
        assert_eq!(stats.by_status.get("pending"), Some(&1));
        assert_eq!(stats.by_status.get("picked_up"), Some(&1));
        assert_eq!(stats.by_status.get("completed"), Some(&2));
    }

    #[test]
    fn test_in_progress_set() {
        use BookingStatus::*;
        let bookings = vec![
            fixture(Pending, PaymentStatus::Pending, 10.0),
            fixture(Accepted, PaymentStatus::Pending, 10.0),
            fixture(WashingBay, PaymentStatus::Paid, 10.0),
            fixture(WashCompleted, PaymentStatus::Paid, 10.0),
            fixture(Delivered, PaymentStatus::Paid, 10.0),
            fixture(Cancelled, PaymentStatus::Refunded, 10.0),
        ];

        let stats = compute_stats(&bookings);
        // accepted, washing_bay and wash_completed; pending, delivered and
        // cancelled are outside the window
        assert_eq!(stats.in_progress, 3);
    }

    #[test]
    fn test_empty_snapshot() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_bookings, 0);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.revenue, 0.0);
        assert!(stats.by_status.is_empty());
    }
}
