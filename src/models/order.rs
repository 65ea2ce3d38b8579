use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;

/// Declaration order is the ranking: `Express` outranks everything.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Express,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    New,
    Assigned,
    Picked,
    InTransit,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Delivered and canceled orders no longer occupy vehicle capacity.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    pub fn holds_driver(self) -> bool {
        matches!(
            self,
            OrderStatus::Assigned
                | OrderStatus::Picked
                | OrderStatus::InTransit
                | OrderStatus::Delivered
        )
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (New, Assigned)
                | (New, Canceled)
                | (Assigned, New)
                | (Assigned, Picked)
                | (Assigned, Canceled)
                | (Picked, InTransit)
                | (Picked, Delivered)
                | (InTransit, Delivered)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub pickup: GeoPoint,
    pub pickup_address: Option<String>,
    pub dropoff: GeoPoint,
    pub dropoff_address: Option<String>,
    pub weight: f64,
    #[serde(default)]
    pub volume: f64,
    pub priority: Priority,
    pub status: OrderStatus,
    pub assigned_driver: Option<Uuid>,
    pub route_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(client_id: Uuid, pickup: GeoPoint, dropoff: GeoPoint, weight: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            pickup,
            pickup_address: None,
            dropoff,
            dropoff_address: None,
            weight,
            volume: 0.0,
            priority: Priority::Normal,
            status: OrderStatus::New,
            assigned_driver: None,
            route_id: None,
            description: None,
            created_at: now,
            updated_at: now,
            delivered_at: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Moves the order to `next`, keeping the driver binding consistent with
    /// the new status.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "order {} cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }

        let now = Utc::now();
        self.status = next;
        self.updated_at = now;

        if !next.holds_driver() {
            self.assigned_driver = None;
            self.route_id = None;
        }
        if next == OrderStatus::Delivered {
            self.delivered_at = Some(now);
        }

        Ok(())
    }

    /// Binds the order to `driver_id` and marks it assigned.
    pub fn assign_to(&mut self, driver_id: Uuid) -> Result<(), AppError> {
        self.transition(OrderStatus::Assigned)?;
        self.assigned_driver = Some(driver_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{Order, OrderStatus, Priority};
    use crate::geo::GeoPoint;

    fn order() -> Order {
        Order::new(
            Uuid::new_v4(),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            10.0,
        )
    }

    #[test]
    fn priorities_rank_express_highest() {
        assert!(Priority::Express > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn assignment_binds_driver() {
        let mut order = order();
        let driver_id = Uuid::new_v4();

        order.assign_to(driver_id).unwrap();

        assert_eq!(order.status, OrderStatus::Assigned);
        assert_eq!(order.assigned_driver, Some(driver_id));
    }

    #[test]
    fn release_clears_driver_and_route() {
        let mut order = order();
        order.assign_to(Uuid::new_v4()).unwrap();
        order.route_id = Some(Uuid::new_v4());

        order.transition(OrderStatus::New).unwrap();

        assert!(order.assigned_driver.is_none());
        assert!(order.route_id.is_none());
    }

    #[test]
    fn picked_order_cannot_be_canceled() {
        let mut order = order();
        order.assign_to(Uuid::new_v4()).unwrap();
        order.transition(OrderStatus::Picked).unwrap();

        let result = order.transition(OrderStatus::Canceled);

        assert!(result.is_err());
        assert_eq!(order.status, OrderStatus::Picked);
    }

    #[test]
    fn delivery_stamps_delivered_at_and_keeps_driver() {
        let mut order = order();
        let driver_id = Uuid::new_v4();
        order.assign_to(driver_id).unwrap();
        order.transition(OrderStatus::Picked).unwrap();

        order.transition(OrderStatus::Delivered).unwrap();

        assert!(order.delivered_at.is_some());
        assert_eq!(order.assigned_driver, Some(driver_id));
        assert!(order.status.is_terminal());
    }

    #[test]
    fn new_order_cannot_skip_to_delivered() {
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::New));
    }
}
