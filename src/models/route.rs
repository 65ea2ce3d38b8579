use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RouteStatus {
    Planned,
    InProgress,
    Completed,
    Canceled,
}

impl RouteStatus {
    pub fn is_active(self) -> bool {
        matches!(self, RouteStatus::Planned | RouteStatus::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub driver_id: Uuid,
    /// Visiting sequence.
    pub order_ids: Vec<Uuid>,
    pub status: RouteStatus,
    pub estimated_distance_km: f64,
    pub estimated_duration_secs: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    pub fn planned(driver_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            driver_id,
            order_ids: Vec::new(),
            status: RouteStatus::Planned,
            estimated_distance_km: 0.0,
            estimated_duration_secs: 0,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends `order_id` unless it is already on the route. Returns whether
    /// the sequence changed.
    pub fn append_order(&mut self, order_id: Uuid) -> bool {
        if self.order_ids.contains(&order_id) {
            return false;
        }
        self.order_ids.push(order_id);
        true
    }

    pub fn remove_order(&mut self, order_id: Uuid) -> bool {
        let before = self.order_ids.len();
        self.order_ids.retain(|id| *id != order_id);
        self.order_ids.len() != before
    }

    pub fn start(&mut self) {
        if self.status == RouteStatus::Planned {
            let now = Utc::now();
            self.status = RouteStatus::InProgress;
            self.started_at = Some(now);
            self.updated_at = now;
        }
    }

    pub fn complete(&mut self) {
        let now = Utc::now();
        self.status = RouteStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }
}
