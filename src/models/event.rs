use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::order::{OrderStatus, Priority};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id")]
pub enum Audience {
    Driver(Uuid),
    Client(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    NewOrder {
        order_id: Uuid,
        pickup: GeoPoint,
        dropoff: GeoPoint,
        priority: Priority,
    },
    RouteUpdate {
        route_id: Uuid,
        order_ids: Vec<Uuid>,
        estimated_distance_km: f64,
        estimated_duration_secs: i64,
    },
    OrderUpdate {
        order_id: Uuid,
        status: OrderStatus,
        driver_id: Option<Uuid>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub audience: Audience,
    pub payload: EventPayload,
    pub emitted_at: DateTime<Utc>,
}

impl DispatchEvent {
    pub fn new(audience: Audience, payload: EventPayload) -> Self {
        Self {
            audience,
            payload,
            emitted_at: Utc::now(),
        }
    }
}
