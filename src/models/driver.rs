use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VehicleType {
    Motorcycle,
    Car,
    Van,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub capacity_weight: f64,
    pub capacity_volume: f64,
    pub available: bool,
    pub vehicle_type: VehicleType,
    pub phone_number: Option<String>,
    pub license_plate: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(
        name: impl Into<String>,
        location: GeoPoint,
        capacity_weight: f64,
        capacity_volume: f64,
        vehicle_type: VehicleType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            capacity_weight,
            capacity_volume,
            available: true,
            vehicle_type,
            phone_number: None,
            license_plate: None,
            last_seen_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}
