use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;

/// One position report from a driver's device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub location: GeoPoint,
    pub speed_kmh: Option<f64>,
    /// Degrees clockwise from north, [0, 360).
    pub heading_deg: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl TelemetrySample {
    pub fn new(driver_id: Uuid, location: GeoPoint) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id,
            location,
            speed_kmh: None,
            heading_deg: None,
            accuracy_m: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.location.is_valid() {
            return Err(AppError::BadRequest(
                "location must have lat in [-90, 90] and lng in [-180, 180]".to_string(),
            ));
        }
        if let Some(speed) = self.speed_kmh {
            if !speed.is_finite() || speed < 0.0 {
                return Err(AppError::BadRequest("speed_kmh must be >= 0".to_string()));
            }
        }
        if let Some(heading) = self.heading_deg {
            if !(0.0..360.0).contains(&heading) {
                return Err(AppError::BadRequest(
                    "heading_deg must be in [0, 360)".to_string(),
                ));
            }
        }
        if let Some(accuracy) = self.accuracy_m {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(AppError::BadRequest("accuracy_m must be >= 0".to_string()));
            }
        }
        Ok(())
    }
}
