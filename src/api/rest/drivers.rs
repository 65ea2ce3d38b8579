use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{require_positive, require_valid_point};
use crate::engine::Assignments;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::driver::{Driver, VehicleType};
use crate::models::order::Order;
use crate::models::route::Route;
use crate::models::telemetry::TelemetrySample;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/location", patch(update_driver_location))
        .route("/drivers/:id/telemetry", get(get_driver_telemetry))
        .route("/drivers/:id/availability", patch(update_driver_availability))
        .route("/drivers/:id/orders", get(list_driver_orders))
        .route("/drivers/:id/route", get(get_driver_route))
        .route("/drivers/:id/orders/:order_id/pickup", post(confirm_pickup))
        .route("/drivers/:id/orders/:order_id/in-transit", post(mark_in_transit))
        .route("/drivers/:id/orders/:order_id/deliver", post(confirm_delivery))
        .route("/drivers/:id/orders/:order_id/decline", post(decline_order))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub location: GeoPoint,
    pub capacity_weight: f64,
    pub capacity_volume: f64,
    pub vehicle_type: VehicleType,
    pub phone_number: Option<String>,
    pub license_plate: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
    pub speed_kmh: Option<f64>,
    pub heading_deg: Option<f64>,
    pub accuracy_m: Option<f64>,
    /// Device clock; the server's when absent.
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    require_valid_point("location", &payload.location)?;
    require_positive("capacity_weight", payload.capacity_weight)?;
    require_positive("capacity_volume", payload.capacity_volume)?;

    let mut driver = Driver::new(
        payload.name,
        payload.location,
        payload.capacity_weight,
        payload.capacity_volume,
        payload.vehicle_type,
    );
    driver.phone_number = payload.phone_number;
    driver.license_plate = payload.license_plate;

    let driver = state.stores.drivers.save(driver)?;
    info!(driver_id = %driver.id, vehicle = ?driver.vehicle_type, "driver registered");
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(state.stores.drivers.list()?))
}

async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    require_valid_point("location", &payload.location)?;

    let mut sample = TelemetrySample::new(id, payload.location);
    sample.speed_kmh = payload.speed_kmh;
    sample.heading_deg = payload.heading_deg;
    sample.accuracy_m = payload.accuracy_m;
    if let Some(recorded_at) = payload.recorded_at {
        sample.recorded_at = recorded_at;
    }

    Ok(Json(state.stores.record_telemetry(sample)?))
}

async fn get_driver_telemetry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TelemetrySample>>, AppError> {
    state.stores.require_driver(id)?;
    Ok(Json(state.stores.telemetry.history(id)?))
}

async fn update_driver_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state.stores.require_driver(id)?;
    driver.available = payload.available;
    driver.updated_at = Utc::now();

    let driver = state.stores.drivers.save(driver)?;
    info!(driver_id = %driver.id, available = driver.available, "driver availability changed");
    Ok(Json(driver))
}

async fn list_driver_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Order>>, AppError> {
    state.stores.require_driver(id)?;
    Ok(Json(state.stores.orders.find_by_driver(id)?))
}

async fn get_driver_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<Route>>, AppError> {
    state.stores.require_driver(id)?;
    Ok(Json(state.stores.routes.find_active_by_driver(id)?))
}

async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.dispatcher.confirm_pickup(id, order_id).await?))
}

async fn mark_in_transit(
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.dispatcher.mark_in_transit(id, order_id).await?))
}

async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.dispatcher.confirm_delivery(id, order_id).await?))
}

async fn decline_order(
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Assignments>, AppError> {
    Ok(Json(state.dispatcher.decline(id, order_id).await?))
}
