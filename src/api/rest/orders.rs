use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{require_positive, require_valid_point};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::order::{Order, OrderStatus, Priority};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/assign/:driver_id", put(assign_order))
        .route("/orders/client/:client_id", get(list_client_orders))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: Uuid,
    pub pickup: GeoPoint,
    pub pickup_address: Option<String>,
    pub dropoff: GeoPoint,
    pub dropoff_address: Option<String>,
    pub weight: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub priority: Priority,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
}

/// Stores the order and immediately runs an assignment pass, so the
/// response already shows whether a driver took it.
async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    require_valid_point("pickup", &payload.pickup)?;
    require_valid_point("dropoff", &payload.dropoff)?;
    require_positive("weight", payload.weight)?;
    if !payload.volume.is_finite() || payload.volume < 0.0 {
        return Err(AppError::BadRequest("volume must be >= 0".to_string()));
    }

    let mut order = Order::new(payload.client_id, payload.pickup, payload.dropoff, payload.weight)
        .with_volume(payload.volume)
        .with_priority(payload.priority);
    order.pickup_address = payload.pickup_address;
    order.dropoff_address = payload.dropoff_address;
    order.description = payload.description;

    let order = state.stores.orders.save(order)?;
    info!(
        order_id = %order.id,
        client_id = %order.client_id,
        priority = ?order.priority,
        "order created"
    );

    state.dispatcher.compute_routes().await?;

    Ok(Json(state.stores.require_order(order.id)?))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = match query.status {
        Some(status) => state.stores.orders.find_by_status(status)?,
        None => state.stores.orders.list()?,
    };
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.stores.require_order(id)?))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.dispatcher.cancel(id).await?))
}

async fn assign_order(
    State(state): State<Arc<AppState>>,
    Path((id, driver_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.dispatcher.assign_manually(id, driver_id).await?))
}

async fn list_client_orders(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.stores.orders.find_by_client(client_id)?))
}
