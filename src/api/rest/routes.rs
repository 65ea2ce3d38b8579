use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::engine::Assignments;
use crate::error::AppError;
use crate::models::route::Route;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes", get(list_routes))
        .route("/routes/compute", post(compute_routes))
        .route("/routes/reoptimize", post(reoptimize))
}

async fn list_routes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Route>>, AppError> {
    Ok(Json(state.stores.routes.list()?))
}

async fn compute_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Assignments>, AppError> {
    Ok(Json(state.dispatcher.compute_routes().await?))
}

async fn reoptimize(State(state): State<Arc<AppState>>) -> Result<Json<Assignments>, AppError> {
    Ok(Json(state.dispatcher.reoptimize().await?))
}
