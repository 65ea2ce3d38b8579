//! Persistence seams of the engine.
//!
//! The engine only talks to these traits. Calls are synchronous and every
//! `save` is durable on return, so a pass that fails midway keeps whatever it
//! already wrote.

pub mod memory;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::order::{Order, OrderStatus};
use crate::models::route::Route;
use crate::models::telemetry::TelemetrySample;

pub trait OrderStore: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError>;
    fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, AppError>;
    fn find_by_driver(&self, driver_id: Uuid) -> Result<Vec<Order>, AppError>;
    fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Order>, AppError>;
    fn save(&self, order: Order) -> Result<Order, AppError>;
    fn list(&self) -> Result<Vec<Order>, AppError>;
}

pub trait DriverStore: Send + Sync {
    fn find_available(&self) -> Result<Vec<Driver>, AppError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Driver>, AppError>;
    fn save(&self, driver: Driver) -> Result<Driver, AppError>;
    fn list(&self) -> Result<Vec<Driver>, AppError>;
}

pub trait RouteStore: Send + Sync {
    /// The driver's earliest created route that is still planned or in
    /// progress.
    fn find_active_by_driver(&self, driver_id: Uuid) -> Result<Option<Route>, AppError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Route>, AppError>;
    fn save(&self, route: Route) -> Result<Route, AppError>;
    fn list(&self) -> Result<Vec<Route>, AppError>;
}

pub trait TelemetryStore: Send + Sync {
    fn record(&self, sample: TelemetrySample) -> Result<TelemetrySample, AppError>;
    /// The driver's samples, oldest first.
    fn history(&self, driver_id: Uuid) -> Result<Vec<TelemetrySample>, AppError>;
}

#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub drivers: Arc<dyn DriverStore>,
    pub routes: Arc<dyn RouteStore>,
    pub telemetry: Arc<dyn TelemetryStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(memory::InMemoryOrderStore::default()),
            drivers: Arc::new(memory::InMemoryDriverStore::default()),
            routes: Arc::new(memory::InMemoryRouteStore::default()),
            telemetry: Arc::new(memory::InMemoryTelemetryStore::default()),
        }
    }

    /// Keeps the sample in the driver's history and moves the driver to the
    /// reported position. A sample older than the driver's last report is
    /// only kept in the history.
    pub fn record_telemetry(&self, sample: TelemetrySample) -> Result<Driver, AppError> {
        sample.validate()?;
        let mut driver = self.require_driver(sample.driver_id)?;
        let sample = self.telemetry.record(sample)?;

        if sample.recorded_at < driver.last_seen_at {
            return Ok(driver);
        }
        driver.location = sample.location;
        driver.last_seen_at = sample.recorded_at;
        driver.updated_at = Utc::now();
        self.drivers.save(driver)
    }

    pub fn require_order(&self, id: Uuid) -> Result<Order, AppError> {
        self.orders
            .find_by_id(id)?
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))
    }

    pub fn require_driver(&self, id: Uuid) -> Result<Driver, AppError> {
        self.drivers
            .find_by_id(id)?
            .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))
    }

    pub fn require_route(&self, id: Uuid) -> Result<Route, AppError> {
        self.routes
            .find_by_id(id)?
            .ok_or_else(|| AppError::NotFound(format!("route {} not found", id)))
    }
}
