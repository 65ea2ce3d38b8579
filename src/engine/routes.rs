use std::collections::BTreeSet;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::{Assignments, Dispatcher};
use crate::error::AppError;
use crate::geo::{haversine_km, travel_seconds, GeoPoint};
use crate::models::driver::Driver;
use crate::models::order::{Order, OrderStatus};
use crate::models::route::Route;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub duration_secs: i64,
}

/// Drives the stops in sequence from `start`: to each pickup, then on to its
/// dropoff. Every leg is timed separately at `average_speed_kmh`.
pub fn measure_route(
    start: &GeoPoint,
    stops: &[Order],
    average_speed_kmh: f64,
) -> Result<RouteMetrics, AppError> {
    let mut distance_km = 0.0;
    let mut duration_secs = 0.0;
    let mut position = *start;

    for stop in stops {
        let to_pickup = haversine_km(&position, &stop.pickup);
        let to_dropoff = haversine_km(&stop.pickup, &stop.dropoff);

        distance_km += to_pickup + to_dropoff;
        duration_secs += travel_seconds(to_pickup, average_speed_kmh)
            + travel_seconds(to_dropoff, average_speed_kmh);

        position = stop.dropoff;
    }

    if !distance_km.is_finite() || !duration_secs.is_finite() {
        return Err(AppError::Computation(format!(
            "route metrics are not finite (distance {distance_km}, duration {duration_secs})"
        )));
    }

    Ok(RouteMetrics {
        distance_km,
        duration_secs: duration_secs as i64,
    })
}

impl Dispatcher {
    /// Adds each driver's newly assigned orders to that driver's active
    /// route and refreshes its estimates. Orders already on the route are
    /// left in place.
    pub async fn materialize_routes(
        &self,
        assignments: &mut Assignments,
    ) -> Result<Vec<Route>, AppError> {
        let _pass = self.pass_lock.lock().await;
        self.build_routes(assignments)
    }

    /// The driver's planned or in-progress route, or a fresh planned one
    /// that has not been saved yet.
    pub fn active_route_for(&self, driver: &Driver) -> Result<Route, AppError> {
        Ok(self
            .stores
            .routes
            .find_active_by_driver(driver.id)?
            .unwrap_or_else(|| Route::planned(driver.id)))
    }

    /// Assigned orders that never made it onto a route, for instance because
    /// an earlier pass failed between saving them and building routes. Each
    /// driver's list comes back in creation order.
    fn unrouted_orders(&self) -> Result<Assignments, AppError> {
        let mut unrouted = Assignments::new();
        for order in self.stores.orders.find_by_status(OrderStatus::Assigned)? {
            if let (Some(driver_id), None) = (order.assigned_driver, order.route_id) {
                unrouted.entry(driver_id).or_default().push(order);
            }
        }
        Ok(unrouted)
    }

    pub(crate) fn build_routes(
        &self,
        assignments: &mut Assignments,
    ) -> Result<Vec<Route>, AppError> {
        let mut unrouted = self.unrouted_orders()?;
        let drivers: BTreeSet<Uuid> = assignments
            .iter()
            .filter(|(_, orders)| !orders.is_empty())
            .map(|(driver_id, _)| *driver_id)
            .chain(unrouted.keys().copied())
            .collect();
        let mut routes = Vec::with_capacity(drivers.len());

        for driver_id in drivers {
            let driver = self.stores.require_driver(driver_id)?;
            let mut route = self.active_route_for(&driver)?;

            // Leftovers from earlier passes go first, then this batch.
            let fresh = assignments.get(&driver_id).map(Vec::as_slice).unwrap_or(&[]);
            let mut stops = unrouted.remove(&driver_id).unwrap_or_default();
            stops.retain(|order| fresh.iter().all(|new| new.id != order.id));
            stops.extend(fresh.iter().cloned());

            let mut appended = 0usize;
            for order in &stops {
                if route.append_order(order.id) {
                    appended += 1;
                }
            }

            self.refresh_route_metrics(&driver, &mut route)?;
            let route = self.stores.routes.save(route)?;

            for order in &stops {
                self.attach_to_route(order, &route)?;
            }
            if let Some(orders) = assignments.get_mut(&driver_id) {
                for order in orders.iter_mut() {
                    *order = self.stores.require_order(order.id)?;
                }
            }

            info!(
                driver_id = %driver.id,
                route_id = %route.id,
                appended,
                stops = route.order_ids.len(),
                distance_km = route.estimated_distance_km,
                duration_secs = route.estimated_duration_secs,
                "route updated"
            );

            self.announce_route(&driver, &route);
            routes.push(route);
        }

        Ok(routes)
    }

    /// Recomputes the route's estimates over its whole sequence, starting at
    /// the driver's current position.
    pub(crate) fn refresh_route_metrics(
        &self,
        driver: &Driver,
        route: &mut Route,
    ) -> Result<(), AppError> {
        let stops = route
            .order_ids
            .iter()
            .map(|order_id| self.stores.require_order(*order_id))
            .collect::<Result<Vec<Order>, AppError>>()?;

        let metrics = measure_route(&driver.location, &stops, self.settings.average_speed_kmh)?;
        route.estimated_distance_km = metrics.distance_km;
        route.estimated_duration_secs = metrics.duration_secs;
        route.updated_at = Utc::now();
        Ok(())
    }

    fn attach_to_route(&self, order: &Order, route: &Route) -> Result<Order, AppError> {
        let mut stored = self.stores.require_order(order.id)?;
        if stored.route_id == Some(route.id) {
            return Ok(stored);
        }
        stored.route_id = Some(route.id);
        stored.updated_at = Utc::now();
        self.stores.orders.save(stored)
    }
}
