use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::order::{Order, OrderStatus};
use crate::models::route::Route;
use crate::models::telemetry::TelemetrySample;
use crate::store::{DriverStore, OrderStore, RouteStore, TelemetryStore};

/// Entities the in-memory stores can order by creation.
trait Chronological {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid);
}

impl Chronological for Order {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

impl Chronological for Driver {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

impl Chronological for Route {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

impl Chronological for TelemetrySample {
    fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.recorded_at, self.id)
    }
}

// DashMap iterates in shard order; listings are re-sorted so callers see a
// stable sequence.
fn collect_sorted<T>(map: &DashMap<Uuid, T>, keep: impl Fn(&T) -> bool) -> Vec<T>
where
    T: Chronological + Clone,
{
    let mut items: Vec<T> = map
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| entry.value().clone())
        .collect();
    items.sort_by_key(|item| item.sort_key());
    items
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<Uuid, Order>,
}

impl OrderStore for InMemoryOrderStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, AppError> {
        Ok(collect_sorted(&self.orders, |order| order.status == status))
    }

    fn find_by_driver(&self, driver_id: Uuid) -> Result<Vec<Order>, AppError> {
        Ok(collect_sorted(&self.orders, |order| order.assigned_driver == Some(driver_id)))
    }

    fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Order>, AppError> {
        Ok(collect_sorted(&self.orders, |order| order.client_id == client_id))
    }

    fn save(&self, order: Order) -> Result<Order, AppError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn list(&self) -> Result<Vec<Order>, AppError> {
        Ok(collect_sorted(&self.orders, |_| true))
    }
}

#[derive(Default)]
pub struct InMemoryDriverStore {
    drivers: DashMap<Uuid, Driver>,
}

impl DriverStore for InMemoryDriverStore {
    fn find_available(&self) -> Result<Vec<Driver>, AppError> {
        Ok(collect_sorted(&self.drivers, |driver| driver.available))
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Driver>, AppError> {
        Ok(self.drivers.get(&id).map(|entry| entry.value().clone()))
    }

    fn save(&self, driver: Driver) -> Result<Driver, AppError> {
        self.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    fn list(&self) -> Result<Vec<Driver>, AppError> {
        Ok(collect_sorted(&self.drivers, |_| true))
    }
}

#[derive(Default)]
pub struct InMemoryRouteStore {
    routes: DashMap<Uuid, Route>,
}

impl RouteStore for InMemoryRouteStore {
    fn find_active_by_driver(&self, driver_id: Uuid) -> Result<Option<Route>, AppError> {
        let active = collect_sorted(&self.routes, |route| {
            route.driver_id == driver_id && route.status.is_active()
        });
        Ok(active.into_iter().next())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Route>, AppError> {
        Ok(self.routes.get(&id).map(|entry| entry.value().clone()))
    }

    fn save(&self, route: Route) -> Result<Route, AppError> {
        self.routes.insert(route.id, route.clone());
        Ok(route)
    }

    fn list(&self) -> Result<Vec<Route>, AppError> {
        Ok(collect_sorted(&self.routes, |_| true))
    }
}

#[derive(Default)]
pub struct InMemoryTelemetryStore {
    samples: DashMap<Uuid, TelemetrySample>,
}

impl TelemetryStore for InMemoryTelemetryStore {
    fn record(&self, sample: TelemetrySample) -> Result<TelemetrySample, AppError> {
        self.samples.insert(sample.id, sample.clone());
        Ok(sample)
    }

    fn history(&self, driver_id: Uuid) -> Result<Vec<TelemetrySample>, AppError> {
        Ok(collect_sorted(&self.samples, |sample| sample.driver_id == driver_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::{InMemoryDriverStore, InMemoryOrderStore, InMemoryRouteStore};
    use crate::geo::GeoPoint;
    use crate::models::driver::{Driver, VehicleType};
    use crate::models::order::{Order, OrderStatus};
    use crate::models::route::{Route, RouteStatus};
    use crate::store::{DriverStore, OrderStore, RouteStore};

    #[test]
    fn available_drivers_come_back_in_creation_order() {
        let store = InMemoryDriverStore::default();
        let first = Driver::new("first", GeoPoint::new(0.0, 0.0), 10.0, 10.0, VehicleType::Car);
        let mut second = first.clone();
        second.id = Uuid::new_v4();
        second.created_at = first.created_at + Duration::seconds(1);
        let mut offline = second.clone();
        offline.id = Uuid::new_v4();
        offline.available = false;

        store.save(second.clone()).unwrap();
        store.save(offline).unwrap();
        store.save(first.clone()).unwrap();

        let ids: Vec<Uuid> = store.find_available().unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn orders_are_filtered_by_status_and_driver() {
        let store = InMemoryOrderStore::default();
        let driver_id = Uuid::new_v4();
        let fresh = Order::new(
            Uuid::new_v4(),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            1.0,
        );
        let mut taken = fresh.clone();
        taken.id = Uuid::new_v4();
        taken.assign_to(driver_id).unwrap();

        store.save(fresh.clone()).unwrap();
        store.save(taken.clone()).unwrap();

        let new_orders = store.find_by_status(OrderStatus::New).unwrap();
        assert_eq!(new_orders.len(), 1);
        assert_eq!(new_orders[0].id, fresh.id);

        let driver_orders = store.find_by_driver(driver_id).unwrap();
        assert_eq!(driver_orders.len(), 1);
        assert_eq!(driver_orders[0].id, taken.id);

        let mut other_client = fresh.clone();
        other_client.id = Uuid::new_v4();
        other_client.client_id = Uuid::new_v4();
        store.save(other_client.clone()).unwrap();
        let mine = store.find_by_client(fresh.client_id).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|order| order.client_id == fresh.client_id));
        assert_eq!(store.find_by_client(other_client.client_id).unwrap().len(), 1);
    }

    #[test]
    fn active_route_lookup_ignores_finished_routes_and_picks_earliest() {
        let store = InMemoryRouteStore::default();
        let driver_id = Uuid::new_v4();

        let mut done = Route::planned(driver_id);
        done.status = RouteStatus::Completed;
        let mut older = Route::planned(driver_id);
        older.created_at = done.created_at + Duration::seconds(1);
        let mut newer = Route::planned(driver_id);
        newer.status = RouteStatus::InProgress;
        newer.created_at = done.created_at + Duration::seconds(2);

        store.save(done).unwrap();
        store.save(newer).unwrap();
        store.save(older.clone()).unwrap();

        let active = store.find_active_by_driver(driver_id).unwrap().unwrap();
        assert_eq!(active.id, older.id);
        assert!(store.find_active_by_driver(Uuid::new_v4()).unwrap().is_none());
    }
}
