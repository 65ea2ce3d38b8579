use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::DispatchSettings;
use crate::engine::Dispatcher;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::driver::{Driver, VehicleType};
use crate::models::order::{Order, OrderStatus, Priority};
use crate::models::route::Route;
use crate::notify::NotificationSink;
use crate::observability::metrics::Metrics;
use crate::store::memory::{
    InMemoryDriverStore, InMemoryOrderStore, InMemoryRouteStore, InMemoryTelemetryStore,
};
use crate::store::{OrderStore, Stores};

pub(crate) fn driver_at(lat: f64, lng: f64, capacity_weight: f64, capacity_volume: f64) -> Driver {
    Driver::new(
        "test-driver",
        GeoPoint::new(lat, lng),
        capacity_weight,
        capacity_volume,
        VehicleType::Car,
    )
}

pub(crate) fn order_from(
    pickup: (f64, f64),
    dropoff: (f64, f64),
    weight: f64,
    priority: Priority,
) -> Order {
    Order::new(
        Uuid::new_v4(),
        GeoPoint::new(pickup.0, pickup.1),
        GeoPoint::new(dropoff.0, dropoff.1),
        weight,
    )
    .with_priority(priority)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    OrderAssigned { driver_id: Uuid, order_id: Uuid },
    RouteUpdated { driver_id: Uuid, route_id: Uuid },
    ClientUpdate { client_id: Uuid, order_id: Uuid },
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    fn record(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify_order_assigned(&self, driver: &Driver, order: &Order) -> Result<(), AppError> {
        self.record(Notice::OrderAssigned {
            driver_id: driver.id,
            order_id: order.id,
        });
        Ok(())
    }

    fn notify_route_updated(&self, driver: &Driver, route: &Route) -> Result<(), AppError> {
        self.record(Notice::RouteUpdated {
            driver_id: driver.id,
            route_id: route.id,
        });
        Ok(())
    }

    fn notify_client_order_update(&self, client_id: Uuid, order: &Order) -> Result<(), AppError> {
        self.record(Notice::ClientUpdate {
            client_id,
            order_id: order.id,
        });
        Ok(())
    }
}

pub(crate) struct FailingNotifier;

impl NotificationSink for FailingNotifier {
    fn notify_order_assigned(&self, _driver: &Driver, _order: &Order) -> Result<(), AppError> {
        Err(AppError::Internal("notification channel down".to_string()))
    }

    fn notify_route_updated(&self, _driver: &Driver, _route: &Route) -> Result<(), AppError> {
        Err(AppError::Internal("notification channel down".to_string()))
    }

    fn notify_client_order_update(&self, _client_id: Uuid, _order: &Order) -> Result<(), AppError> {
        Err(AppError::Internal("notification channel down".to_string()))
    }
}

/// Order store that counts successful saves and can be told to start
/// failing.
pub(crate) struct CountingOrderStore {
    inner: InMemoryOrderStore,
    saves: AtomicUsize,
    fail_from: AtomicUsize,
}

impl CountingOrderStore {
    fn new() -> Self {
        Self {
            inner: InMemoryOrderStore::default(),
            saves: AtomicUsize::new(0),
            fail_from: AtomicUsize::new(usize::MAX),
        }
    }

    pub(crate) fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Saves fail once `limit` saves have succeeded.
    pub(crate) fn fail_after(&self, limit: usize) {
        self.fail_from.store(limit, Ordering::SeqCst);
    }
}

impl OrderStore for CountingOrderStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        self.inner.find_by_id(id)
    }

    fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, AppError> {
        self.inner.find_by_status(status)
    }

    fn find_by_driver(&self, driver_id: Uuid) -> Result<Vec<Order>, AppError> {
        self.inner.find_by_driver(driver_id)
    }

    fn find_by_client(&self, client_id: Uuid) -> Result<Vec<Order>, AppError> {
        self.inner.find_by_client(client_id)
    }

    fn save(&self, order: Order) -> Result<Order, AppError> {
        if self.saves() >= self.fail_from.load(Ordering::SeqCst) {
            return Err(AppError::Storage("injected write failure".to_string()));
        }
        let saved = self.inner.save(order)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(saved)
    }

    fn list(&self) -> Result<Vec<Order>, AppError> {
        self.inner.list()
    }
}

/// A dispatcher over in-memory stores. Entities added through the harness
/// get strictly increasing creation times, so store listings come back in
/// insertion order.
pub(crate) struct Harness {
    pub dispatcher: Dispatcher,
    pub stores: Stores,
    pub orders: Arc<CountingOrderStore>,
    pub notifier: Arc<RecordingNotifier>,
    epoch: DateTime<Utc>,
    tick: AtomicI64,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self::build(DispatchSettings::default(), notifier.clone(), notifier)
    }

    pub(crate) fn with(settings: DispatchSettings, sink: Arc<dyn NotificationSink>) -> Self {
        Self::build(settings, sink, Arc::new(RecordingNotifier::default()))
    }

    fn build(
        settings: DispatchSettings,
        sink: Arc<dyn NotificationSink>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let orders = Arc::new(CountingOrderStore::new());
        let stores = Stores {
            orders: orders.clone(),
            drivers: Arc::new(InMemoryDriverStore::default()),
            routes: Arc::new(InMemoryRouteStore::default()),
            telemetry: Arc::new(InMemoryTelemetryStore::default()),
        };
        let dispatcher = Dispatcher::new(stores.clone(), sink, settings, Metrics::new());

        Self {
            dispatcher,
            stores,
            orders,
            notifier,
            epoch: Utc::now(),
            tick: AtomicI64::new(0),
        }
    }

    fn next_instant(&self) -> DateTime<Utc> {
        self.epoch + Duration::seconds(self.tick.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn add_driver(&self, mut driver: Driver) -> Driver {
        driver.created_at = self.next_instant();
        self.stores.drivers.save(driver).unwrap()
    }

    pub(crate) fn add_order(&self, mut order: Order) -> Order {
        order.created_at = self.next_instant();
        self.stores.orders.save(order).unwrap()
    }
}
