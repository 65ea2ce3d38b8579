//! Order-to-driver assignment and route building.
//!
//! Every public operation on [`Dispatcher`] takes the pass lock before it
//! touches driver commitments, so two passes never check capacity against
//! the same driver at once.

pub mod assignment;
pub mod capacity;
pub mod lifecycle;
pub mod reoptimize;
pub mod routes;
pub mod selector;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::config::DispatchSettings;
use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::models::route::Route;
use crate::notify::NotificationSink;
use crate::observability::metrics::Metrics;
use crate::store::Stores;

pub use assignment::Assignments;

pub struct Dispatcher {
    stores: Stores,
    notifier: Arc<dyn NotificationSink>,
    settings: DispatchSettings,
    metrics: Metrics,
    pass_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        stores: Stores,
        notifier: Arc<dyn NotificationSink>,
        settings: DispatchSettings,
        metrics: Metrics,
    ) -> Self {
        Self {
            stores,
            notifier,
            settings,
            metrics,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    fn announce_assignment(&self, driver: &Driver, order: &Order) {
        if let Err(err) = self.notifier.notify_order_assigned(driver, order) {
            warn!(
                error = %err,
                driver_id = %driver.id,
                order_id = %order.id,
                "order-assigned notification failed"
            );
        }
        self.announce_order_update(order);
    }

    fn announce_order_update(&self, order: &Order) {
        if let Err(err) = self.notifier.notify_client_order_update(order.client_id, order) {
            warn!(
                error = %err,
                client_id = %order.client_id,
                order_id = %order.id,
                "client notification failed"
            );
        }
    }

    fn announce_route(&self, driver: &Driver, route: &Route) {
        if let Err(err) = self.notifier.notify_route_updated(driver, route) {
            warn!(
                error = %err,
                driver_id = %driver.id,
                route_id = %route.id,
                "route-updated notification failed"
            );
        }
    }
}
