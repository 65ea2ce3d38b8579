use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::event::{Audience, DispatchEvent, EventPayload};
use crate::models::order::Order;
use crate::models::route::Route;

/// Outbound notifications. Callers log and drop errors; a failed
/// notification never undoes the state change it reports.
pub trait NotificationSink: Send + Sync {
    fn notify_order_assigned(&self, driver: &Driver, order: &Order) -> Result<(), AppError>;
    fn notify_route_updated(&self, driver: &Driver, route: &Route) -> Result<(), AppError>;
    fn notify_client_order_update(&self, client_id: Uuid, order: &Order) -> Result<(), AppError>;
}

/// Publishes events on a broadcast channel consumed by websocket sessions.
pub struct BroadcastNotifier {
    events_tx: broadcast::Sender<DispatchEvent>,
}

impl BroadcastNotifier {
    pub fn new(events_tx: broadcast::Sender<DispatchEvent>) -> Self {
        Self { events_tx }
    }

    fn publish(&self, event: DispatchEvent) -> Result<(), AppError> {
        // An error here only means nobody is subscribed right now.
        if self.events_tx.send(event).is_err() {
            debug!("no event subscribers; dropping notification");
        }
        Ok(())
    }
}

impl NotificationSink for BroadcastNotifier {
    fn notify_order_assigned(&self, driver: &Driver, order: &Order) -> Result<(), AppError> {
        self.publish(DispatchEvent::new(
            Audience::Driver(driver.id),
            EventPayload::NewOrder {
                order_id: order.id,
                pickup: order.pickup,
                dropoff: order.dropoff,
                priority: order.priority,
            },
        ))?;
        debug!(driver_id = %driver.id, order_id = %order.id, "new order sent to driver");
        Ok(())
    }

    fn notify_route_updated(&self, driver: &Driver, route: &Route) -> Result<(), AppError> {
        self.publish(DispatchEvent::new(
            Audience::Driver(driver.id),
            EventPayload::RouteUpdate {
                route_id: route.id,
                order_ids: route.order_ids.clone(),
                estimated_distance_km: route.estimated_distance_km,
                estimated_duration_secs: route.estimated_duration_secs,
            },
        ))?;
        debug!(driver_id = %driver.id, route_id = %route.id, "route update sent to driver");
        Ok(())
    }

    fn notify_client_order_update(&self, client_id: Uuid, order: &Order) -> Result<(), AppError> {
        self.publish(DispatchEvent::new(
            Audience::Client(client_id),
            EventPayload::OrderUpdate {
                order_id: order.id,
                status: order.status,
                driver_id: order.assigned_driver,
            },
        ))?;
        debug!(client_id = %client_id, order_id = %order.id, "order update sent to client");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;
    use uuid::Uuid;

    use super::{BroadcastNotifier, NotificationSink};
    use crate::geo::GeoPoint;
    use crate::models::driver::{Driver, VehicleType};
    use crate::models::event::{Audience, EventPayload};
    use crate::models::order::Order;

    #[test]
    fn publishing_without_subscribers_is_not_an_error() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        let notifier = BroadcastNotifier::new(tx);
        let driver = Driver::new("d", GeoPoint::new(0.0, 0.0), 1.0, 1.0, VehicleType::Van);
        let order = Order::new(
            Uuid::new_v4(),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            1.0,
        );

        assert!(notifier.notify_order_assigned(&driver, &order).is_ok());
    }

    #[test]
    fn client_updates_are_addressed_to_the_client() {
        let (tx, mut rx) = broadcast::channel(4);
        let notifier = BroadcastNotifier::new(tx);
        let client_id = Uuid::new_v4();
        let order = Order::new(client_id, GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0), 1.0);

        notifier.notify_client_order_update(client_id, &order).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.audience, Audience::Client(client_id));
        assert!(matches!(
            event.payload,
            EventPayload::OrderUpdate { order_id, .. } if order_id == order.id
        ));
    }
}
