use tracing::info;
use uuid::Uuid;

use crate::engine::{Assignments, Dispatcher};
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::models::route::{Route, RouteStatus};

impl Dispatcher {
    /// The driver has collected the order. Starts the route if it was still
    /// only planned.
    pub async fn confirm_pickup(
        &self,
        driver_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let _pass = self.pass_lock.lock().await;

        let mut order = self.order_held_by(driver_id, order_id)?;
        order.transition(OrderStatus::Picked)?;
        let order = self.stores.orders.save(order)?;

        if let Some(route_id) = order.route_id {
            let mut route = self.stores.require_route(route_id)?;
            if route.status == RouteStatus::Planned {
                route.start();
                self.stores.routes.save(route)?;
                info!(route_id = %route_id, driver_id = %driver_id, "route started");
            }
        }

        info!(order_id = %order.id, driver_id = %driver_id, "order picked up");
        self.announce_order_update(&order);
        Ok(order)
    }

    pub async fn mark_in_transit(
        &self,
        driver_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let _pass = self.pass_lock.lock().await;

        let mut order = self.order_held_by(driver_id, order_id)?;
        order.transition(OrderStatus::InTransit)?;
        let order = self.stores.orders.save(order)?;

        self.announce_order_update(&order);
        Ok(order)
    }

    /// Marks the order delivered and completes its route once every stop on
    /// it is delivered.
    pub async fn confirm_delivery(
        &self,
        driver_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let _pass = self.pass_lock.lock().await;

        let mut order = self.order_held_by(driver_id, order_id)?;
        order.transition(OrderStatus::Delivered)?;
        let order = self.stores.orders.save(order)?;

        if let Some(route_id) = order.route_id {
            let mut route = self.stores.require_route(route_id)?;
            if self.complete_if_delivered(&mut route)? {
                self.stores.routes.save(route)?;
            }
        }

        info!(order_id = %order.id, driver_id = %driver_id, "order delivered");
        self.announce_order_update(&order);
        Ok(order)
    }

    /// The driver hands the order back. It returns to the backlog, leaves
    /// its route, and the backlog is reoptimized.
    pub async fn decline(
        &self,
        driver_id: Uuid,
        order_id: Uuid,
    ) -> Result<Assignments, AppError> {
        let _pass = self.pass_lock.lock().await;

        let mut order = self.order_held_by(driver_id, order_id)?;
        let route_id = order.route_id;
        order.transition(OrderStatus::New)?;
        let order = self.stores.orders.save(order)?;
        info!(order_id = %order.id, driver_id = %driver_id, "order declined; back in the backlog");

        self.detach_from_route(route_id, order.id)?;
        self.announce_order_update(&order);

        self.reoptimize_locked()
    }

    pub async fn cancel(&self, order_id: Uuid) -> Result<Order, AppError> {
        let _pass = self.pass_lock.lock().await;

        let mut order = self.stores.require_order(order_id)?;
        let route_id = order.route_id;
        order.transition(OrderStatus::Canceled)?;
        let order = self.stores.orders.save(order)?;
        info!(order_id = %order.id, "order canceled");

        self.detach_from_route(route_id, order.id)?;
        self.announce_order_update(&order);
        Ok(order)
    }

    fn order_held_by(&self, driver_id: Uuid, order_id: Uuid) -> Result<Order, AppError> {
        self.stores.require_driver(driver_id)?;
        let order = self.stores.require_order(order_id)?;

        if order.assigned_driver != Some(driver_id) {
            return Err(AppError::BadRequest(format!(
                "order {} is not assigned to driver {}",
                order_id, driver_id
            )));
        }

        Ok(order)
    }

    fn detach_from_route(&self, route_id: Option<Uuid>, order_id: Uuid) -> Result<(), AppError> {
        let Some(route_id) = route_id else {
            return Ok(());
        };

        let mut route = self.stores.require_route(route_id)?;
        if !route.remove_order(order_id) {
            return Ok(());
        }

        let driver = self.stores.require_driver(route.driver_id)?;
        self.refresh_route_metrics(&driver, &mut route)?;
        self.complete_if_delivered(&mut route)?;
        let route = self.stores.routes.save(route)?;
        self.announce_route(&driver, &route);
        Ok(())
    }

    /// Completes an active route whose remaining stops are all delivered.
    /// An emptied route stays open for the next pass. Returns whether the
    /// route changed.
    fn complete_if_delivered(&self, route: &mut Route) -> Result<bool, AppError> {
        if !route.status.is_active() || route.order_ids.is_empty() {
            return Ok(false);
        }
        for stop_id in &route.order_ids {
            if self.stores.require_order(*stop_id)?.status != OrderStatus::Delivered {
                return Ok(false);
            }
        }

        route.complete();
        info!(route_id = %route.id, driver_id = %route.driver_id, "route completed");
        Ok(true)
    }
}
