use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{error, info};
use uuid::Uuid;

use crate::engine::capacity::{admits, PassLedger};
use crate::engine::selector::select_best_driver;
use crate::engine::Dispatcher;
use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::order::{Order, OrderStatus};

/// Orders newly assigned in one pass, keyed by driver, in assignment order.
/// Drivers that received nothing are absent.
pub type Assignments = BTreeMap<Uuid, Vec<Order>>;

/// Highest priority first, then heaviest first. The sort is stable, so equal
/// orders keep the order the store returned them in.
pub fn sort_backlog(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.weight.total_cmp(&a.weight))
    });
}

impl Dispatcher {
    /// Runs one assignment pass over every pending order and builds the
    /// resulting routes.
    pub async fn compute_routes(&self) -> Result<Assignments, AppError> {
        let _pass = self.pass_lock.lock().await;
        self.run_pass()
    }

    pub(crate) fn run_pass(&self) -> Result<Assignments, AppError> {
        let backlog = self.stores.orders.find_by_status(OrderStatus::New)?;
        let pool = self.stores.drivers.find_available()?;

        if backlog.is_empty() || pool.is_empty() {
            info!(
                pending_orders = backlog.len(),
                available_drivers = pool.len(),
                "nothing to assign"
            );
            self.metrics
                .assignment_passes_total
                .with_label_values(&["idle"])
                .inc();
            return Ok(Assignments::new());
        }

        let start = Instant::now();
        match self.assign_backlog(backlog, &pool) {
            Ok(assignments) => {
                self.metrics
                    .observe_pass("success", start.elapsed().as_secs_f64());
                Ok(assignments)
            }
            Err(err) => {
                self.metrics
                    .observe_pass("error", start.elapsed().as_secs_f64());
                error!(error = %err, "assignment pass aborted");
                Err(err)
            }
        }
    }

    fn assign_backlog(
        &self,
        mut backlog: Vec<Order>,
        pool: &[Driver],
    ) -> Result<Assignments, AppError> {
        sort_backlog(&mut backlog);

        let mut ledger = PassLedger::seed(pool, self.stores.orders.as_ref())?;
        let mut assignments = Assignments::new();
        let mut assigned = 0usize;
        let mut unassigned = 0usize;

        for mut order in backlog {
            let Some(selection) = select_best_driver(&order, pool, &ledger, &self.settings) else {
                unassigned += 1;
                info!(
                    order_id = %order.id,
                    weight = order.weight,
                    volume = order.volume,
                    priority = ?order.priority,
                    "no admissible driver; order stays pending"
                );
                continue;
            };
            let driver = selection.driver;

            order.assign_to(driver.id)?;
            let order = self.stores.orders.save(order)?;
            ledger.commit(driver.id, order.clone());
            assigned += 1;
            self.metrics.orders_assigned_total.inc();
            self.record_utilization(driver, &ledger);

            info!(
                order_id = %order.id,
                driver_id = %driver.id,
                distance_km = selection.distance_km,
                score = selection.score,
                "order assigned"
            );

            self.announce_assignment(driver, &order);
            assignments.entry(driver.id).or_default().push(order);
        }

        self.metrics.orders_unassigned_total.inc_by(unassigned as u64);
        self.build_routes(&mut assignments)?;

        info!(
            assigned,
            unassigned,
            drivers = assignments.len(),
            "assignment pass finished"
        );

        Ok(assignments)
    }

    /// Assigns a pending order to a chosen driver, skipping selection. The
    /// driver's open orders still count against capacity. Availability is
    /// not checked.
    pub async fn assign_manually(
        &self,
        order_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Order, AppError> {
        let _pass = self.pass_lock.lock().await;

        let driver = self.stores.require_driver(driver_id)?;
        let mut order = self.stores.require_order(order_id)?;
        if !order.status.can_transition_to(OrderStatus::Assigned) {
            return Err(AppError::Conflict(format!(
                "order {} is {:?} and cannot be assigned",
                order.id, order.status
            )));
        }

        let mut ledger =
            PassLedger::seed(std::slice::from_ref(&driver), self.stores.orders.as_ref())?;
        if !admits(&driver, ledger.committed(driver.id), &order) {
            return Err(AppError::Conflict(format!(
                "driver {} has no room for order {}",
                driver.id, order.id
            )));
        }

        order.assign_to(driver.id)?;
        let order = self.stores.orders.save(order)?;
        ledger.commit(driver.id, order.clone());
        self.metrics.orders_assigned_total.inc();
        self.record_utilization(&driver, &ledger);
        info!(order_id = %order.id, driver_id = %driver.id, "order assigned manually");
        self.announce_assignment(&driver, &order);

        let mut assignments = Assignments::from([(driver.id, vec![order])]);
        self.build_routes(&mut assignments)?;
        self.stores.require_order(order_id)
    }

    fn record_utilization(&self, driver: &Driver, ledger: &PassLedger) {
        let utilization = ledger.load(driver.id).weight / driver.capacity_weight;
        self.metrics
            .driver_weight_utilization
            .with_label_values(&[&driver.id.to_string()])
            .set(utilization);
    }
}
