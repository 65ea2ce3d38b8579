use std::collections::HashMap;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::store::OrderStore;

/// Weight and volume held by open orders.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Load {
    pub weight: f64,
    pub volume: f64,
}

impl Load {
    /// Sums the orders that still occupy the vehicle; delivered and canceled
    /// ones are skipped.
    pub fn of<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders
            .into_iter()
            .filter(|order| !order.status.is_terminal())
            .fold(Load::default(), |load, order| Load {
                weight: load.weight + order.weight,
                volume: load.volume + order.volume,
            })
    }
}

/// Whether `driver` can carry `candidate` on top of `committed`.
pub fn admits(driver: &Driver, committed: &[Order], candidate: &Order) -> bool {
    let used = Load::of(committed);

    used.weight + candidate.weight <= driver.capacity_weight
        && used.volume + candidate.volume <= driver.capacity_volume
}

/// Orders each driver holds during one assignment pass: what was already
/// persisted when the pass started plus what the pass has committed since.
#[derive(Debug, Default)]
pub struct PassLedger {
    committed: HashMap<Uuid, Vec<Order>>,
}

impl PassLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(pool: &[Driver], orders: &dyn OrderStore) -> Result<Self, AppError> {
        let mut ledger = Self::new();
        for driver in pool {
            let open: Vec<Order> = orders
                .find_by_driver(driver.id)?
                .into_iter()
                .filter(|order| !order.status.is_terminal())
                .collect();
            ledger.committed.insert(driver.id, open);
        }
        Ok(ledger)
    }

    pub fn committed(&self, driver_id: Uuid) -> &[Order] {
        self.committed
            .get(&driver_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn commit(&mut self, driver_id: Uuid, order: Order) {
        self.committed.entry(driver_id).or_default().push(order);
    }

    pub fn load(&self, driver_id: Uuid) -> Load {
        Load::of(self.committed(driver_id))
    }
}

#[cfg(test)]
mod tests {
    use super::{admits, Load, PassLedger};
    use crate::engine::test_support::{driver_at, order_from};
    use crate::models::order::{OrderStatus, Priority};
    use crate::store::memory::InMemoryOrderStore;
    use crate::store::OrderStore;

    #[test]
    fn load_ignores_delivered_and_canceled_orders() {
        let open = order_from((0.0, 0.0), (0.0, 1.0), 10.0, Priority::Normal).with_volume(2.0);
        let mut delivered = order_from((0.0, 0.0), (0.0, 1.0), 50.0, Priority::Normal);
        delivered.status = OrderStatus::Delivered;
        let mut canceled = order_from((0.0, 0.0), (0.0, 1.0), 70.0, Priority::Normal);
        canceled.status = OrderStatus::Canceled;

        let load = Load::of(&[open, delivered, canceled]);

        assert_eq!(load, Load { weight: 10.0, volume: 2.0 });
    }

    #[test]
    fn exact_fit_is_admitted() {
        let driver = driver_at(0.0, 0.0, 100.0, 10.0);
        let committed = vec![order_from((0.0, 0.0), (0.0, 1.0), 60.0, Priority::Normal)];
        let candidate = order_from((0.0, 0.0), (0.0, 1.0), 40.0, Priority::Normal);

        assert!(admits(&driver, &committed, &candidate));
    }

    #[test]
    fn volume_alone_can_reject() {
        let driver = driver_at(0.0, 0.0, 100.0, 10.0);
        let committed =
            vec![order_from((0.0, 0.0), (0.0, 1.0), 1.0, Priority::Normal).with_volume(8.0)];
        let candidate = order_from((0.0, 0.0), (0.0, 1.0), 1.0, Priority::Normal).with_volume(3.0);

        assert!(!admits(&driver, &committed, &candidate));
    }

    #[test]
    fn seeded_ledger_holds_only_open_persisted_orders() {
        let store = InMemoryOrderStore::default();
        let driver = driver_at(0.0, 0.0, 100.0, 100.0);

        let mut open = order_from((0.0, 0.0), (0.0, 1.0), 30.0, Priority::Normal);
        open.assign_to(driver.id).unwrap();
        let mut done = order_from((0.0, 0.0), (0.0, 1.0), 50.0, Priority::Normal);
        done.assign_to(driver.id).unwrap();
        done.transition(OrderStatus::Picked).unwrap();
        done.transition(OrderStatus::Delivered).unwrap();
        store.save(open.clone()).unwrap();
        store.save(done).unwrap();

        let mut ledger = PassLedger::seed(std::slice::from_ref(&driver), &store).unwrap();
        assert_eq!(ledger.committed(driver.id).len(), 1);
        assert_eq!(ledger.load(driver.id).weight, 30.0);

        ledger.commit(driver.id, order_from((0.0, 0.0), (0.0, 1.0), 20.0, Priority::High));
        assert_eq!(ledger.load(driver.id).weight, 50.0);
    }
}
