use tracing::{debug, info};

use crate::engine::{Assignments, Dispatcher};
use crate::error::AppError;
use crate::models::order::OrderStatus;

impl Dispatcher {
    /// Re-runs a full assignment pass after something released capacity.
    ///
    /// Orders that are already assigned keep their driver. They are looked at
    /// only to decide whether there is anything to do; their weight reaches
    /// the pass through the capacity ledger, not through re-selection.
    pub async fn reoptimize(&self) -> Result<Assignments, AppError> {
        let _pass = self.pass_lock.lock().await;
        self.reoptimize_locked()
    }

    pub(crate) fn reoptimize_locked(&self) -> Result<Assignments, AppError> {
        let pending = self.stores.orders.find_by_status(OrderStatus::New)?;
        let assigned = self.stores.orders.find_by_status(OrderStatus::Assigned)?;

        if pending.is_empty() && assigned.is_empty() {
            debug!("nothing to reoptimize");
            return Ok(Assignments::new());
        }

        info!(
            pending = pending.len(),
            assigned = assigned.len(),
            "reoptimizing backlog"
        );
        self.run_pass()
    }
}
