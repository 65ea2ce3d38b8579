use tracing::warn;

use crate::config::DispatchSettings;
use crate::engine::capacity::{admits, PassLedger};
use crate::geo::haversine_km;
use crate::models::driver::Driver;
use crate::models::order::{Order, Priority};

#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub driver: &'a Driver,
    pub distance_km: f64,
    pub score: f64,
}

/// Lower is better. Express orders have their distance scaled by
/// `express_score_factor`.
pub fn priority_adjusted_score(
    distance_km: f64,
    priority: Priority,
    settings: &DispatchSettings,
) -> f64 {
    match priority {
        Priority::Express => distance_km * settings.express_score_factor,
        Priority::Low | Priority::Normal | Priority::High => distance_km,
    }
}

/// Picks the admissible driver with the lowest score. Ties go to whichever
/// driver comes first in `pool`.
pub fn select_best_driver<'a>(
    order: &Order,
    pool: &'a [Driver],
    ledger: &PassLedger,
    settings: &DispatchSettings,
) -> Option<Selection<'a>> {
    let mut best: Option<Selection<'a>> = None;

    for driver in pool {
        if !admits(driver, ledger.committed(driver.id), order) {
            continue;
        }

        let distance_km = haversine_km(&driver.location, &order.pickup);
        let score = priority_adjusted_score(distance_km, order.priority, settings);

        if !score.is_finite() {
            warn!(
                driver_id = %driver.id,
                order_id = %order.id,
                "non-finite driver score; check coordinates"
            );
            continue;
        }

        let improves = match &best {
            Some(current) => score < current.score,
            None => true,
        };
        if improves {
            best = Some(Selection {
                driver,
                distance_km,
                score,
            });
        }
    }

    best
}
