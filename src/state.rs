use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::DispatchSettings;
use crate::engine::Dispatcher;
use crate::models::event::DispatchEvent;
use crate::notify::BroadcastNotifier;
use crate::observability::metrics::Metrics;
use crate::store::Stores;

pub struct AppState {
    pub stores: Stores,
    pub dispatcher: Dispatcher,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(settings: DispatchSettings, event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let stores = Stores::in_memory();
        let metrics = Metrics::new();
        let notifier = Arc::new(BroadcastNotifier::new(events_tx.clone()));
        let dispatcher = Dispatcher::new(stores.clone(), notifier, settings, metrics.clone());

        Self {
            stores,
            dispatcher,
            events_tx,
            metrics,
        }
    }
}
