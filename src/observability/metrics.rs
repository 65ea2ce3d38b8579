use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignment_passes_total: IntCounterVec,
    pub assignment_pass_latency_seconds: HistogramVec,
    pub orders_assigned_total: IntCounter,
    pub orders_unassigned_total: IntCounter,
    pub driver_weight_utilization: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignment_passes_total = IntCounterVec::new(
            Opts::new("assignment_passes_total", "Assignment passes by outcome"),
            &["outcome"],
        )
        .expect("valid assignment_passes_total metric");

        let assignment_pass_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "assignment_pass_latency_seconds",
                "Duration of a full assignment pass in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_pass_latency_seconds metric");

        let orders_assigned_total =
            IntCounter::new("orders_assigned_total", "Orders matched to a driver")
                .expect("valid orders_assigned_total metric");

        let orders_unassigned_total = IntCounter::new(
            "orders_unassigned_total",
            "Orders left pending because no driver could take them",
        )
        .expect("valid orders_unassigned_total metric");

        let driver_weight_utilization = GaugeVec::new(
            Opts::new(
                "driver_weight_utilization",
                "Committed weight over weight capacity [0..1]",
            ),
            &["driver_id"],
        )
        .expect("valid driver_weight_utilization metric");

        registry
            .register(Box::new(assignment_passes_total.clone()))
            .expect("register assignment_passes_total");
        registry
            .register(Box::new(assignment_pass_latency_seconds.clone()))
            .expect("register assignment_pass_latency_seconds");
        registry
            .register(Box::new(orders_assigned_total.clone()))
            .expect("register orders_assigned_total");
        registry
            .register(Box::new(orders_unassigned_total.clone()))
            .expect("register orders_unassigned_total");
        registry
            .register(Box::new(driver_weight_utilization.clone()))
            .expect("register driver_weight_utilization");

        Self {
            registry,
            assignment_passes_total,
            assignment_pass_latency_seconds,
            orders_assigned_total,
            orders_unassigned_total,
            driver_weight_utilization,
        }
    }

    pub fn observe_pass(&self, outcome: &str, elapsed_secs: f64) {
        self.assignment_passes_total
            .with_label_values(&[outcome])
            .inc();
        self.assignment_pass_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
