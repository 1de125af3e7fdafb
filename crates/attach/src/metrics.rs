use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use tracing::error;

lazy_static! {
    static ref ATTACH_INSTANCES: IntGauge = IntGauge::new(
        "veneer_attach_instances",
        "Currently registered resource instances"
    )
    .unwrap();
    static ref ATTACH_SCANS_TOTAL: IntCounter =
        IntCounter::new("veneer_attach_scans_total", "Scan passes executed").unwrap();
    static ref ATTACH_CREATED_TOTAL: IntCounter = IntCounter::new(
        "veneer_attach_instances_created_total",
        "Resource instances created"
    )
    .unwrap();
    static ref ATTACH_PRUNED_TOTAL: IntCounter = IntCounter::new(
        "veneer_attach_instances_pruned_total",
        "Resource instances pruned after detachment"
    )
    .unwrap();
    static ref ATTACH_PASSES_TOTAL: IntCounter = IntCounter::new(
        "veneer_attach_passes_total",
        "Scheduled scan-plus-prune passes"
    )
    .unwrap();
    static ref ATTACH_COALESCED_TOTAL: IntCounter = IntCounter::new(
        "veneer_attach_coalesced_total",
        "Notification bursts merged into an already-pending pass"
    )
    .unwrap();
    static ref ATTACH_SCAN_DURATION: Histogram = Histogram::with_opts(HistogramOpts::new(
        "veneer_attach_scan_duration_seconds",
        "Scan pass duration"
    ))
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register attach metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, ATTACH_INSTANCES.clone());
    register(registry, ATTACH_SCANS_TOTAL.clone());
    register(registry, ATTACH_CREATED_TOTAL.clone());
    register(registry, ATTACH_PRUNED_TOTAL.clone());
    register(registry, ATTACH_PASSES_TOTAL.clone());
    register(registry, ATTACH_COALESCED_TOTAL.clone());
    register(registry, ATTACH_SCAN_DURATION.clone());
}

pub fn set_instance_count(count: usize) {
    ATTACH_INSTANCES.set(count as i64);
}

pub fn record_scan(created: usize, duration: Duration) {
    ATTACH_SCANS_TOTAL.inc();
    ATTACH_CREATED_TOTAL.inc_by(created as u64);
    ATTACH_SCAN_DURATION.observe(duration.as_secs_f64());
}

pub fn record_pass() {
    ATTACH_PASSES_TOTAL.inc();
}

pub fn record_coalesced() {
    ATTACH_COALESCED_TOTAL.inc();
}

pub fn record_pruned(count: usize) {
    ATTACH_PRUNED_TOTAL.inc_by(count as u64);
}
