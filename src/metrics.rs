//! Prometheus counters for slot activity
//!
//! Counters are process-wide and labelled by outcome (`ok` / `refused`).

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static::lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = {
        let registry = Registry::new();
        for counter in [&*CLAIMS_TOTAL, &*RELEASES_TOTAL, &*PLACEMENTS_TOTAL] {
            if let Err(e) = registry.register(Box::new(counter.clone())) {
                error!("Failed to register metric: {}", e);
            }
        }
        registry
    };

    pub static ref CLAIMS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("keyslot_claims_total", "Total claim attempts"),
        &["status"]
    ).unwrap();

    pub static ref RELEASES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("keyslot_releases_total", "Total release attempts"),
        &["status"]
    ).unwrap();

    pub static ref PLACEMENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("keyslot_placements_total", "Total payload placements"),
        &["status"]
    ).unwrap();
}

fn status(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "refused"
    }
}

pub fn record_claim(ok: bool) {
    CLAIMS_TOTAL.with_label_values(&[status(ok)]).inc();
}

pub fn record_release(ok: bool) {
    RELEASES_TOTAL.with_label_values(&[status(ok)]).inc();
}

pub fn record_placement(ok: bool) {
    PLACEMENTS_TOTAL.with_label_values(&[status(ok)]).inc();
}

/// Render all counters in the Prometheus text format
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("Failed to convert metrics to string: {}", e);
        String::new()
    })
}
