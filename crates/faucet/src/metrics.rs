//! Prometheus metrics for the faucet

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref CLAIMS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("faucet_claims_total", "Total number of claims that left the queue"),
        &["network", "status"]  // success | failed
    ).unwrap();

    pub static ref QUEUE_PENDING: IntGauge = IntGauge::new(
        "faucet_queue_pending",
        "Claims enqueued but not yet settled"
    ).unwrap();

    pub static ref BINDING_CONSTRUCTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("faucet_binding_constructions_total", "Faucet contract bindings built per network"),
        &["network"]
    ).unwrap();
}

/// Register all collectors; safe to call more than once
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CLAIMS_TOTAL.clone()),
        Box::new(QUEUE_PENDING.clone()),
        Box::new(BINDING_CONSTRUCTIONS_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            if !matches!(e, prometheus::Error::AlreadyReg) {
                error!("Failed to register metric: {}", e);
            }
        }
    }
}

pub fn record_claim(network: &str, success: bool) {
    let status = if success { "success" } else { "failed" };
    CLAIMS_TOTAL.with_label_values(&[network, status]).inc();
}

/// Render the registry in the text exposition format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_contains_claims() {
        register_metrics();
        register_metrics();
        record_claim("goerli", true);

        let output = gather_metrics();
        assert!(output.contains("faucet_claims_total"));
    }
}
