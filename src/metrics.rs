// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Webhook --------
pub static WEBHOOKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "webhook_requests_total",
            "webhook requests by action & outcome (ok | rejected | failed)",
        ),
        &["action", "outcome"],
    )
    .unwrap()
});

// -------- Exchange --------
pub static EXCHANGE_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("exchange_calls_total", "exchange REST calls by op & outcome"),
        &["op", "outcome"],
    )
    .unwrap()
});

pub static EXCHANGE_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("exchange_call_latency_ms", "Latency of one exchange call (ms)")
            .buckets(vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]),
    )
    .unwrap()
});

// ---- Config visibility ----
pub static CONFIG_TESTNET: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("config_testnet", "1 if trading against Bybit testnet").unwrap());

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(WEBHOOKS.clone())),
        REGISTRY.register(Box::new(EXCHANGE_CALLS.clone())),
        REGISTRY.register(Box::new(EXCHANGE_LATENCY_MS.clone())),
        REGISTRY.register(Box::new(CONFIG_TESTNET.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}
