//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Store Metrics
    pub static ref STORE_OPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("snapgrid_store_ops_total", "Total number of entity store operations"),
        &["operation", "collection"]
    ).expect("metric can be created");
    pub static ref STORE_OP_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "snapgrid_store_op_duration_seconds",
            "Entity store operation duration in seconds, simulated latency included"
        ).buckets(vec![0.001, 0.01, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 1.0, 2.5]),
        &["operation", "collection"]
    ).expect("metric can be created");
    pub static ref STORE_SEEDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("snapgrid_store_seeds_total", "Total number of first-run collection seeds"),
        &["collection", "source"]
    ).expect("metric can be created");
    pub static ref RECORDS_TOTAL: IntGaugeVec = IntGaugeVec::new(
        Opts::new("snapgrid_records_total", "Current number of records per collection"),
        &["collection"]
    ).expect("metric can be created");

    // Playback Metrics
    pub static ref PLAYBACK_TRANSITIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("snapgrid_playback_transitions_total", "Total number of playback transitions"),
        &["transition"]
    ).expect("metric can be created");
    pub static ref STORY_VIEWS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("snapgrid_story_views_total", "Total number of story view marks dispatched"),
        &["status"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("snapgrid_errors_total", "Total number of errors"),
        &["error_type", "operation"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(STORE_OPS_TOTAL.clone()))
        .expect("STORE_OPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STORE_OP_DURATION_SECONDS.clone()))
        .expect("STORE_OP_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(STORE_SEEDS_TOTAL.clone()))
        .expect("STORE_SEEDS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(RECORDS_TOTAL.clone()))
        .expect("RECORDS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(PLAYBACK_TRANSITIONS_TOTAL.clone()))
        .expect("PLAYBACK_TRANSITIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STORY_VIEWS_TOTAL.clone()))
        .expect("STORY_VIEWS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
