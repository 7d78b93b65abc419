//! Cache metrics for observability

use prometheus::{Counter, CounterVec, Opts};
use std::sync::OnceLock;

static METRICS: OnceLock<CacheMetricsInner> = OnceLock::new();

struct CacheMetricsInner {
    hits: Counter,
    misses: Counter,
    writes: Counter,
    invalidations: Counter,
    errors: CounterVec,
}

impl CacheMetricsInner {
    fn new() -> Self {
        Self {
            hits: Counter::new("tavola_cache_hits_total", "Total cache hits")
                .expect("valid metric definition"),
            misses: Counter::new("tavola_cache_misses_total", "Total cache misses")
                .expect("valid metric definition"),
            writes: Counter::new("tavola_cache_writes_total", "Total cache writes")
                .expect("valid metric definition"),
            invalidations: Counter::new(
                "tavola_cache_invalidated_keys_total",
                "Total cache keys removed by pattern invalidation",
            )
            .expect("valid metric definition"),
            errors: CounterVec::new(
                Opts::new("tavola_cache_errors_total", "Total cache errors"),
                &["operation"],
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self) {
        let registry = prometheus::default_registry();
        // AlreadyReg is fine when several caches share the process
        let _ = registry.register(Box::new(self.hits.clone()));
        let _ = registry.register(Box::new(self.misses.clone()));
        let _ = registry.register(Box::new(self.writes.clone()));
        let _ = registry.register(Box::new(self.invalidations.clone()));
        let _ = registry.register(Box::new(self.errors.clone()));
    }
}

fn get_metrics() -> &'static CacheMetricsInner {
    METRICS.get_or_init(|| {
        let metrics = CacheMetricsInner::new();
        metrics.register();
        metrics
    })
}

/// Handle over the process-wide cache counters
#[derive(Clone, Copy, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit(&self) {
        get_metrics().hits.inc();
    }

    pub fn record_miss(&self) {
        get_metrics().misses.inc();
    }

    pub fn record_write(&self) {
        get_metrics().writes.inc();
    }

    pub fn record_invalidation(&self, keys: usize) {
        get_metrics().invalidations.inc_by(keys as f64);
    }

    pub fn record_error(&self, operation: &str) {
        get_metrics().errors.with_label_values(&[operation]).inc();
    }
}
