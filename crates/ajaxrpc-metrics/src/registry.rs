use crate::snapshot::{MethodMetrics, MetricsSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Seven decades (1µs to 10s) with ten bins each, plus one overflow bin.
const DECADES: usize = 7;
const NUM_HISTOGRAM_BINS: usize = DECADES * 10 + 1;

/// Limits on what the registry keeps.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Maximum number of distinct method names tracked.
    ///
    /// Past this limit the least recently called method is evicted.
    pub max_methods: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { max_methods: 1000 }
    }
}

/// Logarithmic latency histogram.
///
/// Bin `d * 10 + k` holds samples in `[k * 10^d, (k + 1) * 10^d)` µs, so
/// resolution is one significant digit at every scale. Recording is a
/// single atomic increment.
#[derive(Debug)]
struct LatencyHistogram {
    bins: [AtomicU64; NUM_HISTOGRAM_BINS],
    latency_sum_us: AtomicU64,
    samples: AtomicU64,
}

impl LatencyHistogram {
    fn new() -> Self {
        Self {
            bins: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_sum_us: AtomicU64::new(0),
            samples: AtomicU64::new(0),
        }
    }

    fn record(&self, latency_us: u64) {
        self.bins[Self::bin_for(latency_us)].fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    fn bin_for(latency_us: u64) -> usize {
        if latency_us == 0 {
            return 0;
        }
        let decade = latency_us.ilog10() as usize;
        if decade >= DECADES {
            return NUM_HISTOGRAM_BINS - 1;
        }
        let leading = (latency_us / 10u64.pow(decade as u32)) as usize;
        decade * 10 + leading
    }

    /// Lower bound of a bin in microseconds.
    fn bin_floor(bin: usize) -> u64 {
        if bin >= NUM_HISTOGRAM_BINS - 1 {
            return 10u64.pow(DECADES as u32);
        }
        let decade = bin / 10;
        let leading = (bin % 10) as u64;
        leading * 10u64.pow(decade as u32)
    }

    /// Upper bound of a bin, which is the next populated bin's floor.
    fn bin_ceiling(bin: usize) -> u64 {
        let next = bin + 1;
        if next % 10 == 0 && next < NUM_HISTOGRAM_BINS - 1 {
            // skip the unused `k = 0` slot of the next decade
            return Self::bin_floor(next + 1);
        }
        Self::bin_floor(next).max(Self::bin_floor(bin) + 1)
    }

    /// Estimates the value at a percentile (0-100) by interpolating
    /// linearly inside the bin that contains it.
    fn percentile(&self, percentile: u64) -> u64 {
        let total = self.samples.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }

        let target = ((total * percentile) / 100).max(1);
        let mut cumulative = 0;

        for (index, bin) in self.bins.iter().enumerate() {
            let count = bin.load(Ordering::Relaxed);
            if count == 0 {
                continue;
            }
            if cumulative + count >= target {
                let start = Self::bin_floor(index);
                let end = Self::bin_ceiling(index);
                let fraction = (target - cumulative) as f64 / count as f64;
                return start + (fraction * (end - start) as f64) as u64;
            }
            cumulative += count;
        }

        Self::bin_floor(NUM_HISTOGRAM_BINS - 1)
    }

    /// Returns `(avg, p50, p95, p99)` in microseconds.
    fn summary(&self) -> (u64, u64, u64, u64) {
        let total = self.samples.load(Ordering::Relaxed);
        if total == 0 {
            return (0, 0, 0, 0);
        }
        let avg = self.latency_sum_us.load(Ordering::Relaxed) / total;
        (
            avg,
            self.percentile(50),
            self.percentile(95),
            self.percentile(99),
        )
    }
}

#[derive(Debug)]
struct MethodStats {
    calls: AtomicU64,
    results: AtomicU64,
    faults: AtomicU64,
    latencies: LatencyHistogram,
    /// Registry tick of the last call, for eviction order.
    last_call: AtomicU64,
}

impl MethodStats {
    fn new(tick: u64) -> Self {
        Self {
            calls: AtomicU64::new(0),
            results: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            latencies: LatencyHistogram::new(),
            last_call: AtomicU64::new(tick),
        }
    }

    fn record(&self, tick: u64, latency_us: u64, success: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if success {
            self.results.fetch_add(1, Ordering::Relaxed);
        } else {
            self.faults.fetch_add(1, Ordering::Relaxed);
        }
        self.latencies.record(latency_us);
        self.last_call.fetch_max(tick, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MethodMetrics {
        let (avg_latency_us, p50_latency_us, p95_latency_us, p99_latency_us) =
            self.latencies.summary();

        MethodMetrics {
            calls: self.calls.load(Ordering::Relaxed),
            results: self.results.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            avg_latency_us,
            p50_latency_us,
            p95_latency_us,
            p99_latency_us,
        }
    }
}

/// Thread-safe store of call statistics.
///
/// Counters are relaxed atomics; snapshots are eventually consistent. The
/// method map sits behind an `RwLock` that is held only to look up or
/// insert an entry.
///
/// # Example
///
/// ```rust
/// use ajaxrpc_metrics::MetricsRegistry;
///
/// let registry = MetricsRegistry::new();
/// registry.record_routed("sumintegers", 150, true);
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.calls, 1);
/// assert_eq!(snapshot.methods["sumintegers"].calls, 1);
/// ```
#[derive(Debug)]
pub struct MetricsRegistry {
    calls: AtomicU64,
    results: AtomicU64,
    faults: AtomicU64,
    methods: RwLock<HashMap<String, Arc<MethodStats>>>,
    created: Instant,
    config: MetricsConfig,
    tick: AtomicU64,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_config(MetricsConfig::default())
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            calls: AtomicU64::new(0),
            results: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            methods: RwLock::new(HashMap::new()),
            created: Instant::now(),
            config,
            tick: AtomicU64::new(0),
        }
    }

    fn record_totals(&self, success: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if success {
            self.results.fetch_add(1, Ordering::Relaxed);
        } else {
            self.faults.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records one call of a registered method.
    pub fn record_routed(&self, method: &str, latency_us: u64, success: bool) {
        self.record_totals(success);
        let tick = self.tick.fetch_add(1, Ordering::Relaxed) + 1;

        let existing = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
            .cloned();
        let stats = match existing {
            Some(stats) => stats,
            None => {
                let mut methods = self.methods.write().unwrap_or_else(PoisonError::into_inner);
                let stats = methods
                    .entry(method.to_string())
                    .or_insert_with(|| Arc::new(MethodStats::new(tick)))
                    .clone();
                Self::evict_over_limit(&mut methods, self.config.max_methods);
                stats
            }
        };

        stats.record(tick, latency_us, success);
    }

    /// Records a call that never reached a method, such as a malformed
    /// body or an unknown name. Only the global counters move.
    pub fn record_unrouted(&self) {
        self.record_totals(false);
    }

    fn evict_over_limit(methods: &mut HashMap<String, Arc<MethodStats>>, max_methods: usize) {
        if methods.len() <= max_methods {
            return;
        }
        let mut entries: Vec<_> = methods
            .iter()
            .map(|(name, stats)| (name.clone(), stats.last_call.load(Ordering::Relaxed)))
            .collect();
        entries.sort_by_key(|&(_, last_call)| last_call);

        let to_remove = entries.len() - max_methods;
        for (name, _) in entries.into_iter().take(to_remove) {
            methods.remove(&name);
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        self.created.elapsed().as_millis() as u64
    }

    /// Takes a snapshot with methods sorted by name.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::new(self.uptime_ms());
        snapshot.calls = self.calls.load(Ordering::Relaxed);
        snapshot.results = self.results.load(Ordering::Relaxed);
        snapshot.faults = self.faults.load(Ordering::Relaxed);

        let methods = self.methods.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = methods.keys().collect();
        names.sort();
        for name in names {
            snapshot
                .methods
                .insert(name.clone(), methods[name].snapshot());
        }

        snapshot
    }
}
