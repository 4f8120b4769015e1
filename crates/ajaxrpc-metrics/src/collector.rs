// Copyright 2025 AjaxRPC Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::registry::{MetricsConfig, MetricsRegistry};
use crate::snapshot::MetricsSnapshot;
use std::sync::Arc;
use std::time::Instant;

/// Sink for per-call statistics.
///
/// The dispatcher calls [`record_call`](MetricsCollector::record_call) once
/// for every call that resolved to a method, and
/// [`record_unrouted`](MetricsCollector::record_unrouted) for calls that
/// faulted before resolution.
///
/// # Example
///
/// ```rust
/// use ajaxrpc_metrics::{DispatchMetricsCollector, MetricsCollector};
/// use std::time::Instant;
///
/// let collector = DispatchMetricsCollector::new();
///
/// let start = Instant::now();
/// // ... run the handler ...
/// collector.record_call("sumintegers", start, true);
///
/// assert_eq!(collector.snapshot().calls, 1);
/// ```
pub trait MetricsCollector: Send + Sync {
    /// Records a finished call of `method` that began at `started`.
    fn record_call(&self, method: &str, started: Instant, success: bool);

    /// Records a call that faulted before a method was resolved.
    fn record_unrouted(&self);

    /// Takes a snapshot of the current metrics state.
    fn snapshot(&self) -> MetricsSnapshot;
}

/// Metrics collector used by the dispatcher.
pub struct DispatchMetricsCollector {
    registry: Arc<MetricsRegistry>,
}

impl Default for DispatchMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchMetricsCollector {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            registry: Arc::new(MetricsRegistry::with_config(config)),
        }
    }

    /// Shares an existing registry, e.g. between several dispatchers.
    pub fn with_registry(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }
}

impl MetricsCollector for DispatchMetricsCollector {
    fn record_call(&self, method: &str, started: Instant, success: bool) {
        let latency_us = started.elapsed().as_micros() as u64;
        self.registry.record_routed(method, latency_us, success);
    }

    fn record_unrouted(&self) {
        self.registry.record_unrouted();
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.registry.snapshot()
    }
}

/// Collector that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsCollector;

impl MetricsCollector for NoopMetricsCollector {
    fn record_call(&self, _method: &str, _started: Instant, _success: bool) {}

    fn record_unrouted(&self) {}

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}
