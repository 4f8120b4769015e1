//! AjaxRPC Metrics Collection
//!
//! Call counting and latency tracking for the dispatcher. The snapshot is
//! what the `system.getMetrics` builtin returns.
//!
//! # Components
//!
//! - [`MetricsRegistry`]: Thread-safe storage with atomic counters and a
//!   logarithmic latency histogram per method
//! - [`MetricsCollector`]: Trait the dispatcher records calls through
//! - [`MetricsSnapshot`]: Serializable point-in-time view, convertible to a
//!   [`Value`](ajaxrpc_common::Value)
//!
//! # Usage Example
//!
//! ```rust
//! use ajaxrpc_metrics::{DispatchMetricsCollector, MetricsCollector};
//! use std::time::Instant;
//!
//! let collector = DispatchMetricsCollector::new();
//! let start = Instant::now();
//! collector.record_call("echo", start, true);
//!
//! let snapshot = collector.snapshot();
//! println!("Calls so far: {}", snapshot.calls);
//! ```

mod collector;
mod registry;
mod snapshot;

pub use collector::{DispatchMetricsCollector, MetricsCollector, NoopMetricsCollector};
pub use registry::{MetricsConfig, MetricsRegistry};
pub use snapshot::{MethodMetrics, MetricsSnapshot};
