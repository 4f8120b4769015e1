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

use ajaxrpc_common::{IntoValue, StructFields, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metrics for a specific method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetrics {
    pub calls: u64,
    pub results: u64,
    pub faults: u64,
    pub avg_latency_us: u64,
    pub p50_latency_us: u64,
    pub p95_latency_us: u64,
    pub p99_latency_us: u64,
}

impl MethodMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Complete metrics snapshot
///
/// Methods appear in name order so two snapshots of the same state compare
/// equal field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub calls: u64,
    pub results: u64,
    pub faults: u64,
    pub uptime_ms: u64,
    pub methods: IndexMap<String, MethodMetrics>,
}

impl MetricsSnapshot {
    pub fn new(uptime_ms: u64) -> Self {
        Self {
            uptime_ms,
            ..Self::default()
        }
    }
}

// Counters travel as `int`; u64 values past i64::MAX saturate.
fn counter(value: u64) -> Value {
    Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
}

impl IntoValue for MethodMetrics {
    fn into_value(self) -> Value {
        let mut fields = StructFields::new();
        fields.insert("calls".into(), counter(self.calls));
        fields.insert("results".into(), counter(self.results));
        fields.insert("faults".into(), counter(self.faults));
        fields.insert("avg_latency_us".into(), counter(self.avg_latency_us));
        fields.insert("p50_latency_us".into(), counter(self.p50_latency_us));
        fields.insert("p95_latency_us".into(), counter(self.p95_latency_us));
        fields.insert("p99_latency_us".into(), counter(self.p99_latency_us));
        Value::Struct(fields)
    }
}

impl IntoValue for MetricsSnapshot {
    fn into_value(self) -> Value {
        let mut fields = StructFields::new();
        fields.insert("calls".into(), counter(self.calls));
        fields.insert("results".into(), counter(self.results));
        fields.insert("faults".into(), counter(self.faults));
        fields.insert("uptime_ms".into(), counter(self.uptime_ms));
        fields.insert("methods".into(), self.methods.into_value());
        Value::Struct(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_into_value() {
        let mut snapshot = MetricsSnapshot::new(1500);
        snapshot.calls = 3;
        snapshot.methods.insert(
            "echo".into(),
            MethodMetrics {
                calls: 3,
                results: 2,
                faults: 1,
                ..MethodMetrics::new()
            },
        );

        let value = snapshot.into_value();
        assert_eq!(value.field("calls"), Some(&Value::Int(3)));
        assert_eq!(value.field("uptime_ms"), Some(&Value::Int(1500)));
        let echo = value.field("methods").and_then(|m| m.field("echo")).unwrap();
        assert_eq!(echo.field("faults"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_counter_saturates() {
        assert_eq!(counter(u64::MAX), Value::Int(i64::MAX));
    }
}
