//! Pipeline Metrics Collection
//!
//! Aggregates model usage, image outcomes, and per-phase timings across one
//! generation run. Thread-safe so concurrent stages can record into it.
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = MetricsCollector::new("run-123");
//! metrics.record_response(&response);
//! metrics.record_image_generated();
//! let summary = metrics.summary();
//! ```

use crate::ai::provider::{LlmResponse, TokenUsage};
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

// =============================================================================
// Metrics Collector
// =============================================================================

/// Thread-safe metrics collector for one generation run.
///
/// Counters are atomics; the phase list sits behind an RwLock.
pub struct MetricsCollector {
    run_id: String,
    start_time: Instant,
    api_calls: AtomicU32,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    total_latency_ms: AtomicU64,
    images_generated: AtomicU32,
    images_cached: AtomicU32,
    images_failed: AtomicU32,
    phases: RwLock<Vec<PhaseMetrics>>,
}

/// Wall-clock duration of a pipeline phase
#[derive(Debug, Clone)]
pub struct PhaseMetrics {
    pub name: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub run_id: String,
    pub total_duration_ms: u64,
    pub api_calls: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub avg_latency_ms: f64,
    pub images_generated: u32,
    pub images_cached: u32,
    pub images_failed: u32,
    pub phases: Vec<PhaseMetrics>,
}

impl MetricsCollector {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            start_time: Instant::now(),
            api_calls: AtomicU32::new(0),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            images_generated: AtomicU32::new(0),
            images_cached: AtomicU32::new(0),
            images_failed: AtomicU32::new(0),
            phases: RwLock::new(Vec::new()),
        }
    }

    /// Record usage and latency from a model response
    pub fn record_response(&self, response: &LlmResponse) {
        self.record_tokens(&response.usage, response.timing.total_ms);
    }

    pub fn record_tokens(&self, usage: &TokenUsage, latency_ms: u64) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.input_tokens
            .fetch_add(usage.input_tokens as u64, Ordering::Relaxed);
        self.output_tokens
            .fetch_add(usage.output_tokens as u64, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_images(&self, generated: u32, cached: u32, failed: u32) {
        self.images_generated.fetch_add(generated, Ordering::Relaxed);
        self.images_cached.fetch_add(cached, Ordering::Relaxed);
        self.images_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn record_phase(&self, name: impl Into<String>, duration: Duration) {
        let mut phases = self.phases.write().unwrap_or_else(|poisoned| {
            tracing::error!("Metrics phases RwLock poisoned, recovering");
            poisoned.into_inner()
        });
        phases.push(PhaseMetrics {
            name: name.into(),
            duration_ms: duration.as_millis() as u64,
        });
    }

    /// Current metrics snapshot
    pub fn summary(&self) -> MetricsSummary {
        let api_calls = self.api_calls.load(Ordering::Relaxed);
        let input_tokens = self.input_tokens.load(Ordering::Relaxed);
        let output_tokens = self.output_tokens.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let avg_latency = if api_calls > 0 {
            total_latency as f64 / api_calls as f64
        } else {
            0.0
        };

        let phases = self
            .phases
            .read()
            .unwrap_or_else(|poisoned| {
                tracing::error!("Metrics phases RwLock poisoned on read, recovering");
                poisoned.into_inner()
            })
            .clone();

        MetricsSummary {
            run_id: self.run_id.clone(),
            total_duration_ms: self.start_time.elapsed().as_millis() as u64,
            api_calls,
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            avg_latency_ms: avg_latency,
            images_generated: self.images_generated.load(Ordering::Relaxed),
            images_cached: self.images_cached.load(Ordering::Relaxed),
            images_failed: self.images_failed.load(Ordering::Relaxed),
            phases,
        }
    }
}

impl MetricsSummary {
    /// Format summary for display
    pub fn display(&self) -> String {
        let mut out = format!(
            "Run: {}\n\
             Duration: {:.1}s\n\
             API Calls: {}\n\
             Tokens: {} (input: {}, output: {})\n\
             Avg Latency: {:.0}ms\n\
             Images: {} generated, {} cached, {} failed",
            self.run_id,
            self.total_duration_ms as f64 / 1000.0,
            self.api_calls,
            self.total_tokens,
            self.input_tokens,
            self.output_tokens,
            self.avg_latency_ms,
            self.images_generated,
            self.images_cached,
            self.images_failed,
        );
        for phase in &self.phases {
            out.push_str(&format!("\n  {}: {}ms", phase.name, phase.duration_ms));
        }
        out
    }
}

/// Shared metrics collector for pipeline stages
pub type SharedMetrics = Arc<MetricsCollector>;

pub fn create_shared_metrics(run_id: impl Into<String>) -> SharedMetrics {
    Arc::new(MetricsCollector::new(run_id))
}
