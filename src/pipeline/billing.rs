use serde::Serialize;
use tracing::{info, warn};

use crate::ai::MetricsSummary;
use crate::images::BatchStats;
use crate::quality::{QualityResult, get_quality_summary};

/// Counts reported to the billing collaborator alongside the charge decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub images_generated: u32,
    pub images_cached: u32,
    pub images_failed: u32,
}

impl GenerationUsage {
    pub fn from_run(summary: &MetricsSummary, images: &BatchStats) -> Self {
        Self {
            input_tokens: summary.input_tokens,
            output_tokens: summary.output_tokens,
            images_generated: images.generated,
            images_cached: images.cached,
            images_failed: images.failed,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Receives the final charge decision. Persistence and credits live behind it.
pub trait BillingReporter: Send + Sync {
    fn report(&self, quality: &QualityResult, usage: &GenerationUsage);
}

/// Logs the decision; the default when no billing backend is wired in
#[derive(Debug, Default)]
pub struct LogBillingReporter;

impl BillingReporter for LogBillingReporter {
    fn report(&self, quality: &QualityResult, usage: &GenerationUsage) {
        if quality.should_charge {
            info!(
                tokens = usage.total_tokens(),
                images = usage.images_generated,
                "Charge: {}",
                get_quality_summary(quality)
            );
        } else {
            warn!(
                tokens = usage.total_tokens(),
                images = usage.images_generated,
                "Refund: {}",
                get_quality_summary(quality)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MetricsCollector;
    use crate::ai::TokenUsage;

    #[test]
    fn test_usage_from_run() {
        let metrics = MetricsCollector::new("run");
        metrics.record_tokens(&TokenUsage::new(100, 250), 10);
        metrics.record_tokens(&TokenUsage::new(50, 50), 10);
        let stats = BatchStats {
            generated: 2,
            cached: 1,
            failed: 1,
        };

        let usage = GenerationUsage::from_run(&metrics.summary(), &stats);
        assert_eq!(usage.input_tokens, 150);
        assert_eq!(usage.output_tokens, 300);
        assert_eq!(usage.total_tokens(), 450);
        assert_eq!(usage.images_generated, 2);
        assert_eq!(usage.images_failed, 1);
    }
}
