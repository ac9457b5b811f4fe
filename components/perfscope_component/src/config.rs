//! Configuration for the pipeline context

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the observability pipeline.
///
/// Holds the sampling cadence, buffer bounds, leak heuristics and
/// retention policy shared by the wired components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfScopeConfig {
    /// Heap sampling interval in milliseconds
    sample_interval_ms: u64,

    /// Ring-buffer capacity for heap samples
    max_samples: usize,

    /// Memory-delta threshold in bytes above which a profile is suspicious
    leak_threshold_bytes: i64,

    /// Number of samples in the trend window
    trend_window: usize,

    /// Retention window in milliseconds for closed, unflagged profiles
    retention_ms: u64,

    /// Budget in milliseconds above which an average render is slow
    slow_render_budget_ms: f64,
}

impl PerfScopeConfig {
    /// Create a new builder for PerfScopeConfig
    ///
    /// # Example
    ///
    /// ```
    /// use perfscope_component::PerfScopeConfig;
    ///
    /// let config = PerfScopeConfig::builder()
    ///     .sample_interval_ms(5_000)
    ///     .leak_threshold_bytes(5 * 1024 * 1024)
    ///     .build();
    /// ```
    pub fn builder() -> PerfScopeConfigBuilder {
        PerfScopeConfigBuilder::default()
    }

    /// Get the sampling interval
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Get the sample ring-buffer capacity
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Get the leak threshold in bytes
    pub fn leak_threshold_bytes(&self) -> i64 {
        self.leak_threshold_bytes
    }

    /// Get the trend window length in samples
    pub fn trend_window(&self) -> usize {
        self.trend_window
    }

    /// Get the profile retention window
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }

    /// Get the slow-render budget in milliseconds
    pub fn slow_render_budget_ms(&self) -> f64 {
        self.slow_render_budget_ms
    }
}

impl Default for PerfScopeConfig {
    /// Default values:
    /// - sample_interval_ms: 10 s
    /// - max_samples: 100
    /// - leak_threshold_bytes: 10 MiB
    /// - trend_window: 10
    /// - retention_ms: 60 s
    /// - slow_render_budget_ms: 16.0 (one 60fps frame)
    fn default() -> Self {
        Self {
            sample_interval_ms: 10_000,
            max_samples: 100,
            leak_threshold_bytes: 10 * 1024 * 1024,
            trend_window: 10,
            retention_ms: 60_000,
            slow_render_budget_ms: 16.0,
        }
    }
}

/// Builder for PerfScopeConfig
#[derive(Debug, Clone, Default)]
pub struct PerfScopeConfigBuilder {
    sample_interval_ms: Option<u64>,
    max_samples: Option<usize>,
    leak_threshold_bytes: Option<i64>,
    trend_window: Option<usize>,
    retention_ms: Option<u64>,
    slow_render_budget_ms: Option<f64>,
}

impl PerfScopeConfigBuilder {
    /// Set the sampling interval in milliseconds
    pub fn sample_interval_ms(mut self, interval_ms: u64) -> Self {
        self.sample_interval_ms = Some(interval_ms);
        self
    }

    /// Set the sample ring-buffer capacity
    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = Some(max_samples);
        self
    }

    /// Set the leak threshold in bytes
    pub fn leak_threshold_bytes(mut self, threshold: i64) -> Self {
        self.leak_threshold_bytes = Some(threshold);
        self
    }

    /// Set the trend window length in samples
    pub fn trend_window(mut self, window: usize) -> Self {
        self.trend_window = Some(window);
        self
    }

    /// Set the profile retention window in milliseconds
    pub fn retention_ms(mut self, retention_ms: u64) -> Self {
        self.retention_ms = Some(retention_ms);
        self
    }

    /// Set the slow-render budget in milliseconds
    pub fn slow_render_budget_ms(mut self, budget_ms: f64) -> Self {
        self.slow_render_budget_ms = Some(budget_ms);
        self
    }

    /// Build the PerfScopeConfig
    ///
    /// Uses default values for any options not explicitly set.
    pub fn build(self) -> PerfScopeConfig {
        let default = PerfScopeConfig::default();
        PerfScopeConfig {
            sample_interval_ms: self.sample_interval_ms.unwrap_or(default.sample_interval_ms),
            max_samples: self.max_samples.unwrap_or(default.max_samples),
            leak_threshold_bytes: self
                .leak_threshold_bytes
                .unwrap_or(default.leak_threshold_bytes),
            trend_window: self.trend_window.unwrap_or(default.trend_window),
            retention_ms: self.retention_ms.unwrap_or(default.retention_ms),
            slow_render_budget_ms: self
                .slow_render_budget_ms
                .unwrap_or(default.slow_render_budget_ms),
        }
    }
}
