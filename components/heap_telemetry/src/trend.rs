//! Heap-growth trend analysis and leak flagging

use perf_types::{now_ms, LeakReport, LeakSeverity, ReportSink};
use render_profiler::ProfileStore;
use std::sync::Arc;
use tracing::debug;

use crate::sampler::TelemetrySampler;

/// Default memory-delta threshold above which a closed profile is
/// suspicious: 10 MiB.
pub const DEFAULT_LEAK_THRESHOLD: i64 = 10 * 1024 * 1024;

/// Default number of samples in the trend window.
pub const DEFAULT_TREND_WINDOW: usize = 10;

/// Correlates global heap growth with per-component memory deltas.
///
/// Heuristic by design: a rising global heap trend correlates with, but
/// does not prove, any individual component's leak. A component that
/// happens to unmount with a large delta while something else grows the
/// heap will be flagged too; the severity bands and the report wording
/// keep this an investigation lead, not a verdict.
pub struct LeakTrendAnalyzer {
    sampler: Arc<TelemetrySampler>,
    store: Arc<ProfileStore>,
    sink: Arc<dyn ReportSink>,
    threshold: i64,
    window: usize,
}

impl LeakTrendAnalyzer {
    /// Create an analyzer with the default threshold and window.
    pub fn new(
        sampler: Arc<TelemetrySampler>,
        store: Arc<ProfileStore>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self::with_threshold(sampler, store, sink, DEFAULT_LEAK_THRESHOLD, DEFAULT_TREND_WINDOW)
    }

    /// Create an analyzer with a custom threshold (bytes) and window.
    pub fn with_threshold(
        sampler: Arc<TelemetrySampler>,
        store: Arc<ProfileStore>,
        sink: Arc<dyn ReportSink>,
        threshold: i64,
        window: usize,
    ) -> Self {
        Self {
            sampler,
            store,
            sink,
            threshold: threshold.max(1),
            window: window.max(2),
        }
    }

    /// Configured memory-delta threshold in bytes.
    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Run one analysis pass; returns the number of reports emitted.
    ///
    /// Needs at least `window` samples. The trend is the used-heap
    /// difference across the most recent window; when it exceeds
    /// `threshold / 10` the store is scanned and every closed,
    /// not-yet-flagged profile with a delta above the threshold is flagged
    /// once and reported through the sink.
    pub fn evaluate(&self) -> usize {
        let samples = self.sampler.samples();
        if samples.len() < self.window {
            return 0;
        }

        let recent = &samples[samples.len() - self.window..];
        let trend =
            recent[recent.len() - 1].used_heap as i64 - recent[0].used_heap as i64;
        if trend <= self.threshold / 10 {
            return 0;
        }
        debug!(trend_bytes = trend, "heap growth trend detected");

        let mut emitted = 0;
        for profile in self.store.all() {
            if !profile.is_closed() || profile.is_leak {
                continue;
            }
            let Some(delta) = profile.memory_delta else {
                continue;
            };
            if delta <= self.threshold {
                continue;
            }

            let severity = LeakSeverity::classify(delta, self.threshold);
            if !self.store.mark_leak(&profile.component_id, severity) {
                continue;
            }
            let report = LeakReport {
                component_id: profile.component_id.clone(),
                leak_size: delta,
                severity,
                timestamp_ms: now_ms(),
                recommendations: Self::recommendations(),
            };
            self.sink.leak_report(&report);
            emitted += 1;
        }
        emitted
    }

    /// Fixed remediation checklist attached to every leak report.
    pub fn recommendations() -> Vec<String> {
        vec![
            "Remove event listeners and subscriptions in the unmount path".to_string(),
            "Clear intervals, timeouts and pending requests on teardown".to_string(),
            "Check for caches or closures retaining references to unmounted state".to_string(),
        ]
    }
}
