//! Report sink contract
//!
//! The pipeline emits leak and performance reports through a pluggable
//! sink. The default sink logs through `tracing`; production deployments
//! substitute a remote sink behind the same trait.

use tracing::{info, warn};

use crate::telemetry::{LeakReport, LeakSeverity, PerformanceReport};

/// Destination for emitted reports.
pub trait ReportSink: Send + Sync {
    /// Receive one suspected-leak report.
    fn leak_report(&self, report: &LeakReport);

    /// Receive one composed performance report.
    fn performance_report(&self, report: &PerformanceReport);
}

/// Default sink: structured logging, with high-severity escalation.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn leak_report(&self, report: &LeakReport) {
        if report.severity == LeakSeverity::High {
            warn!(
                component = %report.component_id,
                leak_size = report.leak_size,
                severity = %report.severity,
                "suspected memory leak"
            );
        } else {
            info!(
                component = %report.component_id,
                leak_size = report.leak_size,
                severity = %report.severity,
                "suspected memory leak"
            );
        }
    }

    fn performance_report(&self, report: &PerformanceReport) {
        info!(
            components = report.total_components,
            slow = report.slow_components.len(),
            avg_render_ms = report.average_render_time_ms,
            leaks = report.suspected_leaks.len(),
            "performance report generated"
        );
    }
}
