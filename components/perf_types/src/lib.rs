//! Shared type definitions for the PerfScope observability pipeline
//!
//! Contains the data model consumed by the heap telemetry sampler, the
//! component lifecycle profiler, the render aggregator, the module loader,
//! and the bundle analyzer, plus the error taxonomy and report sink contract.

mod bundle;
mod errors;
mod render;
mod sink;
mod telemetry;

pub use bundle::{
    AssetInfo, BundleAnalysis, BundleChunk, BundleSummary, ModuleInfo, OptimizationKind,
    OptimizationOpportunity,
};
pub use errors::TelemetryError;
pub use render::{
    Impact, InteractionStats, Recommendation, RecommendationKind, RenderAggregate, RenderEvent,
    RenderPhase,
};
pub use sink::{LogSink, ReportSink};
pub use telemetry::{
    ComponentProfile, HeapStats, HeapUsageProbe, LeakReport, LeakSeverity, MemorySample,
    ModuleLoadState, PerformanceReport,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// All pipeline timestamps share this clock so samples, profiles, and
/// reports can be correlated.
pub fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
