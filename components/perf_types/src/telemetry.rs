//! Heap telemetry and lifecycle profiling types

use serde::{Deserialize, Serialize};

use crate::render::Recommendation;

/// One point-in-time measurement of managed-heap usage.
///
/// Samples live in a bounded FIFO ring buffer; the oldest sample is
/// evicted first once the buffer reaches its configured capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    /// Used heap size in bytes
    pub used_heap: u64,
    /// Total allocated heap size in bytes
    pub total_heap: u64,
    /// Upper heap limit reported by the host in bytes
    pub heap_limit: u64,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp_ms: f64,
}

/// Raw heap figures as read from the host capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Used heap size in bytes
    pub used: u64,
    /// Total allocated heap size in bytes
    pub total: u64,
    /// Upper heap limit in bytes
    pub limit: u64,
}

/// Read-side seam for "the latest heap sample".
///
/// The lifecycle profiler reads mount/unmount memory through this trait so
/// it does not depend on the sampler crate directly.
pub trait HeapUsageProbe: Send + Sync {
    /// Used-heap figure of the most recent sample, if any exists.
    fn latest_used_heap(&self) -> Option<u64>;
}

/// Suspected-leak severity, ordered relative to the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakSeverity {
    /// Delta just above the threshold
    Low,
    /// Delta above 1.5x the threshold
    Medium,
    /// Delta above 3x the threshold
    High,
}

impl LeakSeverity {
    /// Classify a closed profile's memory delta against a threshold.
    ///
    /// Bands: `> 3x threshold` is high, `> 1.5x threshold` is medium,
    /// everything else above the threshold is low.
    pub fn classify(delta: i64, threshold: i64) -> Self {
        if delta > threshold.saturating_mul(3) {
            Self::High
        } else if delta as f64 > threshold as f64 * 1.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for LeakSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Per-logical-component mount/unmount memory profile.
///
/// Keyed by logical component id. A remount under the same id before the
/// previous profile closes overwrites it (last-mount-wins); see the
/// lifecycle profiler for the rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProfile {
    /// Logical component identifier
    pub component_id: String,
    /// Mount time in milliseconds since the Unix epoch
    pub mount_time_ms: f64,
    /// Unmount time, set once the profile closes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmount_time_ms: Option<f64>,
    /// Used heap at mount time in bytes
    pub initial_memory: u64,
    /// Used heap at unmount time in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_memory: Option<u64>,
    /// `final_memory - initial_memory`, computed only on unmount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_delta: Option<i64>,
    /// Whether the trend analyzer flagged this profile as a suspected leak
    pub is_leak: bool,
    /// Severity assigned when flagged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<LeakSeverity>,
}

impl ComponentProfile {
    /// Open a new profile at mount time.
    pub fn open(component_id: impl Into<String>, initial_memory: u64, mount_time_ms: f64) -> Self {
        Self {
            component_id: component_id.into(),
            mount_time_ms,
            unmount_time_ms: None,
            initial_memory,
            final_memory: None,
            memory_delta: None,
            is_leak: false,
            severity: None,
        }
    }

    /// Whether the profile has been closed by an unmount event.
    pub fn is_closed(&self) -> bool {
        self.unmount_time_ms.is_some()
    }
}

/// A suspected-leak report emitted through the report sink.
///
/// Reports are emitted, not stored; retained leak evidence lives on the
/// flagged [`ComponentProfile`] itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakReport {
    /// Logical component identifier
    pub component_id: String,
    /// Memory delta of the flagged mount/unmount cycle in bytes
    pub leak_size: i64,
    /// Assigned severity
    pub severity: LeakSeverity,
    /// Emission time in milliseconds since the Unix epoch
    pub timestamp_ms: f64,
    /// Remediation hints for the flagged component
    pub recommendations: Vec<String>,
}

/// Composed performance report: render aggregation plus suspected leaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// Generation time in milliseconds since the Unix epoch
    pub generated_at_ms: f64,
    /// Mean render duration across all recorded renders, in milliseconds
    pub average_render_time_ms: f64,
    /// Number of components with at least one recorded render
    pub total_components: usize,
    /// Components whose last render exceeded the frame budget
    pub slow_components: Vec<String>,
    /// Ranked optimization recommendations, high impact first
    pub recommendations: Vec<Recommendation>,
    /// Profiles currently flagged as suspected leaks
    pub suspected_leaks: Vec<LeakReport>,
}

/// State machine of one resilient module-load task.
///
/// `Idle -> Loading(attempt) -> { Loaded | Failed(attempts) }`; a failed
/// task re-enters `Loading(1)` only through an explicit retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum ModuleLoadState {
    /// No load has been requested yet
    Idle,
    /// An import attempt is in flight
    Loading {
        /// Current attempt number, starting at 1
        attempt: u32,
    },
    /// The import resolved
    Loaded,
    /// All attempts were exhausted
    Failed {
        /// Number of attempts made before giving up
        attempts: u32,
    },
}
