//! Heap-introspection capability
//!
//! The host may or may not expose heap figures. Availability is resolved
//! once at sampler construction into an explicit variant; the pipeline
//! never re-probes at runtime and fully no-ops when unsupported.

use perf_types::HeapStats;
use std::sync::Arc;

/// Host seam exposing used/total/limit heap figures.
pub trait HeapStatsSource: Send + Sync {
    /// Read the current heap figures.
    fn read(&self) -> HeapStats;
}

/// Resolved heap-introspection capability.
#[derive(Clone)]
pub enum HeapCapability {
    /// The host provided a working stats source
    Supported(Arc<dyn HeapStatsSource>),
    /// No heap introspection; every sampling operation is a no-op
    Unsupported,
}

impl HeapCapability {
    /// Resolve the capability from an optional host source.
    pub fn detect(source: Option<Arc<dyn HeapStatsSource>>) -> Self {
        match source {
            Some(source) => Self::Supported(source),
            None => Self::Unsupported,
        }
    }

    /// Whether heap figures can be read.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    /// Read the current heap figures, if supported.
    pub fn read(&self) -> Option<HeapStats> {
        match self {
            Self::Supported(source) => Some(source.read()),
            Self::Unsupported => None,
        }
    }
}

impl std::fmt::Debug for HeapCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supported(_) => write!(f, "HeapCapability::Supported"),
            Self::Unsupported => write!(f, "HeapCapability::Unsupported"),
        }
    }
}
