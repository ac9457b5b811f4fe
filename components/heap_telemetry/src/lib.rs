//! Periodic heap sampling and leak trend analysis
//!
//! The [`TelemetrySampler`] captures heap usage into a bounded ring buffer
//! on a timer; the [`LeakTrendAnalyzer`] runs after each tick, correlating
//! global heap growth with closed component profiles and emitting
//! suspected-leak reports through the pluggable sink.

mod capability;
mod sampler;
mod trend;

pub use capability::{HeapCapability, HeapStatsSource};
pub use sampler::TelemetrySampler;
pub use trend::{LeakTrendAnalyzer, DEFAULT_LEAK_THRESHOLD, DEFAULT_TREND_WINDOW};
