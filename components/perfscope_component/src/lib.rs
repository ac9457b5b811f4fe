//! Performance pipeline orchestration and integration
//!
//! This crate wires the heap telemetry sampler, the component lifecycle
//! profiler, the leak trend analyzer and the render aggregator into one
//! [`PerfScopeComponent`] with a single start/stop lifecycle and a
//! combined report surface.
//!
//! # Example
//!
//! ```no_run
//! use perfscope_component::{PerfScopeComponent, PerfScopeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PerfScopeConfig::builder()
//!         .sample_interval_ms(10_000)
//!         .leak_threshold_bytes(10 * 1024 * 1024)
//!         .build();
//!
//!     let pipeline = PerfScopeComponent::new(config, None)?;
//!     pipeline.start().await?;
//!
//!     pipeline.component_mounted("orders-grid");
//!     // ... host renders ...
//!     pipeline.component_unmounted("orders-grid");
//!
//!     let report = pipeline.generate_report();
//!     println!("avg render {:.1}ms", report.average_render_time_ms);
//!
//!     pipeline.stop().await?;
//!     Ok(())
//! }
//! ```

mod component;
mod config;
mod error;

pub use component::PerfScopeComponent;
pub use config::{PerfScopeConfig, PerfScopeConfigBuilder};
pub use error::{PerfScopeError, Result};

pub use heap_telemetry::HeapStatsSource;
pub use perf_types::{
    BundleAnalysis, ComponentProfile, LeakReport, LeakSeverity, MemorySample, PerformanceReport,
    RenderEvent, RenderPhase, ReportSink,
};
pub use render_profiler::LifecycleEvent;
