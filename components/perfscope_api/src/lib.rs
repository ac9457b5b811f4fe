//! Public API for the PerfScope performance pipeline
//!
//! This module provides a simple, ergonomic API for embedding the
//! performance pipeline into a host application. It wraps the lower-level
//! `perfscope_component` with a clean public interface.
//!
//! # Example
//!
//! ```no_run
//! use perfscope_api::{PerfScope, PerfScopeConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PerfScopeConfig::default();
//!     let perfscope = PerfScope::new(config)?;
//!
//!     perfscope.start().await?;
//!
//!     perfscope.record_mount("orders-grid").await;
//!     // ... host renders ...
//!     perfscope.record_unmount("orders-grid").await;
//!
//!     let report = perfscope.generate_report().await?;
//!     println!("avg render {:.1}ms", report.average_render_time_ms);
//!
//!     perfscope.stop().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

use std::sync::Arc;
use tokio::sync::RwLock;

// Re-export public types from perfscope_component
pub use perfscope_component::{
    ComponentProfile, HeapStatsSource, LeakReport, LeakSeverity, LifecycleEvent, MemorySample,
    PerfScopeConfig, PerfScopeError, PerformanceReport, RenderEvent, RenderPhase, ReportSink,
    Result,
};

use perfscope_component::PerfScopeComponent;

/// Main PerfScope public API
///
/// This is the primary interface for working with the performance
/// pipeline. It provides a simplified wrapper around the underlying
/// PerfScopeComponent. The component is created lazily on the first
/// `start` and survives `stop`, so collected diagnostics can still be
/// read after sampling ends.
pub struct PerfScope {
    component: Arc<RwLock<Option<Arc<PerfScopeComponent>>>>,
    base_config: PerfScopeConfig,
    heap_source: Option<Arc<dyn HeapStatsSource>>,
    sink: Option<Arc<dyn ReportSink>>,
}

impl PerfScope {
    /// Create a new PerfScope instance with the given configuration
    ///
    /// Without a heap source the memory features degrade to no-ops and
    /// render profiling still works.
    ///
    /// # Example
    ///
    /// ```
    /// use perfscope_api::{PerfScope, PerfScopeConfig};
    ///
    /// let config = PerfScopeConfig::default();
    /// let perfscope = PerfScope::new(config).unwrap();
    /// ```
    pub fn new(config: PerfScopeConfig) -> Result<Self> {
        Ok(Self {
            component: Arc::new(RwLock::new(None)),
            base_config: config,
            heap_source: None,
            sink: None,
        })
    }

    /// Set the host's heap statistics hook
    pub fn with_heap_source(mut self, source: Arc<dyn HeapStatsSource>) -> Self {
        self.heap_source = Some(source);
        self
    }

    /// Set a custom report sink in place of tracing-based logging
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Start heap sampling and leak analysis
    ///
    /// Creates the pipeline on first use; later calls restart the same
    /// pipeline with its collected state intact.
    ///
    /// # Errors
    ///
    /// Returns [`PerfScopeError::AlreadyRunning`] when sampling is already
    /// active, or [`PerfScopeError::InvalidConfiguration`] when the
    /// configuration cannot produce a working pipeline.
    pub async fn start(&self) -> Result<()> {
        let mut component_lock = self.component.write().await;

        let component = match component_lock.as_ref() {
            Some(component) => Arc::clone(component),
            None => {
                let component = match &self.sink {
                    Some(sink) => PerfScopeComponent::with_sink(
                        self.base_config.clone(),
                        self.heap_source.clone(),
                        Arc::clone(sink),
                    )?,
                    None => {
                        PerfScopeComponent::new(self.base_config.clone(), self.heap_source.clone())?
                    }
                };
                let component = Arc::new(component);
                *component_lock = Some(Arc::clone(&component));
                component
            }
        };

        component.start().await
    }

    /// Stop heap sampling. Idempotent; collected diagnostics remain
    /// readable and the pipeline can be restarted.
    pub async fn stop(&self) -> Result<()> {
        if let Some(component) = self.component.read().await.as_ref() {
            component.stop().await?;
        }
        Ok(())
    }

    /// Whether sampling is currently active
    pub async fn is_running(&self) -> bool {
        self.component
            .read()
            .await
            .as_ref()
            .is_some_and(|c| c.is_running())
    }

    /// Record a component mount
    pub async fn record_mount(&self, id: &str) {
        if let Some(component) = self.component.read().await.as_ref() {
            component.component_mounted(id);
        }
    }

    /// Record a component unmount
    pub async fn record_unmount(&self, id: &str) -> Option<ComponentProfile> {
        self.component
            .read()
            .await
            .as_ref()
            .and_then(|c| c.component_unmounted(id))
    }

    /// Record one committed render
    pub async fn record_render(&self, event: &RenderEvent) {
        if let Some(component) = self.component.read().await.as_ref() {
            component.render_committed(event);
        }
    }

    /// Open a lifecycle event channel for host instrumentation
    ///
    /// # Errors
    ///
    /// Returns [`PerfScopeError::NotRunning`] when the pipeline was never
    /// started.
    pub async fn event_sender(&self) -> Result<tokio::sync::mpsc::Sender<LifecycleEvent>> {
        match self.component.read().await.as_ref() {
            Some(component) => Ok(component.event_sender()),
            None => Err(PerfScopeError::NotRunning),
        }
    }

    /// Fetch one component's lifecycle profile
    pub async fn profile(&self, id: &str) -> Option<ComponentProfile> {
        self.component
            .read()
            .await
            .as_ref()
            .and_then(|c| c.profile(id))
    }

    /// The most recent heap sample
    pub async fn latest_sample(&self) -> Option<MemorySample> {
        self.component
            .read()
            .await
            .as_ref()
            .and_then(|c| c.latest_sample())
    }

    /// Compose the combined performance report
    ///
    /// # Errors
    ///
    /// Returns [`PerfScopeError::NotRunning`] when the pipeline was never
    /// started.
    pub async fn generate_report(&self) -> Result<PerformanceReport> {
        match self.component.read().await.as_ref() {
            Some(component) => Ok(component.generate_report()),
            None => Err(PerfScopeError::NotRunning),
        }
    }

    /// Drop all collected samples, profiles and aggregates
    pub async fn clear(&self) {
        if let Some(component) = self.component.read().await.as_ref() {
            component.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfscope_new_with_default_config() {
        let config = PerfScopeConfig::default();
        let result = PerfScope::new(config);

        assert!(result.is_ok(), "Should successfully create PerfScope");
    }

    #[test]
    fn test_perfscope_new_with_custom_config() {
        let config = PerfScopeConfig::builder()
            .sample_interval_ms(5_000)
            .leak_threshold_bytes(5 * 1024 * 1024)
            .build();

        let result = PerfScope::new(config);

        assert!(
            result.is_ok(),
            "Should successfully create PerfScope with custom config"
        );
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let perfscope = PerfScope::new(PerfScopeConfig::default()).unwrap();

        perfscope.start().await.unwrap();
        assert!(perfscope.is_running().await);

        perfscope.stop().await.unwrap();
        assert!(!perfscope.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let perfscope = PerfScope::new(PerfScopeConfig::default()).unwrap();
        assert!(perfscope.stop().await.is_ok());
        assert!(!perfscope.is_running().await);
    }

    #[tokio::test]
    async fn test_cannot_start_twice() {
        let perfscope = PerfScope::new(PerfScopeConfig::default()).unwrap();

        perfscope.start().await.unwrap();

        let result = perfscope.start().await;
        assert!(result.is_err(), "Should not be able to start twice");
    }

    #[tokio::test]
    async fn test_lifecycle_restart() {
        let perfscope = PerfScope::new(PerfScopeConfig::default()).unwrap();

        perfscope.start().await.unwrap();
        perfscope.stop().await.unwrap();

        let result = perfscope.start().await;
        assert!(result.is_ok(), "Should be able to restart after stop");
        perfscope.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_diagnostics_survive_stop() {
        let perfscope = PerfScope::new(PerfScopeConfig::default()).unwrap();
        perfscope.start().await.unwrap();

        perfscope.record_mount("grid").await;
        perfscope.record_unmount("grid").await;
        perfscope.stop().await.unwrap();

        assert!(perfscope.profile("grid").await.is_some());
        let report = perfscope.generate_report().await.unwrap();
        assert_eq!(report.average_render_time_ms, 0.0);
    }

    #[tokio::test]
    async fn test_report_before_start_is_error() {
        let perfscope = PerfScope::new(PerfScopeConfig::default()).unwrap();
        assert!(matches!(
            perfscope.generate_report().await,
            Err(PerfScopeError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_surfaces_on_start() {
        let config = PerfScopeConfig::builder().sample_interval_ms(0).build();
        let perfscope = PerfScope::new(config).unwrap();

        assert!(matches!(
            perfscope.start().await,
            Err(PerfScopeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_config_reexport() {
        let _config: PerfScopeConfig = PerfScopeConfig::default();
    }

    #[test]
    fn test_error_reexport() {
        let _result: Result<()> = Ok(());
    }
}
