//! Pipeline context wiring the sampler, profilers and analyzer together

use bundle_analyzer::BundleCompositionAnalyzer;
use heap_telemetry::{HeapCapability, HeapStatsSource, LeakTrendAnalyzer, TelemetrySampler};
use perf_types::{
    BundleAnalysis, ComponentProfile, InteractionStats, LeakReport, LogSink, MemorySample,
    PerformanceReport, RenderAggregate, RenderEvent, ReportSink,
};
use std::path::Path;
use render_profiler::{
    spawn_listener, ComponentLifecycleProfiler, LifecycleEvent, ProfileStore,
    RenderProfileAggregator,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::PerfScopeConfig;
use crate::error::{PerfScopeError, Result};

/// Buffer depth for the lifecycle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Orchestrates the full observability pipeline.
///
/// Owns the heap sampler, the shared profile store, the lifecycle
/// profiler, the render aggregator and the leak trend analyzer, and wires
/// them so one sampling timer drives both telemetry capture and leak
/// analysis. All methods take `&self`; the component is shared behind an
/// `Arc` by the host.
pub struct PerfScopeComponent {
    config: PerfScopeConfig,
    sampler: Arc<TelemetrySampler>,
    store: Arc<ProfileStore>,
    profiler: Arc<ComponentLifecycleProfiler>,
    aggregator: Arc<RenderProfileAggregator>,
    analyzer: Arc<LeakTrendAnalyzer>,
    sink: Arc<dyn ReportSink>,
    running: AtomicBool,
}

impl PerfScopeComponent {
    /// Create a pipeline that logs reports through tracing.
    ///
    /// `heap_source` is the host's heap statistics hook; `None` means the
    /// platform exposes no heap figures and memory features degrade to
    /// no-ops while render profiling keeps working.
    pub fn new(
        config: PerfScopeConfig,
        heap_source: Option<Arc<dyn HeapStatsSource>>,
    ) -> Result<Self> {
        Self::with_sink(config, heap_source, Arc::new(LogSink))
    }

    /// Create a pipeline that emits reports through a custom sink.
    pub fn with_sink(
        config: PerfScopeConfig,
        heap_source: Option<Arc<dyn HeapStatsSource>>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self> {
        Self::validate(&config)?;

        let capability = HeapCapability::detect(heap_source);
        let sampler = Arc::new(TelemetrySampler::with_capacity(
            capability,
            config.max_samples(),
        ));
        let store = Arc::new(ProfileStore::new());
        let profiler = Arc::new(ComponentLifecycleProfiler::with_retention(
            Arc::clone(&store),
            Arc::clone(&sampler) as Arc<dyn perf_types::HeapUsageProbe>,
            config.retention(),
        ));
        let aggregator = Arc::new(RenderProfileAggregator::with_budget(
            config.slow_render_budget_ms(),
        ));
        let analyzer = Arc::new(LeakTrendAnalyzer::with_threshold(
            Arc::clone(&sampler),
            Arc::clone(&store),
            Arc::clone(&sink),
            config.leak_threshold_bytes(),
            config.trend_window(),
        ));

        // Each timer tick captures a sample and then runs one trend pass.
        let tick_analyzer = Arc::clone(&analyzer);
        sampler.set_tick_hook(Arc::new(move || {
            tick_analyzer.evaluate();
        }));

        Ok(Self {
            config,
            sampler,
            store,
            profiler,
            aggregator,
            analyzer,
            sink,
            running: AtomicBool::new(false),
        })
    }

    fn validate(config: &PerfScopeConfig) -> Result<()> {
        if config.sample_interval().is_zero() {
            return Err(PerfScopeError::InvalidConfiguration(
                "sample interval must be non-zero".to_string(),
            ));
        }
        if config.trend_window() < 2 {
            return Err(PerfScopeError::InvalidConfiguration(
                "trend window needs at least 2 samples".to_string(),
            ));
        }
        if config.max_samples() < config.trend_window() {
            return Err(PerfScopeError::InvalidConfiguration(format!(
                "sample buffer of {} cannot hold the trend window of {}",
                config.max_samples(),
                config.trend_window()
            )));
        }
        if config.leak_threshold_bytes() <= 0 {
            return Err(PerfScopeError::InvalidConfiguration(
                "leak threshold must be positive".to_string(),
            ));
        }
        if config.slow_render_budget_ms() <= 0.0 {
            return Err(PerfScopeError::InvalidConfiguration(
                "slow-render budget must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Start the sampling timer.
    ///
    /// Returns [`PerfScopeError::AlreadyRunning`] when sampling is active.
    /// On an unsupported platform the call succeeds but no timer runs.
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PerfScopeError::AlreadyRunning);
        }
        self.sampler.start(self.config.sample_interval());
        info!(
            interval_ms = self.config.sample_interval().as_millis() as u64,
            heap_supported = self.sampler.is_supported(),
            "performance pipeline started"
        );
        Ok(())
    }

    /// Stop the sampling timer. Idempotent; collected state survives and
    /// the pipeline can be restarted.
    pub async fn stop(&self) -> Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.sampler.stop();
            info!("performance pipeline stopped");
        }
        Ok(())
    }

    /// Whether the pipeline has been started and not yet stopped.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether the host exposes heap figures.
    pub fn is_heap_supported(&self) -> bool {
        self.sampler.is_supported()
    }

    /// The active configuration.
    pub fn config(&self) -> &PerfScopeConfig {
        &self.config
    }

    /// Record a component mount.
    pub fn component_mounted(&self, id: &str) {
        self.profiler.start_profile(id);
    }

    /// Record a component unmount; returns the closed profile when a
    /// matching mount existed.
    pub fn component_unmounted(&self, id: &str) -> Option<ComponentProfile> {
        self.profiler.end_profile(id)
    }

    /// Record one committed render.
    pub fn render_committed(&self, event: &RenderEvent) {
        self.aggregator.record(event);
    }

    /// Open a lifecycle event channel and spawn its listener task.
    ///
    /// Clones of the returned sender can be handed to host instrumentation;
    /// the listener ends when every sender is dropped.
    pub fn event_sender(&self) -> mpsc::Sender<LifecycleEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        spawn_listener(rx, Arc::clone(&self.profiler), Arc::clone(&self.aggregator));
        tx
    }

    /// Capture one heap sample outside the timer.
    pub fn sample_now(&self) {
        self.sampler.sample();
    }

    /// Run one leak analysis pass outside the timer; returns the number of
    /// leak reports emitted.
    pub fn evaluate_leaks(&self) -> usize {
        self.analyzer.evaluate()
    }

    /// The most recent heap sample.
    pub fn latest_sample(&self) -> Option<MemorySample> {
        self.sampler.latest()
    }

    /// Buffered heap samples, oldest first.
    pub fn samples(&self) -> Vec<MemorySample> {
        self.sampler.samples()
    }

    /// One component's lifecycle profile.
    pub fn profile(&self, id: &str) -> Option<ComponentProfile> {
        self.store.get(id)
    }

    /// All tracked lifecycle profiles.
    pub fn profiles(&self) -> Vec<ComponentProfile> {
        self.store.all()
    }

    /// One component's render aggregate.
    pub fn aggregate(&self, id: &str) -> Option<RenderAggregate> {
        self.aggregator.aggregate(id)
    }

    /// All render aggregates.
    pub fn aggregates(&self) -> Vec<RenderAggregate> {
        self.aggregator.aggregates()
    }

    /// Per-interaction render statistics.
    pub fn interactions(&self) -> Vec<InteractionStats> {
        self.aggregator.interactions()
    }

    /// Compose the combined performance report and push it through the
    /// sink.
    ///
    /// The render half comes from the aggregator; suspected leaks come
    /// from the flagged profiles in the store, highest severity first.
    pub fn generate_report(&self) -> PerformanceReport {
        let mut report = self.aggregator.generate_report();

        let mut leaks: Vec<LeakReport> = self
            .store
            .flagged()
            .into_iter()
            .map(|profile| LeakReport {
                component_id: profile.component_id.clone(),
                leak_size: profile.memory_delta.unwrap_or(0),
                severity: profile.severity.unwrap_or(perf_types::LeakSeverity::Low),
                timestamp_ms: profile.unmount_time_ms.unwrap_or(report.generated_at_ms),
                recommendations: LeakTrendAnalyzer::recommendations(),
            })
            .collect();
        leaks.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.component_id.cmp(&b.component_id))
        });
        report.suspected_leaks = leaks;

        self.sink.performance_report(&report);
        debug!(
            components = report.total_components,
            slow = report.slow_components.len(),
            leaks = report.suspected_leaks.len(),
            "performance report generated"
        );
        report
    }

    /// Analyze a build-stats artifact from disk.
    ///
    /// A missing or malformed artifact degrades to the representative
    /// mock analysis (`is_fallback = true`), never an error.
    pub fn analyze_bundle(&self, path: impl AsRef<Path>) -> BundleAnalysis {
        BundleCompositionAnalyzer::from_path(path).analyze()
    }

    /// Drop all collected samples, profiles and aggregates.
    pub fn clear(&self) {
        self.sampler.clear();
        self.store.clear();
        self.aggregator.clear();
    }
}

impl std::fmt::Debug for PerfScopeComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfScopeComponent")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("heap_supported", &self.is_heap_supported())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use perf_types::{HeapStats, LeakSeverity, RenderPhase};
    use std::time::Duration;

    const MB: u64 = 1024 * 1024;

    struct GrowingSource {
        used: std::sync::atomic::AtomicU64,
        step: u64,
    }

    impl HeapStatsSource for GrowingSource {
        fn read(&self) -> HeapStats {
            let used = self.used.fetch_add(self.step, Ordering::SeqCst);
            HeapStats {
                used,
                total: used,
                limit: u64::MAX,
            }
        }
    }

    fn growing(start: u64, step: u64) -> Arc<dyn HeapStatsSource> {
        Arc::new(GrowingSource {
            used: std::sync::atomic::AtomicU64::new(start),
            step,
        })
    }

    #[derive(Default)]
    struct CollectingSink {
        leaks: Mutex<Vec<LeakReport>>,
        reports: Mutex<Vec<PerformanceReport>>,
    }

    impl ReportSink for CollectingSink {
        fn leak_report(&self, report: &LeakReport) {
            self.leaks.lock().push(report.clone());
        }

        fn performance_report(&self, report: &PerformanceReport) {
            self.reports.lock().push(report.clone());
        }
    }

    fn render(id: &str, duration: f64, phase: RenderPhase) -> RenderEvent {
        RenderEvent {
            component_id: id.to_string(),
            phase,
            actual_duration_ms: duration,
            base_duration_ms: duration,
            start_time_ms: 0.0,
            commit_time_ms: duration,
            interactions: vec![],
        }
    }

    #[test]
    fn test_new_with_default_config() {
        let component = PerfScopeComponent::new(PerfScopeConfig::default(), None);
        assert!(component.is_ok());
        assert!(!component.unwrap().is_heap_supported());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let zero_interval = PerfScopeConfig::builder().sample_interval_ms(0).build();
        assert!(matches!(
            PerfScopeComponent::new(zero_interval, None),
            Err(PerfScopeError::InvalidConfiguration(_))
        ));

        let tiny_buffer = PerfScopeConfig::builder()
            .max_samples(4)
            .trend_window(10)
            .build();
        assert!(PerfScopeComponent::new(tiny_buffer, None).is_err());

        let zero_threshold = PerfScopeConfig::builder().leak_threshold_bytes(0).build();
        assert!(PerfScopeComponent::new(zero_threshold, None).is_err());
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let component =
            PerfScopeComponent::new(PerfScopeConfig::default(), Some(growing(MB, MB))).unwrap();

        assert!(!component.is_running());
        component.start().await.unwrap();
        assert!(component.is_running());

        assert!(matches!(
            component.start().await,
            Err(PerfScopeError::AlreadyRunning)
        ));

        component.stop().await.unwrap();
        assert!(!component.is_running());
        // stop twice is fine
        component.stop().await.unwrap();

        // restart after stop
        component.start().await.unwrap();
        assert!(component.is_running());
        component.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_lifecycle_passthrough_records_delta() {
        let component =
            PerfScopeComponent::new(PerfScopeConfig::default(), Some(growing(10 * MB, 2 * MB)))
                .unwrap();

        component.sample_now();
        component.component_mounted("orders-grid");
        component.sample_now();
        let closed = component.component_unmounted("orders-grid").unwrap();

        assert_eq!(closed.memory_delta, Some(2 * MB as i64));
        assert!(component.profile("orders-grid").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_drives_sampling_and_leak_analysis() {
        let config = PerfScopeConfig::builder()
            .sample_interval_ms(1_000)
            .trend_window(5)
            .max_samples(20)
            .leak_threshold_bytes(4 * MB as i64)
            .build();
        let sink = Arc::new(CollectingSink::default());
        let component = PerfScopeComponent::with_sink(
            config,
            Some(growing(100 * MB, 5 * MB)),
            Arc::clone(&sink) as Arc<dyn ReportSink>,
        )
        .unwrap();

        // Close a profile with a large delta before growth is visible.
        component.sample_now();
        component.component_mounted("dashboard");
        for _ in 0..2 {
            component.sample_now();
        }
        component.component_unmounted("dashboard");

        component.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(6_500)).await;
        component.stop().await.unwrap();

        let leaks = sink.leaks.lock();
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].component_id, "dashboard");
    }

    #[tokio::test]
    async fn test_report_combines_renders_and_leaks() {
        let sink = Arc::new(CollectingSink::default());
        let component = PerfScopeComponent::with_sink(
            PerfScopeConfig::default(),
            Some(growing(MB, 20 * MB)),
            Arc::clone(&sink) as Arc<dyn ReportSink>,
        )
        .unwrap();

        // Slow renders for one component
        for _ in 0..3 {
            component.render_committed(&render("chart", 40.0, RenderPhase::Update));
        }

        // A flagged leak via a large mount/unmount delta plus heap growth
        component.sample_now();
        component.component_mounted("dashboard");
        for _ in 0..12 {
            component.sample_now();
        }
        component.component_unmounted("dashboard");
        assert_eq!(component.evaluate_leaks(), 1);

        let report = component.generate_report();
        assert_eq!(report.total_components, 1);
        assert_eq!(report.slow_components, vec!["chart".to_string()]);
        assert!(!report.recommendations.is_empty());
        assert_eq!(report.suspected_leaks.len(), 1);
        assert_eq!(report.suspected_leaks[0].component_id, "dashboard");
        assert!(report.suspected_leaks[0].severity >= LeakSeverity::Low);

        // The report was also pushed through the sink
        assert_eq!(sink.reports.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_event_channel_feeds_pipeline() {
        let component =
            PerfScopeComponent::new(PerfScopeConfig::default(), Some(growing(MB, MB))).unwrap();
        component.sample_now();

        let tx = component.event_sender();
        tx.send(LifecycleEvent::MountStarted {
            component_id: "grid".to_string(),
        })
        .await
        .unwrap();
        tx.send(LifecycleEvent::RenderCommitted(render(
            "grid",
            5.0,
            RenderPhase::Mount,
        )))
        .await
        .unwrap();
        tx.send(LifecycleEvent::Unmounted {
            component_id: "grid".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        // Listener drains asynchronously
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(component.profile("grid").is_some_and(|p| p.is_closed()));
        assert_eq!(component.aggregate("grid").unwrap().total_renders, 1);
    }

    #[tokio::test]
    async fn test_clear_resets_collected_state() {
        let component =
            PerfScopeComponent::new(PerfScopeConfig::default(), Some(growing(MB, MB))).unwrap();

        component.sample_now();
        component.component_mounted("grid");
        component.render_committed(&render("grid", 5.0, RenderPhase::Mount));
        component.clear();

        assert!(component.samples().is_empty());
        assert!(component.profiles().is_empty());
        assert!(component.aggregates().is_empty());
    }

    #[test]
    fn test_bundle_analysis_falls_back_without_artifact() {
        let component = PerfScopeComponent::new(PerfScopeConfig::default(), None).unwrap();
        let analysis = component.analyze_bundle("/nonexistent/build-stats.json");

        assert!(analysis.is_fallback);
        assert!(analysis.summary.chunk_count > 0);
    }

    #[test]
    fn test_unsupported_platform_keeps_render_profiling() {
        let component = PerfScopeComponent::new(PerfScopeConfig::default(), None).unwrap();

        component.sample_now();
        assert!(component.latest_sample().is_none());

        component.render_committed(&render("grid", 5.0, RenderPhase::Mount));
        assert_eq!(component.aggregate("grid").unwrap().total_renders, 1);
    }
}
