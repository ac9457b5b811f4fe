//! Periodic heap-usage sampler

use parking_lot::{Mutex, RwLock};
use perf_types::{now_ms, HeapUsageProbe, MemorySample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::capability::HeapCapability;

/// Default ring-buffer capacity.
pub const DEFAULT_MAX_SAMPLES: usize = 100;

/// Hook invoked after every timer-driven sample, used to chain the trend
/// analyzer onto sampler ticks.
pub type TickHook = Arc<dyn Fn() + Send + Sync>;

/// Samples heap usage into a bounded FIFO ring buffer.
///
/// When the capability is [`HeapCapability::Unsupported`] every operation
/// is a no-op; the sampler never errors because of a missing host API.
pub struct TelemetrySampler {
    capability: HeapCapability,
    samples: Arc<RwLock<VecDeque<MemorySample>>>,
    max_samples: usize,
    running: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    tick_hook: Arc<RwLock<Option<TickHook>>>,
}

impl TelemetrySampler {
    /// Create a sampler with the default buffer capacity.
    pub fn new(capability: HeapCapability) -> Self {
        Self::with_capacity(capability, DEFAULT_MAX_SAMPLES)
    }

    /// Create a sampler with a custom buffer capacity.
    pub fn with_capacity(capability: HeapCapability, max_samples: usize) -> Self {
        Self {
            capability,
            samples: Arc::new(RwLock::new(VecDeque::with_capacity(max_samples))),
            max_samples: max_samples.max(1),
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            tick_hook: Arc::new(RwLock::new(None)),
        }
    }

    /// Whether the host exposes heap figures.
    pub fn is_supported(&self) -> bool {
        self.capability.is_supported()
    }

    /// Whether the timer task is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Register the hook run after each timer-driven sample.
    pub fn set_tick_hook(&self, hook: TickHook) {
        *self.tick_hook.write() = Some(hook);
    }

    /// Capture one sample into the ring buffer.
    ///
    /// No-op when the platform is unsupported. Past capacity the oldest
    /// sample is evicted first.
    pub fn sample(&self) {
        Self::capture(&self.capability, &self.samples, self.max_samples);
    }

    /// Start the repeating sampling timer. Idempotent.
    pub fn start(&self, interval: Duration) {
        if !self.capability.is_supported() {
            debug!("heap telemetry unsupported; sampler start is a no-op");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let capability = self.capability.clone();
        let samples = Arc::clone(&self.samples);
        let running = Arc::clone(&self.running);
        let tick_hook = Arc::clone(&self.tick_hook);
        let max_samples = self.max_samples;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first interval tick is immediate; skip it so samples are
            // spaced one full interval apart from start().
            ticker.tick().await;
            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                Self::capture(&capability, &samples, max_samples);
                // Clone out of the lock so the hook runs unguarded and a
                // concurrent set_tick_hook never waits on it.
                let hook = tick_hook.read().clone();
                if let Some(hook) = hook {
                    hook();
                }
            }
        });
        *self.task.lock() = Some(handle);
        debug!(interval_ms = interval.as_millis() as u64, "sampler started");
    }

    /// Stop the sampling timer. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            debug!("sampler stopped");
        }
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<MemorySample> {
        self.samples.read().back().copied()
    }

    /// Snapshot of the ring buffer, oldest first.
    pub fn samples(&self) -> Vec<MemorySample> {
        self.samples.read().iter().copied().collect()
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    /// Whether no samples have been captured.
    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }

    /// Drop all buffered samples.
    pub fn clear(&self) {
        self.samples.write().clear();
    }

    fn capture(
        capability: &HeapCapability,
        samples: &RwLock<VecDeque<MemorySample>>,
        max_samples: usize,
    ) {
        let Some(stats) = capability.read() else {
            return;
        };
        let sample = MemorySample {
            used_heap: stats.used,
            total_heap: stats.total,
            heap_limit: stats.limit,
            timestamp_ms: now_ms(),
        };
        let mut buffer = samples.write();
        if buffer.len() == max_samples {
            buffer.pop_front();
        }
        buffer.push_back(sample);
    }
}

impl Drop for TelemetrySampler {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}

impl HeapUsageProbe for TelemetrySampler {
    fn latest_used_heap(&self) -> Option<u64> {
        self.latest().map(|s| s.used_heap)
    }
}
