//! Component lifecycle memory profiling

use perf_types::{now_ms, ComponentProfile, HeapUsageProbe};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::store::ProfileStore;

/// Default retention window for closed, unflagged profiles.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60);

/// Tracks per-logical-component mount/unmount memory deltas.
///
/// Every entry point absorbs misuse: out-of-order or duplicate calls are
/// logged at debug level and never propagate into the host render path.
pub struct ComponentLifecycleProfiler {
    store: Arc<ProfileStore>,
    probe: Arc<dyn HeapUsageProbe>,
    retention: Duration,
}

impl ComponentLifecycleProfiler {
    /// Create a profiler over a shared store and heap probe.
    pub fn new(store: Arc<ProfileStore>, probe: Arc<dyn HeapUsageProbe>) -> Self {
        Self::with_retention(store, probe, DEFAULT_RETENTION)
    }

    /// Create a profiler with a custom retention window.
    pub fn with_retention(
        store: Arc<ProfileStore>,
        probe: Arc<dyn HeapUsageProbe>,
        retention: Duration,
    ) -> Self {
        Self {
            store,
            probe,
            retention,
        }
    }

    /// Open a profile at mount time.
    ///
    /// An open profile under the same logical id (rapid remount, e.g. list
    /// virtualization reusing keys) is overwritten: last-mount-wins. The
    /// source system never resolved whether the earlier cycle should be
    /// closed instead, so the ambiguity is kept rather than redesigned.
    pub fn start_profile(&self, id: &str) {
        let initial = self.probe.latest_used_heap().unwrap_or(0);
        if self.store.get(id).is_some_and(|p| !p.is_closed()) {
            debug!(component = id, "remount overwrote an open profile");
        }
        self.store
            .insert(ComponentProfile::open(id, initial, now_ms()));
    }

    /// Close a profile at unmount time and compute its memory delta.
    ///
    /// Returns `None` when no open profile exists for the id; an unmount
    /// without a matching mount is absorbed silently. The closed profile
    /// is evicted after the retention window unless the trend analyzer
    /// flags it as a leak in the meantime.
    pub fn end_profile(&self, id: &str) -> Option<ComponentProfile> {
        let final_memory = self.probe.latest_used_heap().unwrap_or(0);
        let closed = match self.store.close(id, final_memory, now_ms()) {
            Some(profile) => profile,
            None => {
                debug!(component = id, "end_profile without an open profile");
                return None;
            }
        };

        self.schedule_eviction(id.to_string(), closed.unmount_time_ms.unwrap_or(0.0));
        Some(closed)
    }

    /// Retention window applied to closed profiles.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    // Eviction runs on the host runtime; without one, closed profiles stay
    // until `clear` or the next flagging pass.
    fn schedule_eviction(&self, id: String, closed_at_ms: f64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let retention = self.retention;
        handle.spawn(async move {
            tokio::time::sleep(retention).await;
            if store.remove_if_expired(&id, closed_at_ms) {
                debug!(component = %id, "evicted profile past retention window");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct ScriptedProbe {
        readings: Mutex<Vec<u64>>,
    }

    impl ScriptedProbe {
        fn new(readings: Vec<u64>) -> Arc<Self> {
            Arc::new(Self {
                readings: Mutex::new(readings),
            })
        }
    }

    impl HeapUsageProbe for ScriptedProbe {
        fn latest_used_heap(&self) -> Option<u64> {
            let mut readings = self.readings.lock();
            if readings.len() > 1 {
                Some(readings.remove(0))
            } else {
                readings.first().copied()
            }
        }
    }

    struct NoProbe;

    impl HeapUsageProbe for NoProbe {
        fn latest_used_heap(&self) -> Option<u64> {
            None
        }
    }

    #[tokio::test]
    async fn test_mount_unmount_delta() {
        let store = Arc::new(ProfileStore::new());
        let profiler = ComponentLifecycleProfiler::new(
            Arc::clone(&store),
            ScriptedProbe::new(vec![1_000, 4_000]),
        );

        profiler.start_profile("orders-grid");
        let closed = profiler.end_profile("orders-grid").unwrap();
        assert_eq!(closed.memory_delta, Some(3_000));
    }

    #[tokio::test]
    async fn test_end_without_start_is_noop() {
        let store = Arc::new(ProfileStore::new());
        let profiler = ComponentLifecycleProfiler::new(store, ScriptedProbe::new(vec![0]));
        assert!(profiler.end_profile("never-mounted").is_none());
    }

    #[tokio::test]
    async fn test_end_twice_is_deterministic() {
        let store = Arc::new(ProfileStore::new());
        let profiler =
            ComponentLifecycleProfiler::new(store, ScriptedProbe::new(vec![1_000, 2_000]));

        profiler.start_profile("grid");
        assert!(profiler.end_profile("grid").is_some());
        assert!(profiler.end_profile("grid").is_none());
        assert!(profiler.end_profile("grid").is_none());
    }

    #[tokio::test]
    async fn test_remount_overwrites_open_profile() {
        let store = Arc::new(ProfileStore::new());
        let profiler = ComponentLifecycleProfiler::new(
            Arc::clone(&store),
            ScriptedProbe::new(vec![1_000, 9_000, 9_500]),
        );

        profiler.start_profile("row");
        profiler.start_profile("row");
        // Delta measured from the second mount, not the first
        let closed = profiler.end_profile("row").unwrap();
        assert_eq!(closed.memory_delta, Some(500));
    }

    #[tokio::test]
    async fn test_unsupported_probe_records_zero() {
        let store = Arc::new(ProfileStore::new());
        let profiler = ComponentLifecycleProfiler::new(Arc::clone(&store), Arc::new(NoProbe));

        profiler.start_profile("grid");
        let closed = profiler.end_profile("grid").unwrap();
        assert_eq!(closed.initial_memory, 0);
        assert_eq!(closed.memory_delta, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retention_evicts_unflagged_profile() {
        let store = Arc::new(ProfileStore::new());
        let profiler = ComponentLifecycleProfiler::with_retention(
            Arc::clone(&store),
            ScriptedProbe::new(vec![1_000, 2_000]),
            Duration::from_secs(60),
        );

        profiler.start_profile("grid");
        profiler.end_profile("grid");
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retention_keeps_flagged_profile() {
        let store = Arc::new(ProfileStore::new());
        let profiler = ComponentLifecycleProfiler::with_retention(
            Arc::clone(&store),
            ScriptedProbe::new(vec![1_000, 2_000]),
            Duration::from_secs(60),
        );

        profiler.start_profile("grid");
        profiler.end_profile("grid");
        store.mark_leak("grid", perf_types::LeakSeverity::Medium);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.get("grid").is_some());
    }
}
