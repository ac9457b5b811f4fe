//! Viewport-triggered deferred loading
//!
//! The host reports intersection changes for a target region; the loader
//! defers even creating its load task until the region crosses the
//! configured visibility threshold or margin, then runs the shared retry
//! pipeline once.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::task::LoadTask;

/// When a region counts as visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityConfig {
    /// Minimum visible fraction of the target region (0.0 to 1.0)
    pub threshold: f64,
    /// Distance in pixels at which loading starts ahead of visibility
    pub margin_px: f64,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            margin_px: 50.0,
        }
    }
}

type TaskFactory<T> = Box<dyn FnOnce() -> LoadTask<T> + Send>;

/// Defers a load task until its target region becomes visible.
pub struct VisibilityLoader<T: Clone + Send + Sync + 'static> {
    config: VisibilityConfig,
    factory: Mutex<Option<TaskFactory<T>>>,
    task: RwLock<Option<Arc<LoadTask<T>>>>,
    detached: AtomicBool,
}

impl<T: Clone + Send + Sync + 'static> VisibilityLoader<T> {
    /// Create a deferred loader; `factory` builds the task on first trigger.
    pub fn new(config: VisibilityConfig, factory: impl FnOnce() -> LoadTask<T> + Send + 'static) -> Self {
        Self {
            config,
            factory: Mutex::new(Some(Box::new(factory))),
            task: RwLock::new(None),
            detached: AtomicBool::new(false),
        }
    }

    /// Report an intersection change for the observed region.
    ///
    /// Returns true when this call triggered the load. Repeated triggers
    /// and reports after [`detach`](Self::detach) are no-ops.
    pub fn report_intersection(&self, visible_ratio: f64, distance_px: f64) -> bool {
        if self.detached.load(Ordering::SeqCst) || self.task.read().is_some() {
            return false;
        }
        if visible_ratio < self.config.threshold && distance_px > self.config.margin_px {
            return false;
        }

        let Some(factory) = self.factory.lock().take() else {
            return false;
        };
        let task = Arc::new(factory());
        debug!(module = %task.name(), "visibility trigger crossed; load task created");
        *self.task.write() = Some(Arc::clone(&task));

        // Fire-and-forget on the host runtime; callers can also await the
        // task themselves through `task()`.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = task.preload().await {
                    warn!(error = %err, "visibility-triggered load failed");
                }
            });
        }
        true
    }

    /// The created task, once the trigger has fired.
    pub fn task(&self) -> Option<Arc<LoadTask<T>>> {
        self.task.read().clone()
    }

    /// Whether the trigger has fired.
    pub fn is_triggered(&self) -> bool {
        self.task.read().is_some()
    }

    /// Stop observing. Idempotent; an untriggered loader never loads.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        self.factory.lock().take();
    }
}
