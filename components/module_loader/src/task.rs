//! Retry-wrapped load task with in-flight memoization

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use perf_types::ModuleLoadState;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Module loading failures.
///
/// Unlike the rest of the pipeline this error is user-visible: the loaded
/// module is the requested feature itself, not diagnostic metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleLoadError {
    /// One import attempt failed
    #[error("import of '{module}' failed: {message}")]
    Import {
        /// Logical module name
        module: String,
        /// Underlying failure message
        message: String,
    },

    /// The retry budget was exhausted
    #[error("module '{module}' failed to load after {attempts} attempts: {message}")]
    Exhausted {
        /// Logical module name
        module: String,
        /// Attempts made before giving up
        attempts: u32,
        /// Message of the last failure
        message: String,
    },

    /// The registry has no task under the requested name
    #[error("no module registered under '{module}'")]
    NotRegistered {
        /// Logical module name
        module: String,
    },
}

/// Retry policy for one load task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of import attempts
    pub retry_attempts: u32,
    /// Base delay between attempts; scaled by the attempt number
    pub retry_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryConfig {
    /// Override the attempt budget.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Override the base retry delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// The underlying dynamic import.
#[async_trait]
pub trait ModuleImporter<T: Send + 'static>: Send + Sync {
    /// Run one import attempt.
    async fn import(&self) -> Result<T, ModuleLoadError>;
}

/// Adapter turning an async closure into a [`ModuleImporter`].
pub struct FnImporter<F> {
    f: F,
}

/// Wrap an async closure as an importer.
pub fn importer_fn<T, F, Fut>(f: F) -> FnImporter<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ModuleLoadError>> + Send,
{
    FnImporter { f }
}

#[async_trait]
impl<T, F, Fut> ModuleImporter<T> for FnImporter<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ModuleLoadError>> + Send,
{
    async fn import(&self) -> Result<T, ModuleLoadError> {
        (self.f)().await
    }
}

type SharedLoad<T> = Shared<BoxFuture<'static, Result<T, ModuleLoadError>>>;

/// One resilient load task for a logical module.
///
/// State machine: `Idle -> Loading(attempt) -> { Loaded | Failed(attempts) }`
/// with `attempt <= retry_attempts`. The in-flight future is memoized, so
/// any number of concurrent callers share a single underlying import; a
/// terminal failure stays memoized until an explicit [`retry`](Self::retry).
pub struct LoadTask<T: Clone + Send + Sync + 'static> {
    name: String,
    importer: Arc<dyn ModuleImporter<T>>,
    config: RetryConfig,
    state: Arc<RwLock<ModuleLoadState>>,
    inflight: Mutex<Option<SharedLoad<T>>>,
}

impl<T: Clone + Send + Sync + 'static> LoadTask<T> {
    /// Create a task for the named module.
    pub fn new(
        name: impl Into<String>,
        importer: Arc<dyn ModuleImporter<T>>,
        config: RetryConfig,
    ) -> Self {
        Self {
            name: name.into(),
            importer,
            config,
            state: Arc::new(RwLock::new(ModuleLoadState::Idle)),
            inflight: Mutex::new(None),
        }
    }

    /// Logical module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state of the task's state machine.
    pub fn state(&self) -> ModuleLoadState {
        *self.state.read()
    }

    /// Load the module, joining the in-flight attempt if one exists.
    pub async fn load(&self) -> Result<T, ModuleLoadError> {
        let shared = {
            let mut inflight = self.inflight.lock();
            match inflight.as_ref() {
                Some(shared) => shared.clone(),
                None => {
                    let driver = Self::drive(
                        self.name.clone(),
                        Arc::clone(&self.importer),
                        Arc::clone(&self.state),
                        self.config,
                    )
                    .boxed()
                    .shared();
                    *inflight = Some(driver.clone());
                    driver
                }
            }
        };
        shared.await
    }

    /// Run the load pipeline without keeping the module value.
    pub async fn preload(&self) -> Result<(), ModuleLoadError> {
        self.load().await.map(|_| ())
    }

    /// Reset a failed task and begin a fresh bounded retry cycle.
    ///
    /// Only a task in `Failed` resets; in every other state this simply
    /// joins the current (or completed) load.
    pub async fn retry(&self) -> Result<T, ModuleLoadError> {
        {
            let mut inflight = self.inflight.lock();
            let mut state = self.state.write();
            if matches!(*state, ModuleLoadState::Failed { .. }) {
                *inflight = None;
                *state = ModuleLoadState::Idle;
                debug!(module = %self.name, "failed load task reset for retry");
            }
        }
        self.load().await
    }

    async fn drive(
        name: String,
        importer: Arc<dyn ModuleImporter<T>>,
        state: Arc<RwLock<ModuleLoadState>>,
        config: RetryConfig,
    ) -> Result<T, ModuleLoadError> {
        let mut last_message = String::new();
        for attempt in 1..=config.retry_attempts {
            *state.write() = ModuleLoadState::Loading { attempt };
            match importer.import().await {
                Ok(value) => {
                    *state.write() = ModuleLoadState::Loaded;
                    debug!(module = %name, attempt, "module loaded");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(module = %name, attempt, error = %err, "module import failed");
                    last_message = match err {
                        ModuleLoadError::Import { message, .. } => message,
                        other => other.to_string(),
                    };
                    if attempt < config.retry_attempts {
                        tokio::time::sleep(config.retry_delay * attempt).await;
                    }
                }
            }
        }
        *state.write() = ModuleLoadState::Failed {
            attempts: config.retry_attempts,
        };
        Err(ModuleLoadError::Exhausted {
            module: name,
            attempts: config.retry_attempts,
            message: last_message,
        })
    }
}

impl<T: Clone + Send + Sync + 'static> std::fmt::Debug for LoadTask<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTask")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn failing_importer(counter: Arc<AtomicU32>) -> Arc<dyn ModuleImporter<String>> {
        Arc::new(importer_fn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ModuleLoadError::Import {
                    module: "reports".to_string(),
                    message: "network down".to_string(),
                })
            }
        }))
    }

    fn flaky_importer(
        counter: Arc<AtomicU32>,
        fail_times: u32,
    ) -> Arc<dyn ModuleImporter<String>> {
        Arc::new(importer_fn(move || {
            let counter = Arc::clone(&counter);
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt <= fail_times {
                    Err(ModuleLoadError::Import {
                        module: "reports".to_string(),
                        message: format!("transient failure {attempt}"),
                    })
                } else {
                    Ok("module-exports".to_string())
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_successful_load() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = LoadTask::new("reports", flaky_importer(counter, 0), RetryConfig::default());

        assert_eq!(task.state(), ModuleLoadState::Idle);
        let value = task.load().await.unwrap();
        assert_eq!(value, "module-exports");
        assert_eq!(task.state(), ModuleLoadState::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_after_exact_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = LoadTask::new(
            "reports",
            failing_importer(Arc::clone(&counter)),
            RetryConfig::default(),
        );

        let started = Instant::now();
        let err = task.load().await.unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            ModuleLoadError::Exhausted { attempts: 3, .. }
        ));
        assert_eq!(task.state(), ModuleLoadState::Failed { attempts: 3 });
        // Backoff scales with the attempt number: 1s after the first
        // failure, 2s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_starts_fresh_cycle() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = LoadTask::new(
            "reports",
            failing_importer(Arc::clone(&counter)),
            RetryConfig::default(),
        );

        task.load().await.unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        // A plain load after terminal failure joins the memoized failure
        task.load().await.unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        task.retry().await.unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 6);
        assert_eq!(task.state(), ModuleLoadState::Failed { attempts: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_once_importer_heals() {
        let counter = Arc::new(AtomicU32::new(0));
        // Fails the whole first cycle, succeeds on the fourth attempt
        let task = LoadTask::new(
            "reports",
            flaky_importer(Arc::clone(&counter), 3),
            RetryConfig::default(),
        );

        task.load().await.unwrap_err();
        let value = task.retry().await.unwrap();
        assert_eq!(value, "module-exports");
        assert_eq!(task.state(), ModuleLoadState::Loaded);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_import() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = Arc::new(LoadTask::new(
            "reports",
            flaky_importer(Arc::clone(&counter), 0),
            RetryConfig::default(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let task = Arc::clone(&task);
                tokio::spawn(async move { task.load().await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loaded_value_memoized() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = LoadTask::new(
            "reports",
            flaky_importer(Arc::clone(&counter), 0),
            RetryConfig::default(),
        );

        task.load().await.unwrap();
        task.load().await.unwrap();
        task.preload().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_on_healthy_task_is_a_join() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = LoadTask::new(
            "reports",
            flaky_importer(Arc::clone(&counter), 0),
            RetryConfig::default(),
        );

        task.load().await.unwrap();
        task.retry().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
