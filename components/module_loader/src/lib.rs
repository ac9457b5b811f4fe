//! Resilient on-demand module loading
//!
//! Wraps dynamic imports in a retry/backoff state machine with in-flight
//! memoization ([`LoadTask`]), a central name-keyed preload registry with
//! settle-all batch semantics ([`PreloadRegistry`]), and a
//! viewport-triggered variant that defers task creation until a target
//! region becomes visible ([`VisibilityLoader`]).

mod registry;
mod task;
mod visibility;

pub use registry::{BatchPreloadOutcome, PreloadRegistry};
pub use task::{importer_fn, FnImporter, LoadTask, ModuleImporter, ModuleLoadError, RetryConfig};
pub use visibility::{VisibilityConfig, VisibilityLoader};
