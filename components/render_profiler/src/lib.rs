//! Component lifecycle profiling and render-cost aggregation
//!
//! This crate tracks per-logical-component mount/unmount memory deltas
//! (ComponentLifecycleProfiler over a shared ProfileStore) and aggregates
//! render timings with optimization recommendations
//! (RenderProfileAggregator). Host lifecycle events arrive either through
//! direct calls or through the typed [`LifecycleEvent`] channel.

mod aggregator;
mod events;
mod lifecycle;
mod store;

pub use aggregator::{RenderProfileAggregator, FRAME_BUDGET_MS};
pub use events::{spawn_listener, LifecycleEvent};
pub use lifecycle::ComponentLifecycleProfiler;
pub use store::ProfileStore;
