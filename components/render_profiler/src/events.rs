//! Typed lifecycle event channel
//!
//! Host UI instrumentation pushes events into an mpsc channel instead of
//! calling the profiler through ad-hoc callbacks. A listener task fans
//! each event out to the lifecycle profiler and the render aggregator.

use perf_types::RenderEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::aggregator::RenderProfileAggregator;
use crate::lifecycle::ComponentLifecycleProfiler;

/// One host UI lifecycle event.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A logical component began mounting
    MountStarted {
        /// Logical component identifier
        component_id: String,
    },
    /// A render was committed
    RenderCommitted(RenderEvent),
    /// A logical component unmounted
    Unmounted {
        /// Logical component identifier
        component_id: String,
    },
}

/// Spawn the listener task that drains a lifecycle event channel.
///
/// The task ends when every sender handle is dropped. Dropping the
/// returned handle does not cancel the task; abort it for an immediate
/// teardown.
pub fn spawn_listener(
    mut events: mpsc::Receiver<LifecycleEvent>,
    profiler: Arc<ComponentLifecycleProfiler>,
    aggregator: Arc<RenderProfileAggregator>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                LifecycleEvent::MountStarted { component_id } => {
                    profiler.start_profile(&component_id);
                }
                LifecycleEvent::RenderCommitted(render) => {
                    aggregator.record(&render);
                }
                LifecycleEvent::Unmounted { component_id } => {
                    profiler.end_profile(&component_id);
                }
            }
        }
        debug!("lifecycle event channel closed");
    })
}
