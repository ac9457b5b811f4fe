//! Render-cost aggregation and optimization recommendations

use parking_lot::RwLock;
use perf_types::{
    now_ms, Impact, InteractionStats, PerformanceReport, Recommendation, RecommendationKind,
    RenderAggregate, RenderEvent, RenderPhase,
};
use std::collections::HashMap;
use tracing::debug;

/// Default slow-render budget: one 60fps frame in milliseconds.
pub const FRAME_BUDGET_MS: f64 = 16.0;

/// Renders above twice the default budget escalate to high impact.
const SEVERE_RENDER_MS: f64 = 33.0;

/// First renders above this cost suggest lazy-loading the component.
const EXPENSIVE_MOUNT_MS: f64 = 50.0;

/// Spread between slowest and fastest render worth an informational note.
const TIMING_SPREAD_MS: f64 = 32.0;

/// Render count above which the re-render frequency rule applies.
const FREQUENT_RENDER_COUNT: u64 = 50;

/// Aggregates render timings per component and derives recommendations.
///
/// Events are consumed immediately; only the bounded per-component
/// aggregate and per-interaction totals survive. Aggregation is
/// order-insensitive beyond the bounded phase history.
#[derive(Debug)]
pub struct RenderProfileAggregator {
    aggregates: RwLock<HashMap<String, RenderAggregate>>,
    interactions: RwLock<HashMap<String, InteractionStats>>,
    slow_budget_ms: f64,
}

impl Default for RenderProfileAggregator {
    fn default() -> Self {
        Self::with_budget(FRAME_BUDGET_MS)
    }
}

impl RenderProfileAggregator {
    /// Create an empty aggregator with the default slow-render budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty aggregator with a custom slow-render budget.
    pub fn with_budget(slow_budget_ms: f64) -> Self {
        Self {
            aggregates: RwLock::new(HashMap::new()),
            interactions: RwLock::new(HashMap::new()),
            slow_budget_ms,
        }
    }

    /// The budget above which a component's average render is slow.
    pub fn slow_budget_ms(&self) -> f64 {
        self.slow_budget_ms
    }

    /// Fold one render commit into the per-component aggregate.
    pub fn record(&self, event: &RenderEvent) {
        {
            let mut aggregates = self.aggregates.write();
            match aggregates.get_mut(&event.component_id) {
                Some(aggregate) => aggregate.record(event, self.slow_budget_ms),
                None => {
                    aggregates.insert(
                        event.component_id.clone(),
                        RenderAggregate::first(event, self.slow_budget_ms),
                    );
                }
            }
        }

        if !event.interactions.is_empty() {
            let mut interactions = self.interactions.write();
            for name in &event.interactions {
                let stats = interactions
                    .entry(name.clone())
                    .or_insert_with(|| InteractionStats {
                        name: name.clone(),
                        total_duration_ms: 0.0,
                        components: Default::default(),
                    });
                stats.total_duration_ms += event.actual_duration_ms;
                stats.components.insert(event.component_id.clone());
            }
        }

        if event.actual_duration_ms > self.slow_budget_ms {
            debug!(
                component = %event.component_id,
                duration_ms = event.actual_duration_ms,
                "render exceeded frame budget"
            );
        }
    }

    /// One component's aggregate, if it rendered at least once.
    pub fn aggregate(&self, id: &str) -> Option<RenderAggregate> {
        self.aggregates.read().get(id).cloned()
    }

    /// Snapshot of all aggregates.
    pub fn aggregates(&self) -> Vec<RenderAggregate> {
        self.aggregates.read().values().cloned().collect()
    }

    /// Snapshot of per-interaction statistics for root-cause grouping.
    pub fn interactions(&self) -> Vec<InteractionStats> {
        self.interactions.read().values().cloned().collect()
    }

    /// Drop all aggregated state.
    pub fn clear(&self) {
        self.aggregates.write().clear();
        self.interactions.write().clear();
    }

    /// Compose the render half of a performance report.
    ///
    /// Recommendations come from a fixed rule set and are sorted high
    /// impact first. Suspected leaks are filled in by the pipeline
    /// context, which also owns the profile store.
    pub fn generate_report(&self) -> PerformanceReport {
        let aggregates = self.aggregates.read();

        let total_renders: u64 = aggregates.values().map(|a| a.total_renders).sum();
        let total_duration: f64 = aggregates.values().map(|a| a.total_duration_ms).sum();
        let average = if total_renders > 0 {
            total_duration / total_renders as f64
        } else {
            0.0
        };

        let mut slow_components: Vec<String> = aggregates
            .values()
            .filter(|a| a.is_slow)
            .map(|a| a.component_id.clone())
            .collect();
        slow_components.sort();

        let mut recommendations: Vec<Recommendation> = aggregates
            .values()
            .flat_map(|aggregate| self.recommend(aggregate))
            .collect();
        recommendations.sort_by(|a, b| {
            a.impact
                .cmp(&b.impact)
                .then_with(|| a.component_id.cmp(&b.component_id))
        });

        PerformanceReport {
            generated_at_ms: now_ms(),
            average_render_time_ms: average,
            total_components: aggregates.len(),
            slow_components,
            recommendations,
            suspected_leaks: Vec::new(),
        }
    }

    fn recommend(&self, aggregate: &RenderAggregate) -> Vec<Recommendation> {
        let mut out = Vec::new();
        let id = &aggregate.component_id;

        if aggregate.average_duration_ms > self.slow_budget_ms {
            let impact = if aggregate.average_duration_ms > SEVERE_RENDER_MS.max(self.slow_budget_ms) {
                Impact::High
            } else {
                Impact::Medium
            };
            out.push(Recommendation {
                component_id: id.clone(),
                kind: RecommendationKind::Memoize,
                impact,
                message: format!(
                    "average render of {:.1}ms exceeds the {:.0}ms frame budget; memoize the component or its expensive children",
                    aggregate.average_duration_ms, self.slow_budget_ms
                ),
            });
        }

        if aggregate.total_renders > FREQUENT_RENDER_COUNT {
            let recent_updates = aggregate
                .recent_phases
                .iter()
                .rev()
                .take(10)
                .filter(|p| **p == RenderPhase::Update)
                .count();
            if recent_updates >= 7 {
                out.push(Recommendation {
                    component_id: id.clone(),
                    kind: RecommendationKind::FrequentRerender,
                    impact: Impact::Medium,
                    message: format!(
                        "{} renders recorded and {recent_updates} of the last 10 were updates; check for unstable props or over-broad subscriptions",
                        aggregate.total_renders
                    ),
                });
            }
        }

        if aggregate.first_duration_ms > EXPENSIVE_MOUNT_MS {
            out.push(Recommendation {
                component_id: id.clone(),
                kind: RecommendationKind::CodeSplit,
                impact: Impact::Medium,
                message: format!(
                    "first render took {:.1}ms; consider lazy-loading or splitting this component",
                    aggregate.first_duration_ms
                ),
            });
        }

        if aggregate.max_duration_ms - aggregate.min_duration_ms > TIMING_SPREAD_MS {
            out.push(Recommendation {
                component_id: id.clone(),
                kind: RecommendationKind::InconsistentTiming,
                impact: Impact::Low,
                message: format!(
                    "render time varies from {:.1}ms to {:.1}ms; some code paths are much more expensive than others",
                    aggregate.min_duration_ms, aggregate.max_duration_ms
                ),
            });
        }

        out
    }
}
