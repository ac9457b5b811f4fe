//! Render instrumentation types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Maximum number of recent render phases retained per component.
pub const RECENT_PHASE_CAPACITY: usize = 100;

/// Which kind of commit a render event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPhase {
    /// First commit of the component
    Mount,
    /// Any subsequent commit
    Update,
}

/// One render commit as reported by the host render-event source.
///
/// Events are transient: the aggregator consumes them immediately and only
/// the bounded per-component aggregate survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEvent {
    /// Logical component identifier
    pub component_id: String,
    /// Mount or update commit
    pub phase: RenderPhase,
    /// Time spent rendering the committed update, in milliseconds
    pub actual_duration_ms: f64,
    /// Estimated render time without memoization, in milliseconds
    pub base_duration_ms: f64,
    /// When the render began, in milliseconds
    pub start_time_ms: f64,
    /// When the update was committed, in milliseconds
    pub commit_time_ms: f64,
    /// Named user interactions associated with this commit
    #[serde(default)]
    pub interactions: Vec<String>,
}

/// Monotonically updated per-component render statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderAggregate {
    /// Logical component identifier
    pub component_id: String,
    /// Number of renders recorded
    pub total_renders: u64,
    /// Sum of actual durations in milliseconds
    pub total_duration_ms: f64,
    /// Mean actual duration in milliseconds
    pub average_duration_ms: f64,
    /// Fastest recorded render in milliseconds
    pub min_duration_ms: f64,
    /// Slowest recorded render in milliseconds
    pub max_duration_ms: f64,
    /// Duration of the first recorded render in milliseconds
    pub first_duration_ms: f64,
    /// Bounded history of recent phases, oldest first
    pub recent_phases: VecDeque<RenderPhase>,
    /// Whether the most recent render exceeded the frame budget
    pub is_slow: bool,
}

impl RenderAggregate {
    /// Start an aggregate from the first observed event.
    pub fn first(event: &RenderEvent, slow_budget_ms: f64) -> Self {
        let mut recent_phases = VecDeque::with_capacity(RECENT_PHASE_CAPACITY);
        recent_phases.push_back(event.phase);
        Self {
            component_id: event.component_id.clone(),
            total_renders: 1,
            total_duration_ms: event.actual_duration_ms,
            average_duration_ms: event.actual_duration_ms,
            min_duration_ms: event.actual_duration_ms,
            max_duration_ms: event.actual_duration_ms,
            first_duration_ms: event.actual_duration_ms,
            recent_phases,
            is_slow: event.actual_duration_ms > slow_budget_ms,
        }
    }

    /// Fold a subsequent event into the aggregate.
    pub fn record(&mut self, event: &RenderEvent, slow_budget_ms: f64) {
        self.total_renders += 1;
        self.total_duration_ms += event.actual_duration_ms;
        self.average_duration_ms = self.total_duration_ms / self.total_renders as f64;
        self.min_duration_ms = self.min_duration_ms.min(event.actual_duration_ms);
        self.max_duration_ms = self.max_duration_ms.max(event.actual_duration_ms);
        if self.recent_phases.len() == RECENT_PHASE_CAPACITY {
            self.recent_phases.pop_front();
        }
        self.recent_phases.push_back(event.phase);
        self.is_slow = event.actual_duration_ms > slow_budget_ms;
    }
}

/// Cumulative statistics for one named user interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionStats {
    /// Interaction name as reported by the host
    pub name: String,
    /// Total render time attributed to the interaction, in milliseconds
    pub total_duration_ms: f64,
    /// Components touched by the interaction
    pub components: BTreeSet<String>,
}

/// Estimated impact of a recommendation or optimization opportunity.
///
/// Sorts high first, so ranked outputs can sort on this key directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Worth fixing promptly
    High,
    /// Worth scheduling
    Medium,
    /// Informational
    Low,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Which rule produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecommendationKind {
    /// Average render above the frame budget
    Memoize,
    /// Frequent re-renders within the recent history window
    FrequentRerender,
    /// Expensive first render
    CodeSplit,
    /// Large spread between fastest and slowest renders
    InconsistentTiming,
}

/// One per-component optimization recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Logical component identifier
    pub component_id: String,
    /// Rule that fired
    pub kind: RecommendationKind,
    /// Estimated impact
    pub impact: Impact,
    /// Human-readable guidance
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(duration: f64, phase: RenderPhase) -> RenderEvent {
        RenderEvent {
            component_id: "grid".to_string(),
            phase,
            actual_duration_ms: duration,
            base_duration_ms: duration,
            start_time_ms: 0.0,
            commit_time_ms: duration,
            interactions: vec![],
        }
    }

    #[test]
    fn test_aggregate_stats() {
        let mut agg = RenderAggregate::first(&event(10.0, RenderPhase::Mount), 16.0);
        agg.record(&event(20.0, RenderPhase::Update), 16.0);
        agg.record(&event(6.0, RenderPhase::Update), 16.0);

        assert_eq!(agg.total_renders, 3);
        assert_eq!(agg.min_duration_ms, 6.0);
        assert_eq!(agg.max_duration_ms, 20.0);
        assert_eq!(agg.first_duration_ms, 10.0);
        assert!((agg.average_duration_ms - 12.0).abs() < f64::EPSILON);
        assert!(!agg.is_slow);
    }

    #[test]
    fn test_recent_phases_bounded() {
        let mut agg = RenderAggregate::first(&event(1.0, RenderPhase::Mount), 16.0);
        for _ in 0..250 {
            agg.record(&event(1.0, RenderPhase::Update), 16.0);
        }
        assert_eq!(agg.recent_phases.len(), RECENT_PHASE_CAPACITY);
        // Oldest (the mount) was evicted first
        assert!(agg.recent_phases.iter().all(|p| *p == RenderPhase::Update));
    }

    #[test]
    fn test_slow_flag_tracks_latest_render() {
        let mut agg = RenderAggregate::first(&event(20.0, RenderPhase::Mount), 16.0);
        assert!(agg.is_slow);
        agg.record(&event(5.0, RenderPhase::Update), 16.0);
        assert!(!agg.is_slow);
    }

    #[test]
    fn test_impact_sort_order() {
        let mut impacts = vec![Impact::Low, Impact::High, Impact::Medium];
        impacts.sort();
        assert_eq!(impacts, vec![Impact::High, Impact::Medium, Impact::Low]);
    }
}
