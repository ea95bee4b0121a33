//! Progress notifications emitted synchronously during a run.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::RunStats;
use crate::graph::ThoughtState;

/// A notable step of a search run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SearchEvent {
    /// A thought was added to the graph.
    ThoughtGenerated {
        thought_id: String,
        parent_id: Option<String>,
        depth: usize,
    },
    /// A thought received its score and state.
    ThoughtScored {
        thought_id: String,
        score: f64,
        state: ThoughtState,
    },
    /// Several thoughts were merged into a synthesis.
    AggregationComplete {
        thought_id: String,
        source_ids: Vec<String>,
    },
    /// A breadth-first level began.
    DepthStarted { depth: usize, frontier_size: usize },
    /// Generation failed or was skipped by the open circuit.
    GenerationFailed {
        parent_id: String,
        error: String,
        circuit_open: bool,
    },
    /// Evaluation failed; the thought was scored 0.
    EvaluationFailed { thought_id: String, error: String },
    /// Aggregation failed; nothing was created.
    AggregationFailed {
        source_ids: Vec<String>,
        error: String,
    },
    /// Counters after an expansion.
    ProgressSnapshot { stats: RunStats },
}

/// Receiver of [`SearchEvent`]s.
///
/// Called inline on the search task; implementations should not block.
pub trait ProgressObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &SearchEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: &SearchEvent) {}
}

/// Logs every event at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&self, event: &SearchEvent) {
        match event {
            SearchEvent::ProgressSnapshot { stats } => debug!(
                total = stats.total_thoughts,
                explored = stats.thoughts_explored,
                pruned = stats.thoughts_pruned,
                "Search progress"
            ),
            other => debug!(event = ?other, "Search event"),
        }
    }
}

impl ProgressObserver for UnboundedSender<SearchEvent> {
    fn on_event(&self, event: &SearchEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_observer_forwards_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let event = SearchEvent::DepthStarted {
            depth: 1,
            frontier_size: 4,
        };

        tx.on_event(&event);
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_channel_observer_ignores_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<SearchEvent>();
        drop(rx);
        tx.on_event(&SearchEvent::DepthStarted {
            depth: 0,
            frontier_size: 1,
        });
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = SearchEvent::EvaluationFailed {
            thought_id: "t-1".to_string(),
            error: "timeout".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "evaluation_failed");
        assert_eq!(value["thought_id"], "t-1");
    }
}
