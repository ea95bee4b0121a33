//! Storage layer for finished search runs.
//!
//! Persistence is optional and never touched by the search loop itself: a
//! caller hands a complete [`ReasoningOutcome`] to [`Storage::save_run`]
//! after `reason()` returns, and can read the run, its thoughts and its
//! edges back later.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::graph::{Edge, Thought};
use crate::search::{ReasoningOutcome, RunStats, Strategy};

/// Default number of runs returned by [`Storage::list_runs`].
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Summary row of a persisted run, without its graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    /// Unique run identifier.
    pub run_id: String,
    /// Problem the run started from.
    pub problem: String,
    /// Strategy that drove the run.
    pub strategy: Strategy,
    /// Final answer.
    pub answer: String,
    /// Confidence of the answer.
    pub confidence: f64,
    /// Deterministic digest of the run.
    pub reasoning_summary: String,
    /// Final counters.
    pub stats: RunStats,
    /// Best verified thoughts, highest score first.
    pub best_thought_ids: Vec<String>,
    /// Tokens consumed by the run.
    pub total_tokens: u64,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// When the run started.
    pub created_at: DateTime<Utc>,
}

impl From<&ReasoningOutcome> for StoredRun {
    fn from(outcome: &ReasoningOutcome) -> Self {
        let state = &outcome.graph_state;
        Self {
            run_id: state.run_id.clone(),
            problem: state.problem.clone(),
            strategy: state.strategy,
            answer: outcome.answer.clone(),
            confidence: outcome.confidence,
            reasoning_summary: outcome.reasoning_summary.clone(),
            stats: outcome.stats.clone(),
            best_thought_ids: state.best_thought_ids.clone(),
            total_tokens: state.total_tokens,
            duration_ms: state.duration_ms,
            created_at: state.created_at,
        }
    }
}

/// Storage trait for run persistence.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a run with all of its thoughts and edges atomically.
    async fn save_run(&self, outcome: &ReasoningOutcome) -> StorageResult<()>;

    /// Get a run by ID.
    async fn get_run(&self, run_id: &str) -> StorageResult<Option<StoredRun>>;

    /// Thoughts of a run in creation order.
    async fn get_run_thoughts(&self, run_id: &str) -> StorageResult<Vec<Thought>>;

    /// Edges of a run in creation order.
    async fn get_run_edges(&self, run_id: &str) -> StorageResult<Vec<Edge>>;

    /// Most recent runs first.
    async fn list_runs(&self, limit: u32) -> StorageResult<Vec<StoredRun>>;
}
