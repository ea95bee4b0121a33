use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use super::context::{OracleHandle, RunContext};
use super::events::{ProgressObserver, SearchEvent, TracingObserver};
use super::summary::build_summary;
use super::{RunStats, SearchConfig, Strategy};
use crate::config::{Config, ResilienceConfig};
use crate::error::{AppResult, ToolError};
use crate::graph::{Edge, Thought};
use crate::langbase::LangbaseClient;
use crate::oracle::{LangbaseOracle, ReasoningOracle};

/// Answer reported when no thought was verified.
pub const NO_CONCLUSION: &str = "Unable to reach a conclusion.";

/// Number of ids kept in [`GraphReasoningState::best_thought_ids`].
pub const BEST_THOUGHTS: usize = 5;

/// Default per-call timeout when none is configured.
const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

/// The complete graph of one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphReasoningState {
    /// Unique run identifier.
    pub run_id: String,
    /// Problem the run started from.
    pub problem: String,
    /// Strategy that drove the run.
    pub strategy: Strategy,
    /// Every thought, in creation order.
    pub thoughts: Vec<Thought>,
    /// Every edge, in creation order.
    pub edges: Vec<Edge>,
    /// Best verified thoughts, highest score first.
    pub best_thought_ids: Vec<String>,
    /// Tokens consumed by successful oracle calls.
    pub total_tokens: u64,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// When the run started.
    pub created_at: DateTime<Utc>,
}

/// Result of [`GotEngine::reason`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningOutcome {
    /// Content of the best verified thought, or [`NO_CONCLUSION`].
    pub answer: String,
    /// Score of the answer thought, 0 when there is none.
    pub confidence: f64,
    /// The run's graph.
    pub graph_state: GraphReasoningState,
    /// Final counters.
    pub stats: RunStats,
    /// Deterministic digest of the run.
    pub reasoning_summary: String,
}

/// Graph-of-Thoughts search engine.
///
/// The engine holds no per-run state: every [`reason`](Self::reason) call
/// builds its own graph, circuit breaker and counters, so concurrent runs on
/// one engine never share failure streaks.
#[derive(Clone)]
pub struct GotEngine {
    oracle: Arc<dyn ReasoningOracle>,
    resilience: ResilienceConfig,
    call_timeout: Duration,
    observer: Arc<dyn ProgressObserver>,
}

impl GotEngine {
    /// Engine over `oracle` with default resilience settings
    pub fn new(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self {
            oracle,
            resilience: ResilienceConfig::default(),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Engine backed by Langbase pipes, configured from `config`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = LangbaseClient::new(&config.langbase, config.request.clone())?;
        let oracle = LangbaseOracle::new(client, config.pipes.clone());

        Ok(Self::new(Arc::new(oracle))
            .with_resilience(config.resilience.clone())
            .with_call_timeout(Duration::from_millis(config.request.timeout_ms)))
    }

    /// Set circuit breaker and retry settings
    pub fn with_resilience(mut self, resilience: ResilienceConfig) -> Self {
        self.resilience = resilience;
        self
    }

    /// Set the per-call oracle timeout
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Set the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one search for `problem`.
    ///
    /// Only configuration problems are returned as errors. Oracle failures
    /// are recorded in the graph and the counters, and a run in which no
    /// thought is verified still succeeds with [`NO_CONCLUSION`].
    pub async fn reason(&self, problem: &str, config: &SearchConfig) -> AppResult<ReasoningOutcome> {
        config.validate()?;
        let problem = problem.trim();
        if problem.is_empty() {
            return Err(ToolError::Validation {
                field: "problem".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        let run_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let started = Instant::now();

        info!(
            run_id = %run_id,
            strategy = %config.strategy,
            max_depth = config.max_depth,
            branching_factor = config.branching_factor,
            max_thoughts = config.max_thoughts,
            "Starting graph-of-thoughts run"
        );

        let handle = OracleHandle::new(self.oracle.as_ref(), &self.resilience, self.call_timeout);
        let mut ctx = RunContext::new(problem, handle, self.observer.as_ref());
        let mut stats = RunStats::default();

        let root_id = ctx.graph.add_thought(Thought::root(problem))?.id.clone();
        stats.record_thought(0);
        ctx.emit(SearchEvent::ThoughtGenerated {
            thought_id: root_id.clone(),
            parent_id: None,
            depth: 0,
        });

        config.strategy.run(&mut ctx, &mut stats, &root_id, config).await?;
        debug_assert_eq!(stats.total_thoughts, ctx.graph.len());

        if ctx.oracle.breaker().is_open() {
            warn!(run_id = %run_id, "Run finished with the circuit breaker open");
        }

        let (answer, confidence, best_thought_ids, reasoning_summary) = {
            let ranked: Vec<&Thought> = ctx
                .graph
                .ranked_verified()
                .into_iter()
                .filter(|t| !t.is_root())
                .collect();

            let (answer, confidence) = match ranked.first() {
                Some(best) => (best.content.clone(), best.score.unwrap_or(0.0)),
                // Nothing beyond the root was ever created.
                None if ctx.graph.len() == 1 => (problem.to_string(), 1.0),
                None => (NO_CONCLUSION.to_string(), 0.0),
            };

            let best_ids: Vec<String> = if ranked.is_empty() && ctx.graph.len() == 1 {
                vec![root_id.clone()]
            } else {
                ranked.iter().take(BEST_THOUGHTS).map(|t| t.id.clone()).collect()
            };

            (answer, confidence, best_ids, build_summary(&stats, &ranked))
        };

        let total_tokens = ctx.oracle.tokens_used();
        let duration_ms = started.elapsed().as_millis() as u64;
        let (thoughts, edges) = ctx.graph.into_parts();

        info!(
            run_id = %run_id,
            total_thoughts = stats.total_thoughts,
            explored = stats.thoughts_explored,
            pruned = stats.thoughts_pruned,
            aggregations = stats.aggregations_made,
            generation_errors = stats.generation_errors,
            evaluation_errors = stats.evaluation_errors,
            confidence,
            total_tokens,
            duration_ms,
            "Graph-of-thoughts run completed"
        );

        Ok(ReasoningOutcome {
            answer,
            confidence,
            graph_state: GraphReasoningState {
                run_id,
                problem: problem.to_string(),
                strategy: config.strategy,
                thoughts,
                edges,
                best_thought_ids,
                total_tokens,
                duration_ms,
                created_at,
            },
            stats,
            reasoning_summary,
        })
    }
}
