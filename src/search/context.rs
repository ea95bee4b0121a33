//! Run-scoped state shared by the search steps.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::events::{ProgressObserver, SearchEvent};
use super::{RunStats, SearchConfig};
use crate::config::ResilienceConfig;
use crate::error::{AppResult, OracleError, OracleResult};
use crate::graph::ThoughtGraph;
use crate::oracle::{Evaluation, GenerationOutput, GenerationRequest, ReasoningOracle, Synthesis};
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Oracle access acquired for the duration of one run.
///
/// Owns the run's circuit breaker so failure streaks never leak between
/// runs, and bounds every call with the per-call timeout.
pub struct OracleHandle<'a> {
    oracle: &'a dyn ReasoningOracle,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    call_timeout: Duration,
    tokens_used: u64,
}

async fn bounded<T>(
    call_timeout: Duration,
    call: impl Future<Output = OracleResult<T>>,
) -> OracleResult<T> {
    match tokio::time::timeout(call_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout {
            timeout_ms: call_timeout.as_millis() as u64,
        }),
    }
}

impl<'a> OracleHandle<'a> {
    /// Acquire a handle with a fresh, closed circuit breaker
    pub fn new(
        oracle: &'a dyn ReasoningOracle,
        resilience: &ResilienceConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            breaker: CircuitBreaker::from_config(resilience),
            retry: RetryPolicy::from_config(resilience),
            call_timeout,
            tokens_used: 0,
        }
    }

    /// Generate candidates through the circuit breaker and retry policy.
    ///
    /// While the breaker is open the oracle is not called at all.
    pub async fn generate(&mut self, request: &GenerationRequest) -> OracleResult<GenerationOutput> {
        if let Some(remaining) = self.breaker.remaining() {
            return Err(OracleError::CircuitOpen {
                remaining_ms: remaining.as_millis() as u64,
            });
        }

        let oracle = self.oracle;
        let call_timeout = self.call_timeout;
        let (result, retries) = self
            .retry
            .run("generate", || bounded(call_timeout, oracle.generate(request)))
            .await;

        match &result {
            Ok(output) => {
                self.breaker.record_success();
                self.tokens_used += output.tokens_used;
                if retries > 0 {
                    debug!(retries, "Generation succeeded after retry");
                }
            }
            Err(_) => self.breaker.record_failure(),
        }
        result
    }

    /// Score a thought; a single bounded attempt
    pub async fn evaluate(&mut self, parent_content: &str, thought_content: &str) -> OracleResult<Evaluation> {
        let result = bounded(
            self.call_timeout,
            self.oracle.evaluate(parent_content, thought_content),
        )
        .await;
        if let Ok(evaluation) = &result {
            self.tokens_used += evaluation.tokens_used;
        }
        result
    }

    /// Synthesize thoughts; a single bounded attempt
    pub async fn aggregate(&mut self, contents: &[String]) -> OracleResult<Synthesis> {
        let result = bounded(self.call_timeout, self.oracle.aggregate(contents)).await;
        if let Ok(synthesis) = &result {
            self.tokens_used += synthesis.tokens_used;
        }
        result
    }

    /// The run's circuit breaker
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Tokens consumed by successful calls so far
    pub fn tokens_used(&self) -> u64 {
        self.tokens_used
    }
}

/// Everything a strategy needs while a run is in progress.
pub struct RunContext<'a> {
    /// The root problem statement.
    pub problem: String,
    /// The run's thought graph.
    pub graph: ThoughtGraph,
    /// Run-scoped oracle access.
    pub oracle: OracleHandle<'a>,
    observer: &'a dyn ProgressObserver,
}

impl<'a> RunContext<'a> {
    /// Start a run with an empty graph
    pub fn new(
        problem: impl Into<String>,
        oracle: OracleHandle<'a>,
        observer: &'a dyn ProgressObserver,
    ) -> Self {
        Self {
            problem: problem.into(),
            graph: ThoughtGraph::new(),
            oracle,
            observer,
        }
    }

    /// Notify the observer
    pub fn emit(&self, event: SearchEvent) {
        self.observer.on_event(&event);
    }

    /// Room left under `max_thoughts`
    pub fn remaining_capacity(&self, config: &SearchConfig) -> usize {
        config.max_thoughts.saturating_sub(self.graph.len())
    }

    /// Whether the graph has reached `max_thoughts`
    pub fn at_capacity(&self, config: &SearchConfig) -> bool {
        self.remaining_capacity(config) == 0
    }

    /// Score of a thought, 0 when unscored or missing
    pub fn score_of(&self, thought_id: &str) -> f64 {
        self.graph
            .get(thought_id)
            .and_then(|t| t.score)
            .unwrap_or(0.0)
    }

    /// Generate children of `parent_id`, evaluate each, and return the
    /// verified ones ordered by descending score.
    pub async fn expand(
        &mut self,
        stats: &mut RunStats,
        parent_id: &str,
        config: &SearchConfig,
    ) -> AppResult<Vec<String>> {
        stats.thoughts_explored += 1;

        let children = super::generation::generate_children(self, stats, parent_id, config).await?;

        let mut verified = Vec::with_capacity(children.len());
        for child_id in children {
            if super::evaluation::evaluate_thought(self, stats, &child_id, config).await? {
                verified.push(child_id);
            }
        }

        self.sort_by_score_desc(&mut verified);
        self.emit(SearchEvent::ProgressSnapshot {
            stats: stats.clone(),
        });
        Ok(verified)
    }

    /// Stable sort of thought ids by descending score
    pub fn sort_by_score_desc(&self, ids: &mut [String]) {
        ids.sort_by(|a, b| {
            self.score_of(b)
                .partial_cmp(&self.score_of(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
