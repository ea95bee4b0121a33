use tracing::{debug, warn};

use super::context::RunContext;
use super::events::SearchEvent;
use super::{RunStats, SearchConfig};
use crate::error::{AppResult, OracleError};
use crate::graph::{Edge, EdgeType, Thought, ThoughtState, TAG_GENERATION_ERROR};
use crate::oracle::{GeneratedCandidate, GenerationRequest};

/// Confidence assumed for a thought recovered from unstructured text.
const RAW_TEXT_CONFIDENCE: f64 = 0.7;

/// Weight of the edge linking a failure placeholder to its parent.
const FAILURE_EDGE_WEIGHT: f64 = 0.1;

/// Expand `parent_id` into up to `branching_factor` children.
///
/// Returns the ids of the new candidate thoughts. A failed or skipped
/// generation leaves a rejected `generation_error` placeholder instead and
/// returns no ids. Nothing is generated once the graph is at capacity.
pub(crate) async fn generate_children(
    ctx: &mut RunContext<'_>,
    stats: &mut RunStats,
    parent_id: &str,
    config: &SearchConfig,
) -> AppResult<Vec<String>> {
    let k = config.branching_factor.min(ctx.remaining_capacity(config));
    if k == 0 {
        return Ok(Vec::new());
    }

    let chain = ctx.graph.ancestor_chain(parent_id)?;
    let (parent, ancestors) = match chain.split_last() {
        Some(split) => split,
        None => return Ok(Vec::new()),
    };
    let child_depth = parent.depth + 1;
    let request = GenerationRequest {
        problem: ctx.problem.clone(),
        ancestor_chain: ancestors
            .iter()
            .filter(|t| !t.is_root())
            .map(|t| t.content.clone())
            .collect(),
        parent_content: parent.content.clone(),
        k,
    };

    debug!(parent_id = %parent_id, k, depth = child_depth, "Generating thoughts");

    let output = match ctx.oracle.generate(&request).await {
        Ok(output) => output,
        Err(e) => {
            record_failure(ctx, stats, parent_id, child_depth, &e)?;
            return Ok(Vec::new());
        }
    };

    let mut candidates: Vec<GeneratedCandidate> = output.candidates.into_iter().take(k).collect();
    if candidates.is_empty() && !output.raw_text.trim().is_empty() {
        debug!(parent_id = %parent_id, "No structured candidates, using raw text");
        candidates.push(GeneratedCandidate {
            content: output.raw_text.trim().to_string(),
            confidence: RAW_TEXT_CONFIDENCE,
        });
    }

    if candidates.is_empty() {
        let e = OracleError::InvalidResponse {
            message: "Oracle returned neither candidates nor text".to_string(),
        };
        record_failure(ctx, stats, parent_id, child_depth, &e)?;
        return Ok(Vec::new());
    }

    let mut created = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let thought = Thought::new(candidate.content)
            .with_parents(vec![parent_id.to_string()])
            .with_depth(child_depth)
            .with_confidence(candidate.confidence);
        let thought_id = ctx.graph.add_thought(thought)?.id.clone();
        ctx.graph.add_edge(Edge::new(parent_id, &thought_id))?;
        stats.record_thought(child_depth);

        ctx.emit(SearchEvent::ThoughtGenerated {
            thought_id: thought_id.clone(),
            parent_id: Some(parent_id.to_string()),
            depth: child_depth,
        });
        created.push(thought_id);
    }

    Ok(created)
}

/// Leave a visible, rejected placeholder for a failed generation.
fn record_failure(
    ctx: &mut RunContext<'_>,
    stats: &mut RunStats,
    parent_id: &str,
    depth: usize,
    error: &OracleError,
) -> AppResult<()> {
    let circuit_open = matches!(error, OracleError::CircuitOpen { .. });
    stats.generation_errors += 1;

    warn!(
        parent_id = %parent_id,
        error = %error,
        circuit_open,
        "Generation failed"
    );

    let placeholder = Thought::new(format!("Generation failed: {}", error))
        .with_parents(vec![parent_id.to_string()])
        .with_depth(depth)
        .with_state(ThoughtState::Rejected)
        .with_score(0.0)
        .with_tag(TAG_GENERATION_ERROR);
    let placeholder_id = ctx.graph.add_thought(placeholder)?.id.clone();
    ctx.graph.add_edge(
        Edge::new(parent_id, &placeholder_id)
            .with_type(EdgeType::Influences)
            .with_weight(FAILURE_EDGE_WEIGHT),
    )?;
    stats.record_thought(depth);

    ctx.emit(SearchEvent::GenerationFailed {
        parent_id: parent_id.to_string(),
        error: error.to_string(),
        circuit_open,
    });
    Ok(())
}
