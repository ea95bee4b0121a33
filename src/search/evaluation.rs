use tracing::{debug, warn};

use super::context::RunContext;
use super::events::SearchEvent;
use super::{RunStats, SearchConfig};
use crate::error::{AppError, AppResult};
use crate::graph::{clamp_unit, ThoughtState, TAG_DEAD_END, TAG_EVALUATION_ERROR};

/// Score `thought_id` against its primary parent and settle its state.
///
/// A failed evaluation scores 0 so it can never pass a positive prune
/// threshold. Returns whether the thought ended up verified.
pub(crate) async fn evaluate_thought(
    ctx: &mut RunContext<'_>,
    stats: &mut RunStats,
    thought_id: &str,
    config: &SearchConfig,
) -> AppResult<bool> {
    let thought = ctx.graph.require(thought_id)?;
    let thought_content = thought.content.clone();
    let parent_content = match thought.primary_parent() {
        Some(parent_id) => ctx.graph.require(parent_id)?.content.clone(),
        None => ctx.problem.clone(),
    };

    let (score, tag) = match ctx.oracle.evaluate(&parent_content, &thought_content).await {
        Ok(evaluation) => {
            let score = clamp_unit(evaluation.score);
            debug!(
                thought_id = %thought_id,
                score,
                should_continue = evaluation.should_continue,
                rationale = %evaluation.rationale,
                "Thought evaluated"
            );
            let tag = (!evaluation.should_continue).then_some(TAG_DEAD_END);
            (score, tag)
        }
        Err(e) => {
            warn!(thought_id = %thought_id, error = %e, "Evaluation failed, scoring 0");
            stats.evaluation_errors += 1;
            ctx.emit(SearchEvent::EvaluationFailed {
                thought_id: thought_id.to_string(),
                error: e.to_string(),
            });
            (0.0, Some(TAG_EVALUATION_ERROR))
        }
    };

    let state = if score >= config.prune_threshold {
        ThoughtState::Verified
    } else {
        stats.thoughts_pruned += 1;
        ThoughtState::Rejected
    };

    let thought = ctx
        .graph
        .get_mut(thought_id)
        .ok_or_else(|| AppError::Internal {
            message: format!("Thought {} disappeared during evaluation", thought_id),
        })?;
    thought.score = Some(score);
    thought.state = state;
    if let Some(tag) = tag {
        thought.add_tag(tag);
    }

    ctx.emit(SearchEvent::ThoughtScored {
        thought_id: thought_id.to_string(),
        score,
        state,
    });

    Ok(state == ThoughtState::Verified)
}
