use tracing::{debug, warn};

use super::context::RunContext;
use super::events::SearchEvent;
use super::{RunStats, SearchConfig};
use crate::error::AppResult;
use crate::graph::{Edge, EdgeType, Thought, ThoughtOrigin, ThoughtState};

/// Merge `source_ids` into one verified synthesis thought.
///
/// Skipped when aggregation is disabled, with fewer than two sources, or
/// at capacity. A failed oracle call creates nothing and is not fatal.
/// Returns the synthesis id when one was created.
pub(crate) async fn aggregate(
    ctx: &mut RunContext<'_>,
    stats: &mut RunStats,
    source_ids: &[String],
    config: &SearchConfig,
) -> AppResult<Option<String>> {
    if !config.enable_aggregation || source_ids.len() < 2 || ctx.at_capacity(config) {
        return Ok(None);
    }

    let mut contents = Vec::with_capacity(source_ids.len());
    let mut depth = 0;
    for source_id in source_ids {
        let source = ctx.graph.require(source_id)?;
        contents.push(source.content.clone());
        depth = depth.max(source.depth);
    }

    debug!(sources = source_ids.len(), "Aggregating thoughts");

    let synthesis = match ctx.oracle.aggregate(&contents).await {
        Ok(synthesis) => synthesis,
        Err(e) => {
            warn!(error = %e, sources = source_ids.len(), "Aggregation failed");
            ctx.emit(SearchEvent::AggregationFailed {
                source_ids: source_ids.to_vec(),
                error: e.to_string(),
            });
            return Ok(None);
        }
    };

    let thought = Thought::new(synthesis.content)
        .with_origin(ThoughtOrigin::Aggregation)
        .with_parents(source_ids.to_vec())
        .with_depth(depth)
        .with_state(ThoughtState::Verified)
        .with_score(synthesis.confidence)
        .with_confidence(synthesis.confidence);
    let thought_id = ctx.graph.add_thought(thought)?.id.clone();

    for source_id in source_ids {
        ctx.graph
            .add_edge(Edge::new(source_id.as_str(), &thought_id).with_type(EdgeType::Supports))?;
        if let Some(source) = ctx.graph.get_mut(source_id) {
            source.state = ThoughtState::Aggregated;
        }
    }

    stats.record_thought(depth);
    stats.aggregations_made += 1;

    ctx.emit(SearchEvent::AggregationComplete {
        thought_id: thought_id.clone(),
        source_ids: source_ids.to_vec(),
    });

    Ok(Some(thought_id))
}
