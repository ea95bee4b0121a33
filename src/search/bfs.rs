use tracing::debug;

use super::aggregation::aggregate;
use super::context::RunContext;
use super::events::SearchEvent;
use super::{RunStats, SearchConfig};
use crate::error::AppResult;
use crate::graph::TAG_FRONTIER_TRIMMED;

/// Thoughts merged when a frontier is aggregated.
const AGGREGATION_GROUP: usize = 3;

/// Breadth-first search over levels `0..max_depth`.
///
/// Each level expands every frontier thought, keeps the best
/// `2 * branching_factor` verified children and optionally replaces the
/// top of that frontier with a synthesis.
pub(crate) async fn run(
    ctx: &mut RunContext<'_>,
    stats: &mut RunStats,
    root_id: &str,
    config: &SearchConfig,
) -> AppResult<()> {
    let mut frontier = vec![root_id.to_string()];

    for depth in 0..config.max_depth {
        if frontier.is_empty() || ctx.at_capacity(config) {
            break;
        }

        ctx.emit(SearchEvent::DepthStarted {
            depth,
            frontier_size: frontier.len(),
        });
        debug!(depth, frontier = frontier.len(), "Expanding level");

        let mut next = Vec::new();
        for parent_id in &frontier {
            if ctx.at_capacity(config) {
                break;
            }
            next.extend(ctx.expand(stats, parent_id, config).await?);
        }

        ctx.sort_by_score_desc(&mut next);
        let width = config.frontier_width();
        if next.len() > width {
            for trimmed_id in next.split_off(width) {
                if let Some(thought) = ctx.graph.get_mut(&trimmed_id) {
                    thought.add_tag(TAG_FRONTIER_TRIMMED);
                }
                stats.thoughts_pruned += 1;
            }
        }
        debug_assert!(next.len() <= width);

        if next.len() >= 2 {
            let group: Vec<String> = next.iter().take(AGGREGATION_GROUP).cloned().collect();
            if let Some(synthesis_id) = aggregate(ctx, stats, &group, config).await? {
                next.retain(|id| !group.contains(id));
                next.push(synthesis_id);
                ctx.sort_by_score_desc(&mut next);
            }
        }

        frontier = next;
    }

    Ok(())
}
