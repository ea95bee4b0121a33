use tracing::debug;

use super::context::RunContext;
use super::{RunStats, SearchConfig};
use crate::error::AppResult;

/// Depth-first search following only the best verified child.
///
/// When a thought yields no verified child the descent stops there; no
/// sibling is revisited. The descent is an explicit loop, so its depth is
/// bounded by `max_depth` rather than by the call stack.
pub(crate) async fn run(
    ctx: &mut RunContext<'_>,
    stats: &mut RunStats,
    root_id: &str,
    config: &SearchConfig,
) -> AppResult<()> {
    let mut current = root_id.to_string();
    let mut level = 0;

    while level < config.max_depth && !ctx.at_capacity(config) {
        debug_assert_eq!(ctx.graph.require(&current)?.depth, level);

        let verified = ctx.expand(stats, &current, config).await?;
        match verified.into_iter().next() {
            Some(best) => {
                current = best;
                level += 1;
            }
            None => {
                debug!(thought_id = %current, level, "No verified child, backtracking");
                break;
            }
        }
    }

    debug_assert!(level <= config.max_depth);
    Ok(())
}
