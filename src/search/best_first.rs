use tracing::debug;

use super::aggregation::aggregate;
use super::context::RunContext;
use super::{RunStats, SearchConfig};
use crate::error::AppResult;
use crate::graph::ThoughtState;

/// Thoughts merged when the open set is aggregated.
const AGGREGATION_GROUP: usize = 3;

/// Open set kept in descending score order.
///
/// Insertion binary-searches the position instead of re-sorting. Equal
/// scores keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct OpenSet {
    entries: Vec<(f64, String)>,
}

impl OpenSet {
    /// Create an empty open set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a thought at its sorted position
    pub fn insert(&mut self, thought_id: impl Into<String>, score: f64) {
        let position = self.entries.partition_point(|(s, _)| *s >= score);
        self.entries.insert(position, (score, thought_id.into()));
    }

    /// Remove and return the highest-scoring thought
    pub fn pop_best(&mut self) -> Option<(String, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let (score, id) = self.entries.remove(0);
        Some((id, score))
    }

    /// Ids of the `n` highest-scoring thoughts
    pub fn top_ids(&self, n: usize) -> Vec<String> {
        self.entries.iter().take(n).map(|(_, id)| id.clone()).collect()
    }

    /// Drop every entry whose id is in `ids`
    pub fn remove_all(&mut self, ids: &[String]) {
        self.entries.retain(|(_, id)| !ids.contains(id));
    }

    /// Number of open thoughts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is left to expand
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scores in stored order
    pub fn scores(&self) -> Vec<f64> {
        self.entries.iter().map(|(s, _)| *s).collect()
    }
}

/// Best-first search: repeatedly expand the highest-scoring open thought.
pub(crate) async fn run(
    ctx: &mut RunContext<'_>,
    stats: &mut RunStats,
    root_id: &str,
    config: &SearchConfig,
) -> AppResult<()> {
    let mut open = OpenSet::new();
    open.insert(root_id, ctx.score_of(root_id));

    while let Some((thought_id, score)) = open.pop_best() {
        if ctx.at_capacity(config) {
            break;
        }

        let thought = ctx.graph.require(&thought_id)?;
        if thought.state != ThoughtState::Verified || thought.depth >= config.max_depth {
            continue;
        }
        debug!(thought_id = %thought_id, score, open = open.len(), "Expanding best thought");

        for child_id in ctx.expand(stats, &thought_id, config).await? {
            let child_score = ctx.score_of(&child_id);
            open.insert(child_id, child_score);
        }

        if config.enable_aggregation && open.len() >= AGGREGATION_GROUP {
            let group = open.top_ids(AGGREGATION_GROUP);
            if let Some(synthesis_id) = aggregate(ctx, stats, &group, config).await? {
                open.remove_all(&group);
                let synthesis_score = ctx.score_of(&synthesis_id);
                open.insert(synthesis_id, synthesis_score);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_descending(scores: &[f64]) -> bool {
        scores.windows(2).all(|w| w[0] >= w[1])
    }

    #[test]
    fn test_pop_best_returns_highest() {
        let mut open = OpenSet::new();
        open.insert("a", 0.4);
        open.insert("b", 0.9);
        open.insert("c", 0.6);

        assert_eq!(open.pop_best(), Some(("b".to_string(), 0.9)));
        assert_eq!(open.pop_best(), Some(("c".to_string(), 0.6)));
        assert_eq!(open.pop_best(), Some(("a".to_string(), 0.4)));
        assert_eq!(open.pop_best(), None);
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let mut open = OpenSet::new();
        open.insert("first", 0.5);
        open.insert("second", 0.5);
        open.insert("third", 0.5);

        assert_eq!(open.top_ids(3), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_remove_all() {
        let mut open = OpenSet::new();
        for (id, score) in [("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 0.4)] {
            open.insert(id, score);
        }
        open.remove_all(&["d".to_string(), "b".to_string()]);

        assert_eq!(open.top_ids(10), vec!["c", "a"]);
        assert_eq!(open.len(), 2);
    }

    #[test]
    fn test_insertion_keeps_descending_order_for_arbitrary_sequences() {
        // Linear congruential generator so the sequences are reproducible.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = || {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (seed >> 33) as f64 / (1u64 << 31) as f64
        };

        for round in 0..50 {
            let mut open = OpenSet::new();
            for i in 0..(round + 1) * 3 {
                // Coarse buckets force plenty of ties.
                let score = (next() * 10.0).floor() / 10.0;
                open.insert(format!("t{}", i), score);
                assert!(is_descending(&open.scores()), "round {} step {}", round, i);

                if i % 4 == 3 {
                    open.pop_best();
                    assert!(is_descending(&open.scores()));
                }
            }
        }
    }
}
