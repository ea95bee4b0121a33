use serde::{Deserialize, Serialize};

/// Counters maintained by the search controller for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Thoughts in the graph, root and failure placeholders included.
    pub total_thoughts: usize,
    /// Thoughts that were expanded.
    pub thoughts_explored: usize,
    /// Thoughts rejected at evaluation or trimmed from a frontier.
    pub thoughts_pruned: usize,
    /// Successful syntheses.
    pub aggregations_made: usize,
    /// Deepest thought created.
    pub max_depth_reached: usize,
    /// Failed or skipped generation calls.
    pub generation_errors: usize,
    /// Failed evaluation calls.
    pub evaluation_errors: usize,
}

impl RunStats {
    /// Account for a thought added to the graph
    pub fn record_thought(&mut self, depth: usize) {
        self.total_thoughts += 1;
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_thought_tracks_depth() {
        let mut stats = RunStats::default();
        stats.record_thought(0);
        stats.record_thought(3);
        stats.record_thought(1);

        assert_eq!(stats.total_thoughts, 3);
        assert_eq!(stats.max_depth_reached, 3);
    }
}
