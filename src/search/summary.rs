use super::RunStats;
use crate::graph::Thought;

/// Longest excerpt of a thought quoted in a summary.
const EXCERPT_CHARS: usize = 120;

/// Thoughts quoted in a summary.
pub const SUMMARY_TOP_THOUGHTS: usize = 3;

fn excerpt(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Human-readable digest of a finished run.
///
/// Built only from counters and the given thoughts (best first), so equal
/// inputs always give the same text.
pub fn build_summary(stats: &RunStats, ranked: &[&Thought]) -> String {
    let mut summary = format!(
        "Explored {} of {} thoughts to depth {}: {} pruned, {} aggregated",
        stats.thoughts_explored,
        stats.total_thoughts,
        stats.max_depth_reached,
        stats.thoughts_pruned,
        stats.aggregations_made,
    );

    let errors = stats.generation_errors + stats.evaluation_errors;
    if errors > 0 {
        summary.push_str(&format!(
            ", {} oracle errors ({} generation, {} evaluation)",
            errors, stats.generation_errors, stats.evaluation_errors
        ));
    }
    summary.push('.');

    if ranked.is_empty() {
        summary.push_str(" No thought was verified.");
        return summary;
    }

    summary.push_str(" Top thoughts:");
    for (rank, thought) in ranked.iter().take(SUMMARY_TOP_THOUGHTS).enumerate() {
        summary.push_str(&format!(
            "\n{}. [{:.2}] {}",
            rank + 1,
            thought.score.unwrap_or(0.0),
            excerpt(&thought.content)
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stats() -> RunStats {
        RunStats {
            total_thoughts: 9,
            thoughts_explored: 3,
            thoughts_pruned: 2,
            aggregations_made: 1,
            max_depth_reached: 2,
            generation_errors: 0,
            evaluation_errors: 0,
        }
    }

    #[test]
    fn test_summary_lists_top_three() {
        let thoughts: Vec<Thought> = [0.9, 0.8, 0.7, 0.6]
            .iter()
            .enumerate()
            .map(|(i, s)| Thought::new(format!("idea {}", i)).with_score(*s))
            .collect();
        let ranked: Vec<&Thought> = thoughts.iter().collect();

        assert_eq!(
            build_summary(&stats(), &ranked),
            "Explored 3 of 9 thoughts to depth 2: 2 pruned, 1 aggregated. Top thoughts:\n\
             1. [0.90] idea 0\n\
             2. [0.80] idea 1\n\
             3. [0.70] idea 2"
        );
    }

    #[test]
    fn test_summary_reports_errors_and_empty_result() {
        let mut stats = stats();
        stats.generation_errors = 3;

        assert_eq!(
            build_summary(&stats, &[]),
            "Explored 3 of 9 thoughts to depth 2: 2 pruned, 1 aggregated, \
             3 oracle errors (3 generation, 0 evaluation). No thought was verified."
        );
    }

    #[test]
    fn test_excerpt_truncates_and_flattens() {
        let long = format!("line one\n\n{}", "word ".repeat(60));
        let text = excerpt(&long);

        assert!(text.starts_with("line one word"));
        assert!(text.ends_with("..."));
        assert!(text.chars().count() <= EXCERPT_CHARS + 3);
    }
}
