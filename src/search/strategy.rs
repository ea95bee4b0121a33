use serde::{Deserialize, Serialize};

use super::context::RunContext;
use super::{best_first, bfs, dfs, RunStats, SearchConfig};
use crate::error::AppResult;

/// Order in which the search expands thoughts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Level by level, keeping a trimmed frontier.
    #[default]
    Bfs,
    /// Follow the best child of each thought to maximum depth.
    Dfs,
    /// Always expand the highest-scoring open thought.
    BestFirst,
}

impl Strategy {
    /// Drive the search from `root_id` until a limit or an empty frontier.
    pub async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        stats: &mut RunStats,
        root_id: &str,
        config: &SearchConfig,
    ) -> AppResult<()> {
        match self {
            Strategy::Bfs => bfs::run(ctx, stats, root_id, config).await,
            Strategy::Dfs => dfs::run(ctx, stats, root_id, config).await,
            Strategy::BestFirst => best_first::run(ctx, stats, root_id, config).await,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Bfs => write!(f, "bfs"),
            Strategy::Dfs => write!(f, "dfs"),
            Strategy::BestFirst => write!(f, "best_first"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bfs" | "breadth_first" | "breadth-first" => Ok(Strategy::Bfs),
            "dfs" | "depth_first" | "depth-first" => Ok(Strategy::Dfs),
            "best_first" | "best-first" | "bestfirst" => Ok(Strategy::BestFirst),
            _ => Err(format!("Unknown search strategy: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_strategy_round_trips_through_display() {
        for strategy in [Strategy::Bfs, Strategy::Dfs, Strategy::BestFirst] {
            assert_eq!(Strategy::from_str(&strategy.to_string()), Ok(strategy));
        }
    }

    #[test]
    fn test_strategy_aliases() {
        assert_eq!(Strategy::from_str("Breadth-First"), Ok(Strategy::Bfs));
        assert_eq!(Strategy::from_str(" depth_first "), Ok(Strategy::Dfs));
        assert_eq!(Strategy::from_str("best-first"), Ok(Strategy::BestFirst));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = Strategy::from_str("random_walk").unwrap_err();
        assert!(err.contains("random_walk"));
    }

    #[test]
    fn test_strategy_serde_names() {
        assert_eq!(
            serde_json::to_string(&Strategy::BestFirst).unwrap(),
            "\"best_first\""
        );
    }
}
