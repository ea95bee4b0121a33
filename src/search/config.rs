use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::error::{AppResult, ToolError};

/// Largest accepted `max_depth`.
pub const MAX_DEPTH_LIMIT: usize = 50;
/// Largest accepted `branching_factor`.
pub const MAX_BRANCHING_FACTOR: usize = 10;
/// Largest accepted `max_thoughts`.
pub const MAX_THOUGHTS_LIMIT: usize = 10_000;

/// Immutable configuration of a single search run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Exploration order
    #[serde(default)]
    pub strategy: Strategy,
    /// Deepest level that may be generated
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Children requested per expansion
    #[serde(default = "default_branching_factor")]
    pub branching_factor: usize,
    /// Score below which a thought is rejected
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,
    /// Hard cap on graph size, root included
    #[serde(default = "default_max_thoughts")]
    pub max_thoughts: usize,
    /// Whether sibling thoughts may be synthesized
    #[serde(default = "default_enable_aggregation")]
    pub enable_aggregation: bool,
}

fn default_max_depth() -> usize {
    5
}

fn default_branching_factor() -> usize {
    3
}

fn default_prune_threshold() -> f64 {
    0.3
}

fn default_max_thoughts() -> usize {
    100
}

fn default_enable_aggregation() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_depth: default_max_depth(),
            branching_factor: default_branching_factor(),
            prune_threshold: default_prune_threshold(),
            max_thoughts: default_max_thoughts(),
            enable_aggregation: default_enable_aggregation(),
        }
    }
}

fn invalid(field: &str, reason: String) -> AppResult<()> {
    Err(ToolError::Validation {
        field: field.to_string(),
        reason,
    }
    .into())
}

impl SearchConfig {
    /// Config with the given strategy and default limits
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Reject out-of-range values before a run starts
    pub fn validate(&self) -> AppResult<()> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return invalid(
                "max_depth",
                format!("must be between 1 and {}", MAX_DEPTH_LIMIT),
            );
        }
        if self.branching_factor == 0 || self.branching_factor > MAX_BRANCHING_FACTOR {
            return invalid(
                "branching_factor",
                format!("must be between 1 and {}", MAX_BRANCHING_FACTOR),
            );
        }
        if !self.prune_threshold.is_finite() || !(0.0..=1.0).contains(&self.prune_threshold) {
            return invalid("prune_threshold", "must be within [0, 1]".to_string());
        }
        if self.max_thoughts == 0 || self.max_thoughts > MAX_THOUGHTS_LIMIT {
            return invalid(
                "max_thoughts",
                format!("must be between 1 and {}", MAX_THOUGHTS_LIMIT),
            );
        }
        Ok(())
    }

    /// Frontier size kept after a breadth-first level is trimmed
    pub fn frontier_width(&self) -> usize {
        self.branching_factor * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_defaults_are_valid() {
        let config = SearchConfig::default();
        assert_eq!(config.strategy, Strategy::Bfs);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.branching_factor, 3);
        assert_eq!(config.max_thoughts, 100);
        assert!(config.enable_aggregation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"strategy": "best_first", "max_depth": 2}"#).unwrap();
        assert_eq!(config.strategy, Strategy::BestFirst);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.branching_factor, 3);
        assert!((config.prune_threshold - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_rejects_unknown_strategy() {
        assert!(serde_json::from_str::<SearchConfig>(r#"{"strategy": "random_walk"}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let cases = [
            SearchConfig {
                max_depth: 0,
                ..Default::default()
            },
            SearchConfig {
                branching_factor: 0,
                ..Default::default()
            },
            SearchConfig {
                branching_factor: MAX_BRANCHING_FACTOR + 1,
                ..Default::default()
            },
            SearchConfig {
                prune_threshold: 1.5,
                ..Default::default()
            },
            SearchConfig {
                prune_threshold: f64::NAN,
                ..Default::default()
            },
            SearchConfig {
                max_thoughts: 0,
                ..Default::default()
            },
        ];

        for config in cases {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, AppError::Config { .. }), "{:?}", config);
        }
    }

    #[test]
    fn test_frontier_width() {
        let config = SearchConfig {
            branching_factor: 4,
            ..Default::default()
        };
        assert_eq!(config.frontier_width(), 8);
    }
}
