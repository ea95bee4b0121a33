//! Graph-of-Thoughts search engine.
//!
//! [`GotEngine::reason`] grows a [`ThoughtGraph`](crate::graph::ThoughtGraph)
//! from a root problem by repeatedly asking the reasoning oracle to
//! generate, evaluate and aggregate thoughts. The order of expansion is
//! chosen by [`Strategy`]:
//!
//! - **bfs**: level by level, keeping the best `2 * branching_factor`
//!   verified thoughts per level
//! - **dfs**: follow the single best child of each thought to maximum depth
//! - **best_first**: always expand the highest-scoring open thought
//!
//! Oracle failures never abort a run. They show up as rejected thoughts
//! tagged `generation_error` or `evaluation_error` and in [`RunStats`].

mod aggregation;
mod best_first;
mod bfs;
mod config;
mod context;
mod dfs;
mod engine;
mod evaluation;
mod events;
mod generation;
mod stats;
mod strategy;
mod summary;


pub use best_first::OpenSet;
pub use config::{SearchConfig, MAX_BRANCHING_FACTOR, MAX_DEPTH_LIMIT, MAX_THOUGHTS_LIMIT};
pub use context::{OracleHandle, RunContext};
pub use engine::{GotEngine, GraphReasoningState, ReasoningOutcome, BEST_THOUGHTS, NO_CONCLUSION};
pub use events::{NoopObserver, ProgressObserver, SearchEvent, TracingObserver};
pub use stats::RunStats;
pub use strategy::Strategy;
pub use summary::{build_summary, SUMMARY_TOP_THOUGHTS};
