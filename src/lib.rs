//! # Langbase Graph-of-Thoughts
//!
//! A Graph-of-Thoughts search engine that explores a problem by growing a
//! graph of scored "thoughts". Thought content and scores come from an
//! external reasoning oracle (Langbase Pipes); this crate schedules, bounds,
//! prunes and merges the search and contains oracle failures.
//!
//! ## Features
//!
//! - **Breadth-first**: level-by-level expansion with a trimmed frontier
//! - **Depth-first**: follow the best child of each thought to maximum depth
//! - **Best-first**: always expand the highest-scoring open thought
//! - **Aggregation**: merge strong sibling thoughts into one synthesis
//! - **Resilience**: per-run circuit breaker and bounded retry with backoff
//! - **Persistence**: optional SQLite storage of finished runs
//!
//! ## Architecture
//!
//! ```text
//! CLI → GotEngine → ReasoningOracle → Langbase Pipes (HTTP)
//!          ↓
//!    ThoughtGraph (per run)      SQLite (optional, after the run)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use langbase_got::{Config, GotEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let engine = GotEngine::from_config(&config)?;
//!     let outcome = engine.reason("Why is the sky blue?", &config.search).await?;
//!     println!("{} ({:.2})", outcome.answer, outcome.confidence);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Thought and edge data model plus the run-scoped graph store.
pub mod graph;
/// Langbase API client and types for pipe communication.
pub mod langbase;
/// The reasoning oracle capability and its Langbase implementation.
pub mod oracle;
/// System prompts for Langbase pipes.
pub mod prompts;
/// Circuit breaker and retry policy for oracle calls.
pub mod resilience;
/// The Graph-of-Thoughts search engine.
pub mod search;
/// SQLite storage layer for finished runs.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use search::{GotEngine, ReasoningOutcome, SearchConfig, Strategy};
