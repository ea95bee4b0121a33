//! Integration tests for SQLite run storage
//!
//! Persists real engine outcomes into in-memory and on-disk databases.

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use langbase_got::config::DatabaseConfig;
use langbase_got::error::OracleResult;
use langbase_got::graph::EdgeType;
use langbase_got::oracle::{
    Evaluation, GeneratedCandidate, GenerationOutput, GenerationRequest, ReasoningOracle, Synthesis,
};
use langbase_got::search::{GotEngine, NoopObserver, ReasoningOutcome, SearchConfig, Strategy};
use langbase_got::storage::{SqliteStorage, Storage, StoredRun};

/// Oracle that always agrees, so runs produce a full graph.
struct AgreeableOracle;

#[async_trait]
impl ReasoningOracle for AgreeableOracle {
    async fn generate(&self, request: &GenerationRequest) -> OracleResult<GenerationOutput> {
        Ok(GenerationOutput {
            candidates: (0..request.k)
                .map(|i| GeneratedCandidate {
                    content: format!("{} / option {}", request.parent_content, i),
                    confidence: 0.6,
                })
                .collect(),
            raw_text: String::new(),
            tokens_used: 8,
        })
    }

    async fn evaluate(&self, _parent: &str, thought: &str) -> OracleResult<Evaluation> {
        Ok(Evaluation {
            score: if thought.ends_with('0') { 0.9 } else { 0.5 },
            should_continue: true,
            rationale: String::new(),
            tokens_used: 1,
        })
    }

    async fn aggregate(&self, contents: &[String]) -> OracleResult<Synthesis> {
        Ok(Synthesis {
            content: format!("merge of {}", contents.len()),
            confidence: 0.95,
            tokens_used: 3,
        })
    }
}

/// Create an in-memory storage instance for testing
async fn create_test_storage() -> SqliteStorage {
    SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage")
}

async fn run(problem: &str, strategy: Strategy) -> ReasoningOutcome {
    let config = SearchConfig {
        strategy,
        max_depth: 2,
        branching_factor: 2,
        ..Default::default()
    };
    GotEngine::new(Arc::new(AgreeableOracle))
        .with_observer(Arc::new(NoopObserver))
        .reason(problem, &config)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_save_and_get_run() {
    let storage = create_test_storage().await;
    let outcome = run("Where do rivers start?", Strategy::Bfs).await;

    storage.save_run(&outcome).await.unwrap();

    let stored = storage
        .get_run(&outcome.graph_state.run_id)
        .await
        .unwrap()
        .expect("run should exist");
    assert_eq!(stored, StoredRun::from(&outcome));
}

#[tokio::test]
async fn test_thoughts_and_edges_round_trip_in_order() {
    let storage = create_test_storage().await;
    let outcome = run("Where do rivers start?", Strategy::BestFirst).await;
    let run_id = &outcome.graph_state.run_id;

    storage.save_run(&outcome).await.unwrap();

    let thoughts = storage.get_run_thoughts(run_id).await.unwrap();
    let edges = storage.get_run_edges(run_id).await.unwrap();

    let ids: Vec<&str> = thoughts.iter().map(|t| t.id.as_str()).collect();
    let expected_ids: Vec<&str> = outcome
        .graph_state
        .thoughts
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ids, expected_ids);

    for (stored, original) in thoughts.iter().zip(&outcome.graph_state.thoughts) {
        assert_eq!(stored.state, original.state);
        assert_eq!(stored.score, original.score);
        assert_eq!(stored.parent_ids, original.parent_ids);
        assert_eq!(stored.child_ids, original.child_ids);
        assert_eq!(stored.tags, original.tags);
        assert_eq!(stored.origin, original.origin);
    }

    assert_eq!(edges.len(), outcome.graph_state.edges.len());
    assert_eq!(
        edges.iter().filter(|e| e.edge_type == EdgeType::Supports).count(),
        outcome
            .graph_state
            .edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Supports)
            .count()
    );
}

#[tokio::test]
async fn test_get_unknown_run() {
    let storage = create_test_storage().await;

    assert!(storage.get_run("missing").await.unwrap().is_none());
    assert!(storage.get_run_thoughts("missing").await.unwrap().is_empty());
    assert!(storage.get_run_edges("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_saving_same_run_twice_fails_atomically() {
    let storage = create_test_storage().await;
    let outcome = run("Duplicate", Strategy::Dfs).await;

    storage.save_run(&outcome).await.unwrap();
    assert!(storage.save_run(&outcome).await.is_err());

    let thoughts = storage
        .get_run_thoughts(&outcome.graph_state.run_id)
        .await
        .unwrap();
    assert_eq!(thoughts.len(), outcome.graph_state.thoughts.len());
}

#[tokio::test]
async fn test_list_runs_newest_first_with_limit() {
    let storage = create_test_storage().await;

    let mut run_ids = Vec::new();
    for (i, strategy) in [Strategy::Bfs, Strategy::Dfs, Strategy::BestFirst]
        .into_iter()
        .enumerate()
    {
        let mut outcome = run(&format!("problem {}", i), strategy).await;
        // Spread creation times so ordering does not depend on clock resolution.
        outcome.graph_state.created_at += chrono::Duration::seconds(i as i64);
        storage.save_run(&outcome).await.unwrap();
        run_ids.push(outcome.graph_state.run_id.clone());
    }

    let listed = storage.list_runs(2).await.unwrap();
    let listed_ids: Vec<&str> = listed.iter().map(|r| r.run_id.as_str()).collect();
    assert_eq!(listed_ids, vec![run_ids[2].as_str(), run_ids[1].as_str()]);
    assert_eq!(listed[0].strategy, Strategy::BestFirst);
}

#[tokio::test]
async fn test_file_storage_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("nested").join("runs.db"),
        max_connections: 2,
    };
    let outcome = run("Persist me", Strategy::Dfs).await;

    {
        let storage = SqliteStorage::new(&config).await.unwrap();
        storage.save_run(&outcome).await.unwrap();
    }

    let storage = SqliteStorage::new(&config).await.unwrap();
    let stored = storage
        .get_run(&outcome.graph_state.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.problem, "Persist me");
    assert_eq!(stored.answer, outcome.answer);
}
