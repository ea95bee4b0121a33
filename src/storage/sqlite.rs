use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{Storage, StoredRun};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::graph::{Edge, Thought};
use crate::search::ReasoningOutcome;

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database file and run migrations
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());
        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Private in-memory database, mostly for tests.
    ///
    /// Limited to one connection that is never recycled, since every
    /// SQLite in-memory connection is a separate database.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> StorageResult<String> {
    serde_json::to_string(value).map_err(|e| StorageError::Query {
        message: format!("Failed to encode column: {}", e),
    })
}

fn from_json<T: serde::de::DeserializeOwned>(column: &str, value: &str) -> StorageResult<T> {
    serde_json::from_str(value).map_err(|e| StorageError::Query {
        message: format!("Corrupt {} column: {}", column, e),
    })
}

fn parse_enum<T: FromStr<Err = String>>(value: &str) -> StorageResult<T> {
    value
        .parse()
        .map_err(|message| StorageError::Query { message })
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_run(&self, outcome: &ReasoningOutcome) -> StorageResult<()> {
        let run = StoredRun::from(outcome);
        let state = &outcome.graph_state;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO runs (id, problem, strategy, answer, confidence, reasoning_summary,
                              stats, best_thought_ids, total_tokens, duration_ms, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.run_id)
        .bind(&run.problem)
        .bind(run.strategy.to_string())
        .bind(&run.answer)
        .bind(run.confidence)
        .bind(&run.reasoning_summary)
        .bind(to_json(&run.stats)?)
        .bind(to_json(&run.best_thought_ids)?)
        .bind(run.total_tokens as i64)
        .bind(run.duration_ms as i64)
        .bind(run.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for (seq, thought) in state.thoughts.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO thoughts (id, run_id, seq, content, state, score, confidence, depth,
                                      origin, parent_ids, child_ids, tags, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&thought.id)
            .bind(&run.run_id)
            .bind(seq as i64)
            .bind(&thought.content)
            .bind(thought.state.to_string())
            .bind(thought.score)
            .bind(thought.confidence)
            .bind(thought.depth as i64)
            .bind(thought.origin.to_string())
            .bind(to_json(&thought.parent_ids)?)
            .bind(to_json(&thought.child_ids)?)
            .bind(to_json(&thought.tags)?)
            .bind(thought.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        for (seq, edge) in state.edges.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO edges (id, run_id, seq, source_id, target_id, edge_type, weight, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&edge.id)
            .bind(&run.run_id)
            .bind(seq as i64)
            .bind(&edge.source_id)
            .bind(&edge.target_id)
            .bind(edge.edge_type.to_string())
            .bind(edge.weight)
            .bind(edge.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            run_id = %run.run_id,
            thoughts = state.thoughts.len(),
            edges = state.edges.len(),
            "Run persisted"
        );
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> StorageResult<Option<StoredRun>> {
        let row: Option<RunRow> = sqlx::query_as(
            r#"
            SELECT id, problem, strategy, answer, confidence, reasoning_summary,
                   stats, best_thought_ids, total_tokens, duration_ms, created_at
            FROM runs
            WHERE id = ?
            "#,
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredRun::try_from).transpose()
    }

    async fn get_run_thoughts(&self, run_id: &str) -> StorageResult<Vec<Thought>> {
        let rows: Vec<ThoughtRow> = sqlx::query_as(
            r#"
            SELECT id, content, state, score, confidence, depth, origin,
                   parent_ids, child_ids, tags, created_at
            FROM thoughts
            WHERE run_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Thought::try_from).collect()
    }

    async fn get_run_edges(&self, run_id: &str) -> StorageResult<Vec<Edge>> {
        let rows: Vec<EdgeRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, target_id, edge_type, weight, created_at
            FROM edges
            WHERE run_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Edge::try_from).collect()
    }

    async fn list_runs(&self, limit: u32) -> StorageResult<Vec<StoredRun>> {
        let rows: Vec<RunRow> = sqlx::query_as(
            r#"
            SELECT id, problem, strategy, answer, confidence, reasoning_summary,
                   stats, best_thought_ids, total_tokens, duration_ms, created_at
            FROM runs
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredRun::try_from).collect()
    }
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct RunRow {
    id: String,
    problem: String,
    strategy: String,
    answer: String,
    confidence: f64,
    reasoning_summary: String,
    stats: String,
    best_thought_ids: String,
    total_tokens: i64,
    duration_ms: i64,
    created_at: String,
}

impl TryFrom<RunRow> for StoredRun {
    type Error = StorageError;

    fn try_from(row: RunRow) -> StorageResult<Self> {
        Ok(Self {
            strategy: parse_enum(&row.strategy)?,
            stats: from_json("stats", &row.stats)?,
            best_thought_ids: from_json("best_thought_ids", &row.best_thought_ids)?,
            total_tokens: row.total_tokens.max(0) as u64,
            duration_ms: row.duration_ms.max(0) as u64,
            created_at: parse_timestamp(&row.created_at),
            run_id: row.id,
            problem: row.problem,
            answer: row.answer,
            confidence: row.confidence,
            reasoning_summary: row.reasoning_summary,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ThoughtRow {
    id: String,
    content: String,
    state: String,
    score: Option<f64>,
    confidence: Option<f64>,
    depth: i64,
    origin: String,
    parent_ids: String,
    child_ids: String,
    tags: String,
    created_at: String,
}

impl TryFrom<ThoughtRow> for Thought {
    type Error = StorageError;

    fn try_from(row: ThoughtRow) -> StorageResult<Self> {
        Ok(Self {
            state: parse_enum(&row.state)?,
            origin: parse_enum(&row.origin)?,
            depth: row.depth.max(0) as usize,
            parent_ids: from_json("parent_ids", &row.parent_ids)?,
            child_ids: from_json("child_ids", &row.child_ids)?,
            tags: from_json("tags", &row.tags)?,
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            content: row.content,
            score: row.score,
            confidence: row.confidence,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EdgeRow {
    id: String,
    source_id: String,
    target_id: String,
    edge_type: String,
    weight: f64,
    created_at: String,
}

impl TryFrom<EdgeRow> for Edge {
    type Error = StorageError;

    fn try_from(row: EdgeRow) -> StorageResult<Self> {
        Ok(Self {
            edge_type: parse_enum(&row.edge_type)?,
            created_at: parse_timestamp(&row.created_at),
            id: row.id,
            source_id: row.source_id,
            target_id: row.target_id,
            weight: row.weight,
        })
    }
}
