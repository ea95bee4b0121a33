//! Reasoning oracle capability.
//!
//! The search engine never produces thought content itself. It asks a
//! [`ReasoningOracle`] to generate candidates, score them and merge them.
//! [`LangbaseOracle`] is the production implementation backed by Langbase
//! Pipes; tests substitute scripted or mocked oracles.

mod langbase;

pub use langbase::LangbaseOracle;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleResult;

/// Context handed to the oracle when expanding a thought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The root problem statement.
    pub problem: String,
    /// Contents along the primary chain between the root and the parent,
    /// both excluded. The root is already `problem`.
    pub ancestor_chain: Vec<String>,
    /// Content of the thought being expanded.
    pub parent_content: String,
    /// Maximum number of candidates wanted.
    pub k: usize,
}

/// A candidate next step proposed by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCandidate {
    /// Candidate thought text.
    pub content: String,
    /// Self-reported confidence (0.0-1.0).
    pub confidence: f64,
}

/// Output of a generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Structured candidates, possibly empty when the reply was not structured.
    pub candidates: Vec<GeneratedCandidate>,
    /// Free-text reply to fall back on. Empty when the reply parsed as
    /// structured output, even if that output held no candidates.
    pub raw_text: String,
    /// Tokens consumed by the call.
    pub tokens_used: u64,
}

/// Output of an evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Quality score; the engine clamps it to [0, 1].
    pub score: f64,
    /// Whether the line of reasoning is worth continuing.
    pub should_continue: bool,
    /// Short justification.
    pub rationale: String,
    /// Tokens consumed by the call.
    pub tokens_used: u64,
}

/// Output of an aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    /// Combined thought text.
    pub content: String,
    /// Confidence in the synthesis (0.0-1.0).
    pub confidence: f64,
    /// Tokens consumed by the call.
    pub tokens_used: u64,
}

/// External capability that produces and scores thought content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Propose up to `request.k` next steps for the parent thought.
    async fn generate(&self, request: &GenerationRequest) -> OracleResult<GenerationOutput>;

    /// Score `thought_content` as a continuation of `parent_content`.
    async fn evaluate(&self, parent_content: &str, thought_content: &str)
        -> OracleResult<Evaluation>;

    /// Merge several thoughts into one synthesis.
    async fn aggregate(&self, contents: &[String]) -> OracleResult<Synthesis>;
}

/// Extract JSON from a completion string, handling markdown code blocks.
///
/// Attempts extraction in this order:
/// 1. Raw JSON (fast path)
/// 2. A ```json ... ``` block
/// 3. A plain ``` ... ``` block
pub(crate) fn extract_json_from_completion(completion: &str) -> Result<&str, String> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    if completion.contains("```json") {
        return completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ```json block but content was empty or malformed".to_string());
    }

    if completion.contains("```") {
        return completion
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ``` block but content was empty or malformed".to_string());
    }

    Err(format!(
        "No JSON found in response. First 100 chars: '{}'",
        completion.chars().take(100).collect::<String>()
    ))
}
