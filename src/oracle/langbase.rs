use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    extract_json_from_completion, Evaluation, GeneratedCandidate, GenerationOutput,
    GenerationRequest, ReasoningOracle, Synthesis,
};
use crate::config::PipeConfig;
use crate::error::{OracleError, OracleResult};
use crate::langbase::{LangbaseClient, Message, PipeRequest};
use crate::prompts::{GOT_AGGREGATE_PROMPT, GOT_EVALUATE_PROMPT, GOT_GENERATE_PROMPT};

/// Reasoning oracle backed by three Langbase pipes.
#[derive(Clone)]
pub struct LangbaseOracle {
    client: LangbaseClient,
    pipes: PipeConfig,
}

/// Langbase response for the generate pipe
#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<CandidateItem>,
}

#[derive(Debug, Deserialize)]
struct CandidateItem {
    #[serde(alias = "thought")]
    content: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

/// Langbase response for the evaluate pipe
#[derive(Debug, Deserialize)]
struct EvaluateReply {
    score: f64,
    #[serde(rename = "continue", default = "default_continue")]
    should_continue: bool,
    #[serde(default)]
    rationale: String,
}

/// Langbase response for the aggregate pipe
#[derive(Debug, Deserialize)]
struct AggregateReply {
    #[serde(alias = "aggregated_thought")]
    synthesis: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    0.7
}

fn default_continue() -> bool {
    true
}

impl LangbaseOracle {
    /// Create an oracle over the given client and pipe names
    pub fn new(client: LangbaseClient, pipes: PipeConfig) -> Self {
        Self { client, pipes }
    }

    fn build_generate_messages(request: &GenerationRequest) -> Vec<Message> {
        let mut user_msg = format!("Problem: {}", request.problem);

        if !request.ancestor_chain.is_empty() {
            user_msg.push_str("\n\nReasoning so far:");
            for (i, step) in request.ancestor_chain.iter().enumerate() {
                user_msg.push_str(&format!("\n{}. {}", i + 1, step));
            }
        }

        user_msg.push_str(&format!(
            "\n\nCurrent thought:\n\"{}\"\n\nPropose up to {} distinct next steps.",
            request.parent_content, request.k
        ));

        vec![Message::system(GOT_GENERATE_PROMPT), Message::user(user_msg)]
    }

    fn build_evaluate_messages(parent_content: &str, thought_content: &str) -> Vec<Message> {
        let user_msg = format!(
            "Parent thought:\n\"{}\"\n\nCandidate thought:\n\"{}\"",
            parent_content, thought_content
        );
        vec![Message::system(GOT_EVALUATE_PROMPT), Message::user(user_msg)]
    }

    fn build_aggregate_messages(contents: &[String]) -> Vec<Message> {
        let mut user_msg = String::from("Combine these thoughts:");
        for (i, content) in contents.iter().enumerate() {
            user_msg.push_str(&format!("\n\n[{}] {}", i + 1, content));
        }
        vec![Message::system(GOT_AGGREGATE_PROMPT), Message::user(user_msg)]
    }

    /// Structured candidates, or `None` when the reply is not a generate reply.
    pub(crate) fn parse_generation(completion: &str) -> Option<Vec<GeneratedCandidate>> {
        let parsed = extract_json_from_completion(completion)
            .and_then(|json| serde_json::from_str::<GenerateReply>(json).map_err(|e| e.to_string()));

        match parsed {
            Ok(reply) => Some(
                reply
                    .candidates
                    .into_iter()
                    .filter(|c| !c.content.trim().is_empty())
                    .map(|c| GeneratedCandidate {
                        content: c.content,
                        confidence: c.confidence,
                    })
                    .collect(),
            ),
            Err(e) => {
                warn!(
                    error = %e,
                    completion_preview = %completion.chars().take(200).collect::<String>(),
                    "Failed to parse GoT generate response, leaving raw text for fallback"
                );
                None
            }
        }
    }

    pub(crate) fn parse_evaluation(completion: &str) -> OracleResult<EvaluationParts> {
        let json = extract_json_from_completion(completion)
            .map_err(|message| OracleError::InvalidResponse { message })?;
        let reply: EvaluateReply =
            serde_json::from_str(json).map_err(|e| OracleError::InvalidResponse {
                message: format!("Failed to parse evaluation: {}", e),
            })?;
        Ok(EvaluationParts {
            score: reply.score,
            should_continue: reply.should_continue,
            rationale: reply.rationale,
        })
    }

    pub(crate) fn parse_synthesis(completion: &str) -> OracleResult<(String, f64)> {
        let json = extract_json_from_completion(completion)
            .map_err(|message| OracleError::InvalidResponse { message })?;
        let reply: AggregateReply =
            serde_json::from_str(json).map_err(|e| OracleError::InvalidResponse {
                message: format!("Failed to parse synthesis: {}", e),
            })?;
        if reply.synthesis.trim().is_empty() {
            return Err(OracleError::InvalidResponse {
                message: "Synthesis was empty".to_string(),
            });
        }
        Ok((reply.synthesis, reply.confidence))
    }
}

/// Parsed evaluation fields, before token accounting.
#[derive(Debug)]
pub(crate) struct EvaluationParts {
    pub score: f64,
    pub should_continue: bool,
    pub rationale: String,
}

#[async_trait]
impl ReasoningOracle for LangbaseOracle {
    async fn generate(&self, request: &GenerationRequest) -> OracleResult<GenerationOutput> {
        debug!(k = request.k, chain_len = request.ancestor_chain.len(), "Requesting candidates");

        let pipe_request =
            PipeRequest::new(&self.pipes.generate, Self::build_generate_messages(request));
        let response = self.client.call_pipe(pipe_request).await?;

        let tokens_used = response.total_tokens();
        let (candidates, raw_text) = match Self::parse_generation(&response.completion) {
            Some(candidates) => (candidates, String::new()),
            None => (Vec::new(), response.completion),
        };

        Ok(GenerationOutput {
            candidates,
            raw_text,
            tokens_used,
        })
    }

    async fn evaluate(
        &self,
        parent_content: &str,
        thought_content: &str,
    ) -> OracleResult<Evaluation> {
        let pipe_request = PipeRequest::new(
            &self.pipes.evaluate,
            Self::build_evaluate_messages(parent_content, thought_content),
        );
        let response = self.client.call_pipe(pipe_request).await?;
        let parts = Self::parse_evaluation(&response.completion)?;

        Ok(Evaluation {
            score: parts.score,
            should_continue: parts.should_continue,
            rationale: parts.rationale,
            tokens_used: response.total_tokens(),
        })
    }

    async fn aggregate(&self, contents: &[String]) -> OracleResult<Synthesis> {
        let pipe_request =
            PipeRequest::new(&self.pipes.aggregate, Self::build_aggregate_messages(contents));
        let response = self.client.call_pipe(pipe_request).await?;
        let (content, confidence) = Self::parse_synthesis(&response.completion)?;

        Ok(Synthesis {
            content,
            confidence,
            tokens_used: response.total_tokens(),
        })
    }
}
