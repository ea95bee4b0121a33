//! Thought graph data model and run-scoped store.
//!
//! A [`Thought`] is a scored unit of reasoning text; an [`Edge`] records how
//! one thought produced or supported another. Both are append-only during a
//! run: thoughts are only mutated to set score, state and tags.

mod store;

pub use store::ThoughtGraph;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Annotation marking a thought the evaluator advised not to continue.
pub const TAG_DEAD_END: &str = "dead_end";
/// Annotation marking the placeholder left by a failed generation.
pub const TAG_GENERATION_ERROR: &str = "generation_error";
/// Annotation marking a thought whose evaluation failed.
pub const TAG_EVALUATION_ERROR: &str = "evaluation_error";
/// Annotation marking a verified thought dropped while trimming a frontier.
pub const TAG_FRONTIER_TRIMMED: &str = "frontier_trimmed";

/// Lifecycle state of a thought.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtState {
    /// Created, not yet evaluated.
    #[default]
    Generated,
    /// Scored at or above the prune threshold.
    Verified,
    /// Scored below the prune threshold, or a failure placeholder.
    Rejected,
    /// Folded into a synthesis; no longer expanded on its own.
    Aggregated,
}

impl std::fmt::Display for ThoughtState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThoughtState::Generated => write!(f, "generated"),
            ThoughtState::Verified => write!(f, "verified"),
            ThoughtState::Rejected => write!(f, "rejected"),
            ThoughtState::Aggregated => write!(f, "aggregated"),
        }
    }
}

impl std::str::FromStr for ThoughtState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generated" => Ok(ThoughtState::Generated),
            "verified" => Ok(ThoughtState::Verified),
            "rejected" => Ok(ThoughtState::Rejected),
            "aggregated" => Ok(ThoughtState::Aggregated),
            _ => Err(format!("Unknown thought state: {}", s)),
        }
    }
}

/// How a thought came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtOrigin {
    /// The problem statement supplied by the caller.
    UserInput,
    /// Expanded from a single parent by the oracle.
    #[default]
    Generation,
    /// Synthesized from several sources by the oracle.
    Aggregation,
}

impl std::fmt::Display for ThoughtOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThoughtOrigin::UserInput => write!(f, "user_input"),
            ThoughtOrigin::Generation => write!(f, "generation"),
            ThoughtOrigin::Aggregation => write!(f, "aggregation"),
        }
    }
}

impl std::str::FromStr for ThoughtOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user_input" => Ok(ThoughtOrigin::UserInput),
            "generation" => Ok(ThoughtOrigin::Generation),
            "aggregation" => Ok(ThoughtOrigin::Aggregation),
            _ => Err(format!("Unknown thought origin: {}", s)),
        }
    }
}

/// Relationship carried by an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Source was expanded into target.
    #[default]
    Influences,
    /// Source contributed to the target synthesis.
    Supports,
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Influences => write!(f, "influences"),
            EdgeType::Supports => write!(f, "supports"),
        }
    }
}

impl std::str::FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "influences" => Ok(EdgeType::Influences),
            "supports" => Ok(EdgeType::Supports),
            _ => Err(format!("Unknown edge type: {}", s)),
        }
    }
}

/// A node of the reasoning graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    /// Unique thought identifier.
    pub id: String,
    /// Reasoning text.
    pub content: String,
    /// Lifecycle state.
    pub state: ThoughtState,
    /// Evaluator score in [0, 1]; `None` until evaluated.
    pub score: Option<f64>,
    /// Confidence the oracle reported when producing the thought.
    pub confidence: Option<f64>,
    /// Distance from the root along the primary chain.
    pub depth: usize,
    /// Provenance.
    pub origin: ThoughtOrigin,
    /// Producing thoughts; the first entry is the primary parent.
    pub parent_ids: Vec<String>,
    /// Thoughts produced from this one.
    pub child_ids: Vec<String>,
    /// Free-form annotations.
    pub tags: Vec<String>,
    /// When the thought was created.
    pub created_at: DateTime<Utc>,
}

impl Thought {
    /// Create a generated thought with no parents
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            state: ThoughtState::Generated,
            score: None,
            confidence: None,
            depth: 0,
            origin: ThoughtOrigin::Generation,
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Create the root thought for a problem statement.
    ///
    /// The root is verified with a perfect score so that it is always
    /// eligible for expansion.
    pub fn root(problem: impl Into<String>) -> Self {
        Self::new(problem)
            .with_origin(ThoughtOrigin::UserInput)
            .with_state(ThoughtState::Verified)
            .with_score(1.0)
    }

    /// Set origin
    pub fn with_origin(mut self, origin: ThoughtOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Set state
    pub fn with_state(mut self, state: ThoughtState) -> Self {
        self.state = state;
        self
    }

    /// Set score, clamped to [0, 1]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(clamp_unit(score));
        self
    }

    /// Set the producer's self-reported confidence, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(clamp_unit(confidence));
        self
    }

    /// Set depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set parents; the first one becomes the primary parent
    pub fn with_parents(mut self, parent_ids: Vec<String>) -> Self {
        self.parent_ids = parent_ids;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag(tag);
        self
    }

    /// Add a tag unless already present
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Whether the thought carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Primary parent, if any
    pub fn primary_parent(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }

    /// Whether this is the root of the graph
    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }

    /// Verified and scored
    pub fn is_verified(&self) -> bool {
        self.state == ThoughtState::Verified && self.score.is_some()
    }
}

/// Directed relation between two thoughts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge identifier.
    pub id: String,
    /// Producing thought.
    pub source_id: String,
    /// Produced thought.
    pub target_id: String,
    /// Relationship type.
    pub edge_type: EdgeType,
    /// Edge weight (0.0-1.0).
    pub weight: f64,
    /// When the edge was created.
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// Create an `influences` edge with weight 1.0
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            edge_type: EdgeType::Influences,
            weight: 1.0,
            created_at: Utc::now(),
        }
    }

    /// Set edge type
    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Set weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = clamp_unit(weight);
        self
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
