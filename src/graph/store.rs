use std::collections::HashMap;

use super::{Edge, Thought};
use crate::error::{GraphError, GraphResult};

/// In-memory thought graph owned by a single run.
///
/// Thoughts live in an arena in creation order with an id index maintained
/// on insert, so lookups and ancestor walks never scan the arena.
#[derive(Debug, Clone, Default)]
pub struct ThoughtGraph {
    thoughts: Vec<Thought>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

impl ThoughtGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a thought whose parents are already present.
    ///
    /// Registers the new id in every parent's `child_ids`.
    pub fn add_thought(&mut self, thought: Thought) -> GraphResult<&Thought> {
        if self.index.contains_key(&thought.id) {
            return Err(GraphError::DuplicateThought {
                thought_id: thought.id,
            });
        }

        let mut parent_slots = Vec::with_capacity(thought.parent_ids.len());
        for parent_id in &thought.parent_ids {
            match self.index.get(parent_id) {
                Some(&slot) => parent_slots.push(slot),
                None => {
                    return Err(GraphError::DanglingParent {
                        thought_id: thought.id.clone(),
                        parent_id: parent_id.clone(),
                    })
                }
            }
        }

        for slot in parent_slots {
            let parent = &mut self.thoughts[slot];
            if !parent.child_ids.contains(&thought.id) {
                parent.child_ids.push(thought.id.clone());
            }
        }

        let slot = self.thoughts.len();
        self.index.insert(thought.id.clone(), slot);
        self.thoughts.push(thought);
        Ok(&self.thoughts[slot])
    }

    /// Add an edge between two existing thoughts
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<()> {
        for endpoint in [&edge.source_id, &edge.target_id] {
            if !self.index.contains_key(endpoint) {
                return Err(GraphError::ThoughtNotFound {
                    thought_id: endpoint.clone(),
                });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Look up a thought
    pub fn get(&self, id: &str) -> Option<&Thought> {
        self.index.get(id).map(|&slot| &self.thoughts[slot])
    }

    /// Look up a thought for score/state/tag updates
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Thought> {
        match self.index.get(id) {
            Some(&slot) => Some(&mut self.thoughts[slot]),
            None => None,
        }
    }

    /// Look up a thought, failing when absent
    pub fn require(&self, id: &str) -> GraphResult<&Thought> {
        self.get(id).ok_or_else(|| GraphError::ThoughtNotFound {
            thought_id: id.to_string(),
        })
    }

    /// Primary chain from the root down to `id`, inclusive.
    ///
    /// Follows only the first parent, even for aggregated thoughts.
    pub fn ancestor_chain(&self, id: &str) -> GraphResult<Vec<&Thought>> {
        let mut chain = vec![self.require(id)?];

        while let Some(parent_id) = chain.last().copied().and_then(Thought::primary_parent) {
            // Parents precede children in the arena, so a chain is never longer than the graph.
            if chain.len() > self.thoughts.len() {
                break;
            }
            chain.push(self.require(parent_id)?);
        }

        chain.reverse();
        Ok(chain)
    }

    /// All thoughts in creation order
    pub fn thoughts(&self) -> &[Thought] {
        &self.thoughts
    }

    /// All edges in creation order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of thoughts
    pub fn len(&self) -> usize {
        self.thoughts.len()
    }

    /// Whether the graph holds no thoughts
    pub fn is_empty(&self) -> bool {
        self.thoughts.is_empty()
    }

    /// Verified, scored thoughts ordered by descending score.
    ///
    /// Ties keep creation order.
    pub fn ranked_verified(&self) -> Vec<&Thought> {
        let mut ranked: Vec<&Thought> = self.thoughts.iter().filter(|t| t.is_verified()).collect();
        ranked.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Consume the graph into its thoughts and edges
    pub fn into_parts(self) -> (Vec<Thought>, Vec<Edge>) {
        (self.thoughts, self.edges)
    }
}
