use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::math::Fnv1a64;
use crate::graph::effect::Effect;

/// Stable handle into a [`NodeGraph`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

struct Node {
    label: String,
    effect: Box<dyn Effect>,
    inputs: Vec<Option<NodeId>>,
    hash: u64,
    /// Host node when this node lives inside an attached paint sub-tree.
    subtree_host: Option<NodeId>,
    /// Bottom-merge node of this node's attached sub-tree, if it has one.
    subtree_bottom: Option<NodeId>,
}

/// Arena of effect nodes wired into a DAG.
///
/// The graph owns the nodes; render passes hold plain [`NodeId`] handles.
/// Inputs must already exist when a node is added, so the graph is acyclic by
/// construction.
pub struct NodeGraph {
    nodes: Vec<Node>,
    seed: u64,
}

impl NodeGraph {
    /// New empty graph with the default seed.
    pub fn new() -> Self {
        Self::with_seed(Fnv1a64::OFFSET_BASIS)
    }

    /// A seed distinguishes otherwise-identical projects so their node
    /// hashes (and thus cache keys) do not collide.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            seed,
        }
    }

    /// Add a node. `params` is the opaque parameter payload of the effect;
    /// it feeds the node-configuration hash together with the label and the
    /// hashes of the connected inputs.
    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        params: serde_json::Value,
        effect: Box<dyn Effect>,
        inputs: Vec<Option<NodeId>>,
    ) -> TesseraResult<NodeId> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(TesseraError::validation("node label must be non-empty"));
        }
        for input in inputs.iter().flatten() {
            if input.0 as usize >= self.nodes.len() {
                return Err(TesseraError::validation(format!(
                    "node '{label}' references an unknown input node"
                )));
            }
        }

        let mut h = Fnv1a64::new(self.seed);
        h.write_str(&label);
        h.write_json(&params);
        for input in &inputs {
            match input {
                Some(id) => h.write_u64(self.nodes[id.0 as usize].hash),
                None => h.write_u64(0),
            }
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            label,
            effect,
            inputs,
            hash: h.finish(),
            subtree_host: None,
            subtree_bottom: None,
        });
        Ok(id)
    }

    /// Declare that `members` form a paint sub-tree attached to `host`,
    /// whose internal bottom-merge node is `bottom`. Request propagation
    /// skips recursing from a member into the bottom node (that recursion
    /// would re-enter the host's internal structure).
    pub fn attach_subtree(&mut self, host: NodeId, bottom: NodeId, members: &[NodeId]) {
        self.nodes[host.0 as usize].subtree_bottom = Some(bottom);
        for m in members {
            self.nodes[m.0 as usize].subtree_host = Some(host);
        }
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// User-facing label of a node.
    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.0 as usize].label
    }

    /// Node-configuration hash used in [`crate::ImageKey`].
    pub fn node_hash(&self, id: NodeId) -> u64 {
        self.nodes[id.0 as usize].hash
    }

    /// The node's effect hooks.
    pub fn effect(&self, id: NodeId) -> &dyn Effect {
        self.nodes[id.0 as usize].effect.as_ref()
    }

    /// Number of input slots (connected or not).
    pub fn input_count(&self, id: NodeId) -> usize {
        self.nodes[id.0 as usize].inputs.len()
    }

    /// Upstream node connected to the given input slot.
    pub fn input(&self, id: NodeId, input: usize) -> Option<NodeId> {
        self.nodes[id.0 as usize].inputs.get(input).copied().flatten()
    }

    pub(crate) fn subtree_host(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0 as usize].subtree_host
    }

    pub(crate) fn subtree_bottom(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0 as usize].subtree_bottom
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/node.rs"]
mod tests;
