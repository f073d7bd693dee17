use super::{GraphHandle, Literal, NodeId};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fully resolved input: another operation's output or a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolved {
    Handle(GraphHandle),
    Literal(Literal),
}

/// A primitive operation with every parameter substituted and every input
/// pointing at another primitive operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub id: NodeId,
    pub op: String,
    pub params: BTreeMap<String, Literal>,
    pub inputs: Vec<(String, Resolved)>,
    pub outputs: Vec<String>,
}

impl ResolvedNode {
    pub fn param(&self, name: &str) -> Option<&Literal> {
        self.params.get(name)
    }

    pub fn input(&self, name: &str) -> Option<&Resolved> {
        self.inputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// What is handed to the execution engine: only primitive operations, no
/// fragments and no templates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionGraph {
    pub nodes: Vec<ResolvedNode>,
    /// The workspace's own outputs.
    pub outputs: Vec<(String, Resolved)>,
    /// Effects registered on the workspace, expanded to primitive nodes in
    /// registration order.
    pub side_effects: Vec<NodeId>,
    #[serde(skip)]
    pub(crate) index: AHashMap<NodeId, usize>,
    /// Where each fragment output actually comes from.
    #[serde(skip)]
    pub(crate) aliases: AHashMap<GraphHandle, Resolved>,
    /// Effects registered inside each instance, before expansion.
    #[serde(skip)]
    pub(crate) instance_effects: AHashMap<NodeId, Vec<NodeId>>,
}

impl ExecutionGraph {
    pub fn node(&self, id: NodeId) -> Option<&ResolvedNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn output(&self, name: &str) -> Option<&Resolved> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Follows fragment outputs down to the primitive operation (or
    /// constant) that produces them.
    pub fn resolve_handle(&self, handle: &GraphHandle) -> Resolved {
        let mut current = Resolved::Handle(handle.clone());
        while let Resolved::Handle(h) = &current {
            match self.aliases.get(h) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }
        current
    }

    /// Expands registered effect nodes into primitive operations, keeping
    /// order and dropping repeats.
    pub fn expand_effects(&self, registered: &[NodeId]) -> Vec<NodeId> {
        let mut seen = AHashSet::new();
        let mut expanded = Vec::new();
        self.expand_into(registered, &mut seen, &mut expanded);
        expanded
    }

    fn expand_into(
        &self,
        registered: &[NodeId],
        seen: &mut AHashSet<NodeId>,
        expanded: &mut Vec<NodeId>,
    ) {
        for &id in registered {
            if !seen.insert(id) {
                continue;
            }
            if let Some(inner) = self.instance_effects.get(&id) {
                self.expand_into(inner, seen, expanded);
            } else if self.index.contains_key(&id) {
                expanded.push(id);
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn push(&mut self, node: ResolvedNode) {
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
    }
}
