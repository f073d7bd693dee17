use super::{GraphHandle, NodeId, Param, Value};
use crate::effects::SideEffectCollector;
use crate::error::BindingError;
use crate::fragment::FragmentInstance;
use ahash::AHashMap;
use std::collections::BTreeMap;

/// What a node stands for.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A primitive operation, identified by its engine-side tag.
    Operation(String),
    /// Stand-in for a fragment input while the fragment body is captured.
    Input(String),
    /// A call site of a fragment, carrying its private rewritten body.
    Instance(Box<FragmentInstance>),
}

/// One box of the authored graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub params: BTreeMap<String, Param>,
    pub inputs: Vec<(String, Value)>,
    pub outputs: Vec<String>,
}

impl GraphNode {
    pub fn handle(&self, output: &str) -> Option<GraphHandle> {
        self.outputs
            .iter()
            .any(|o| o == output)
            .then(|| GraphHandle::new(self.id, output))
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn instance(&self) -> Option<&FragmentInstance> {
        match &self.kind {
            NodeKind::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Short label used in error contexts and debug output.
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Operation(op) => format!("{} #{}", op, self.id),
            NodeKind::Input(slot) => format!("input '{}' #{}", slot, self.id),
            NodeKind::Instance(instance) => {
                format!("{} #{}", instance.definition().name(), self.id)
            }
        }
    }
}

/// The nodes of one graph under construction, in creation order, together
/// with the side effects registered while building it.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    index: AHashMap<NodeId, usize>,
    effects: SideEffectCollector,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn effects(&self) -> &SideEffectCollector {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut SideEffectCollector {
        &mut self.effects
    }

    /// Checks that `value` is usable as an input of a node of this graph.
    pub(crate) fn check_value(&self, value: &Value, target: &str) -> Result<(), BindingError> {
        let Value::Handle(handle) = value else {
            return Ok(());
        };
        let node = self.node(handle.node).ok_or_else(|| BindingError::ForeignHandle {
            handle: handle.to_string(),
            target: target.to_string(),
        })?;
        if node.outputs.iter().any(|o| *o == handle.output) {
            Ok(())
        } else {
            Err(BindingError::UnknownOutput {
                node: handle.node,
                output: handle.output.clone(),
            })
        }
    }

    pub(crate) fn push(&mut self, node: GraphNode) {
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
    }

    /// Drops every node added after the first `nodes`, and every effect
    /// registered after the first `effects`.
    pub(crate) fn truncate(&mut self, nodes: usize, effects: usize) {
        self.effects.truncate(effects);
        if nodes >= self.nodes.len() {
            return;
        }
        for node in self.nodes.drain(nodes..) {
            self.index.remove(&node.id);
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<GraphNode>, SideEffectCollector) {
        (self.nodes, self.effects)
    }
}
