use super::signature::BoundCall;
use super::FragmentDefinition;
use crate::effects::SideEffectCollector;
use crate::graph::{GraphHandle, GraphNode, NodeId, NodeKind, Param, ParameterTemplate, Value};
use crate::session::Session;
use ahash::AHashMap;
use std::rc::Rc;
use tracing::debug;

/// One call site's private copy of a definition.
///
/// The body holds fresh node ids; references to the definition's
/// placeholders have been replaced by the call's arguments.
#[derive(Debug, Clone)]
pub struct FragmentInstance {
    definition: Rc<FragmentDefinition>,
    bindings: Vec<(String, Param)>,
    body: Vec<GraphNode>,
    outputs: Vec<(String, Value)>,
    effects: SideEffectCollector,
}

impl FragmentInstance {
    pub fn definition(&self) -> &Rc<FragmentDefinition> {
        &self.definition
    }

    /// Parameter environment entries this instance introduces: declared
    /// parameters plus slots bound to literals or templates.
    pub fn bindings(&self) -> &[(String, Param)] {
        &self.bindings
    }

    pub fn body(&self) -> &[GraphNode] {
        &self.body
    }

    pub fn outputs(&self) -> &[(String, Value)] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn effects(&self) -> &SideEffectCollector {
        &self.effects
    }

    /// Ids of every node in the body, nested instances included.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        collect_ids(&self.body, &mut ids);
        ids
    }
}

fn collect_ids(nodes: &[GraphNode], ids: &mut Vec<NodeId>) {
    for node in nodes {
        ids.push(node.id);
        if let NodeKind::Instance(instance) = &node.kind {
            collect_ids(&instance.body, ids);
        }
    }
}

/// Stamps out a copy of `definition` wired to the arguments of `bound`, for
/// the instance node `owner`.
pub(crate) fn instantiate(
    session: &mut Session,
    definition: Rc<FragmentDefinition>,
    bound: &BoundCall,
    owner: NodeId,
) -> FragmentInstance {
    let mut placeholders = AHashMap::new();
    let mut bindings = bound.params.clone();
    for (slot, value) in &bound.slots {
        let Some(id) = definition.placeholder(slot) else {
            continue;
        };
        let replacement = match value {
            Value::Handle(_) => value.clone(),
            Value::Literal(literal) => {
                bindings.push((slot.clone(), Param::Literal(literal.clone())));
                value.clone()
            }
            // Resolved against the caller's parameters. It enters the body
            // as a reference to a binding keyed by this instance, which no
            // nested scope can shadow.
            Value::Template(template) => {
                let key = slot_key(slot, owner);
                bindings.push((slot.clone(), Param::Template(template.clone())));
                bindings.push((key.clone(), Param::Template(template.clone())));
                Value::Template(ParameterTemplate::marker(&key))
            }
        };
        placeholders.insert(id, replacement);
    }

    let mut rewriter = Rewriter {
        session,
        ids: AHashMap::new(),
        placeholders,
    };
    let body = rewriter.nodes(&definition.nodes);
    let outputs = rewriter.entries(&definition.outputs);
    let effects = rewriter.effects(&definition.effects);

    debug!(
        fragment = %definition.name,
        nodes = body.len(),
        "instantiated fragment"
    );
    FragmentInstance {
        definition,
        bindings,
        body,
        outputs,
        effects,
    }
}

/// Binding name for a template-bound slot, unique along any chain of
/// nested instances.
fn slot_key(slot: &str, owner: NodeId) -> String {
    format!("{}@{}", slot, owner)
}

struct Rewriter<'s> {
    session: &'s mut Session,
    ids: AHashMap<NodeId, NodeId>,
    placeholders: AHashMap<NodeId, Value>,
}

impl Rewriter<'_> {
    fn nodes(&mut self, nodes: &[GraphNode]) -> Vec<GraphNode> {
        let mut copied = Vec::with_capacity(nodes.len());
        for node in nodes {
            // Placeholders are replaced, never copied.
            if matches!(node.kind, NodeKind::Input(_)) {
                continue;
            }
            copied.push(self.node(node));
        }
        copied
    }

    fn node(&mut self, node: &GraphNode) -> GraphNode {
        let id = self.session.next_node_id();
        self.ids.insert(node.id, id);
        let inputs = self.entries(&node.inputs);
        let kind = match &node.kind {
            NodeKind::Instance(instance) => {
                // A slot fed from one of our placeholders may now carry a
                // literal or template; the nested body refers to it by name.
                let mut bindings = instance.bindings.clone();
                for (slot, value) in &inputs {
                    let param = match value {
                        Value::Literal(l) => Param::Literal(l.clone()),
                        Value::Template(t) => Param::Template(t.clone()),
                        Value::Handle(_) => continue,
                    };
                    if !bindings.iter().any(|(name, _)| name == slot) {
                        bindings.push((slot.clone(), param));
                    }
                }
                NodeKind::Instance(Box::new(FragmentInstance {
                    definition: Rc::clone(&instance.definition),
                    bindings,
                    body: self.nodes(&instance.body),
                    outputs: self.entries(&instance.outputs),
                    effects: self.effects(&instance.effects),
                }))
            }
            other => other.clone(),
        };
        GraphNode {
            id,
            kind,
            params: node.params.clone(),
            inputs,
            outputs: node.outputs.clone(),
        }
    }

    fn entries(&self, entries: &[(String, Value)]) -> Vec<(String, Value)> {
        entries
            .iter()
            .map(|(name, value)| (name.clone(), self.value(value)))
            .collect()
    }

    fn value(&self, value: &Value) -> Value {
        match value {
            Value::Handle(handle) => {
                if let Some(replacement) = self.placeholders.get(&handle.node) {
                    replacement.clone()
                } else if let Some(&id) = self.ids.get(&handle.node) {
                    Value::Handle(GraphHandle::new(id, handle.output.clone()))
                } else {
                    value.clone()
                }
            }
            other => other.clone(),
        }
    }

    fn effects(&self, effects: &SideEffectCollector) -> SideEffectCollector {
        effects.map_ids(|id| self.ids.get(&id).copied().unwrap_or(id))
    }
}
