use crate::error::BindingError;
use crate::fragment::{
    self, Args, Body, CallArgs, DefinitionRegistry, Fragment, FragmentId, Instance, Outputs,
    Signature,
};
use crate::graph::{Graph, GraphHandle, GraphNode, NodeId, NodeKind, Operation, Value};
use ahash::AHashSet;
use std::rc::Rc;

/// Authoring state shared by every graph built in one session: node id
/// allocation and the cache of captured fragment definitions.
///
/// Authoring is single threaded; a session is not meant to be shared.
#[derive(Debug, Default)]
pub struct Session {
    next_node: NodeId,
    next_fragment: u64,
    pub(crate) registry: DefinitionRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns `body` into a fragment named `name`.
    ///
    /// ```rust
    /// use boxwright::prelude::*;
    ///
    /// let mut session = Session::new();
    /// let select = session.fragment(
    ///     "select",
    ///     Signature::new().positional("x").positional("column"),
    ///     |scope, args| {
    ///         let sql = pp(format!("select id, {} from vertices", args.template("column")?));
    ///         let out = scope.apply(Operation::new("sql1").input("input", args.get("x")?).param("sql", sql))?;
    ///         Ok(Outputs::single(out))
    ///     },
    /// );
    /// assert_eq!(select.name(), "select");
    /// ```
    pub fn fragment<F>(&mut self, name: impl Into<String>, signature: Signature, body: F) -> Fragment
    where
        F: Fn(&mut Scope<'_>, &Args) -> Result<Outputs, BindingError> + 'static,
    {
        let id = FragmentId(self.next_fragment);
        self.next_fragment += 1;
        let body: Rc<Body> = Rc::new(body);
        Fragment {
            id,
            name: name.into(),
            signature,
            parameters: Vec::new(),
            body,
        }
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    pub(crate) fn next_node_id(&mut self) -> NodeId {
        let id = self.next_node;
        self.next_node += 1;
        id
    }
}

/// A node created by a primitive operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    id: NodeId,
    op: String,
    outputs: Vec<String>,
}

impl NodeRef {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn output(&self, name: &str) -> Option<Value> {
        self.outputs
            .iter()
            .any(|o| o == name)
            .then(|| Value::Handle(GraphHandle::new(self.id, name)))
    }

    /// The first declared output.
    pub fn value(&self) -> Result<Value, BindingError> {
        self.outputs
            .first()
            .map(|o| Value::Handle(GraphHandle::new(self.id, o.clone())))
            .ok_or_else(|| BindingError::NoOutputs {
                name: self.op.clone(),
            })
    }
}

/// The cursor through which a body adds nodes to the graph it is building.
pub struct Scope<'s> {
    session: &'s mut Session,
    graph: &'s mut Graph,
}

impl<'s> Scope<'s> {
    pub(crate) fn new(session: &'s mut Session, graph: &'s mut Graph) -> Self {
        Self { session, graph }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Adds a primitive operation node.
    pub fn add(&mut self, operation: Operation) -> Result<NodeRef, BindingError> {
        let mut seen = AHashSet::new();
        for (name, value) in &operation.inputs {
            if !seen.insert(name.as_str()) {
                return Err(BindingError::DuplicateInput {
                    operation: operation.op.clone(),
                    input: name.clone(),
                });
            }
            self.graph.check_value(value, &operation.op)?;
        }

        let id = self.session.next_node_id();
        let node = NodeRef {
            id,
            op: operation.op.clone(),
            outputs: operation.outputs.clone(),
        };
        self.graph.push(GraphNode {
            id,
            kind: NodeKind::Operation(operation.op),
            params: operation.params,
            inputs: operation.inputs,
            outputs: operation.outputs,
        });
        Ok(node)
    }

    /// Adds a primitive operation and returns its first output.
    pub fn apply(&mut self, operation: Operation) -> Result<Value, BindingError> {
        self.add(operation)?.value()
    }

    /// Calls `fragment`, capturing its body first if this call shape is new.
    pub fn call(&mut self, fragment: &Fragment, args: CallArgs) -> Result<Instance, BindingError> {
        let bound = fragment::signature::bind(
            &fragment.name,
            &fragment.signature,
            &fragment.parameters,
            &args,
        )?;
        for (_, value) in &bound.slots {
            self.graph.check_value(value, &fragment.name)?;
        }

        let definition = fragment::capture(self.session, fragment, &bound)?;
        let shape = definition.shape;
        let output_names: Vec<String> =
            definition.outputs.iter().map(|(n, _)| n.clone()).collect();
        let id = self.session.next_node_id();
        let instance = fragment::instantiate(self.session, definition, &bound, id);

        self.graph.push(GraphNode {
            id,
            kind: NodeKind::Instance(Box::new(instance)),
            params: bound.params.into_iter().collect(),
            inputs: bound.slots,
            outputs: output_names.clone(),
        });

        Ok(Instance {
            fragment: fragment.name.clone(),
            node: id,
            shape,
            outputs: output_names
                .into_iter()
                .map(|name| {
                    let handle = GraphHandle::new(id, name.clone());
                    (name, Value::Handle(handle))
                })
                .collect(),
        })
    }

    /// Registers `node` as a side effect of the graph being built. Returns
    /// false if it was already registered.
    pub fn register(&mut self, node: NodeId) -> Result<bool, BindingError> {
        match self.graph.node(node).map(|n| &n.kind) {
            None => Err(BindingError::ForeignHandle {
                handle: format!("#{}", node),
                target: "side effects".to_string(),
            }),
            Some(NodeKind::Input(slot)) => Err(BindingError::PlaceholderEffect {
                node,
                slot: slot.clone(),
            }),
            Some(_) => Ok(self.graph.effects_mut().register(node)),
        }
    }
}
