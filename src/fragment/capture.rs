use super::signature::BoundCall;
use super::{Args, CaptureKey, Fragment, FragmentDefinition, OutputShape, Outputs};
use crate::error::BindingError;
use crate::graph::{Graph, GraphHandle, GraphNode, NodeId, NodeKind, Value};
use crate::session::{Scope, Session};
use crate::workspace::GraphRecord;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

/// Output name of the placeholder node standing in for a slot.
pub(crate) const PLACEHOLDER_OUTPUT: &str = "input";

impl CaptureKey {
    pub(crate) fn for_call(fragment: &Fragment, bound: &BoundCall) -> Self {
        Self {
            fragment: fragment.id,
            name: fragment.name.clone(),
            parameters: fragment.parameters.iter().map(|p| p.name.clone()).collect(),
            slots: bound.slot_names(),
        }
    }
}

/// Returns the definition for this call shape, running the body if this
/// shape has not been seen before.
pub(crate) fn capture(
    session: &mut Session,
    fragment: &Fragment,
    bound: &BoundCall,
) -> Result<Rc<FragmentDefinition>, BindingError> {
    let key = CaptureKey::for_call(fragment, bound);
    if let Some(definition) = session.registry.get(&key) {
        debug!(fragment = %fragment.name, slots = ?key.slots, "reusing captured definition");
        return Ok(definition);
    }

    if !session.registry.begin_capture(fragment.id) {
        return Err(BindingError::RecursiveCapture {
            fragment: fragment.name.clone(),
        });
    }
    let result = run_body(session, fragment, bound, key);
    session.registry.end_capture(fragment.id);
    let definition = result?;

    debug!(
        fragment = %definition.name,
        slots = ?definition.slots,
        nodes = definition.nodes.len(),
        "captured fragment"
    );
    Ok(session.registry.insert(definition))
}

fn run_body(
    session: &mut Session,
    fragment: &Fragment,
    bound: &BoundCall,
    key: CaptureKey,
) -> Result<FragmentDefinition, BindingError> {
    let mut graph = Graph::new();
    let mut placeholders = Vec::with_capacity(bound.slots.len());
    for (slot, _) in &bound.slots {
        let id = session.next_node_id();
        graph.push(GraphNode {
            id,
            kind: NodeKind::Input(slot.clone()),
            params: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: vec![PLACEHOLDER_OUTPUT.to_string()],
        });
        placeholders.push((slot.clone(), id));
    }

    let args = placeholder_args(fragment, bound, &placeholders);
    let outputs = {
        let mut scope = Scope::new(session, &mut graph);
        (fragment.body)(&mut scope, &args)?
    };

    let shape = match &outputs {
        Outputs::None => OutputShape::None,
        Outputs::Single(_) => OutputShape::Single,
        Outputs::Named(_) => OutputShape::Named,
    };
    let outputs = outputs.into_entries();
    for (_, value) in &outputs {
        graph.check_value(value, &fragment.name)?;
    }

    let slots = bound.slot_names();
    let (nodes, effects) = graph.into_parts();
    let record = GraphRecord::from_nodes(
        &fragment.name,
        &slots,
        &fragment.parameters,
        &nodes,
        &outputs,
        &effects,
    );

    Ok(FragmentDefinition {
        key,
        name: fragment.name.clone(),
        slots,
        parameters: fragment.parameters.clone(),
        placeholders,
        nodes,
        outputs,
        shape,
        effects,
        record,
    })
}

/// Rebuilds the function's own argument structure over the placeholders, so
/// the body can address its inputs the way it declared them.
fn placeholder_args(
    fragment: &Fragment,
    bound: &BoundCall,
    placeholders: &[(String, NodeId)],
) -> Args {
    let handle = |i: usize| Value::Handle(GraphHandle::new(placeholders[i].1, PLACEHOLDER_OUTPUT));
    let layout = &bound.layout;

    let mut i = 0;
    let mut fixed = Vec::new();
    for name in &layout.positional {
        fixed.push((name.clone(), handle(i)));
        i += 1;
    }
    let varargs: Vec<Value> = (i..i + layout.varargs).map(handle).collect();
    i += layout.varargs;
    for name in &layout.keyword_only {
        fixed.push((name.clone(), handle(i)));
        i += 1;
    }
    let kwargs = layout
        .varkw
        .iter()
        .enumerate()
        .map(|(offset, key)| (key.clone(), handle(i + offset)))
        .collect();

    Args::new(
        fragment.name.clone(),
        fixed,
        varargs,
        kwargs,
        fragment.parameters.iter().map(|p| p.name.clone()).collect(),
    )
}
