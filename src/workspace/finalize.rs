use crate::effects::SideEffectCollector;
use crate::error::TemplateError;
use crate::graph::{
    Environment, ExecutionGraph, GraphHandle, GraphNode, Literal, NodeKind, Param, Resolved,
    ResolvedNode, Value,
};
use std::collections::BTreeMap;

/// Inlines every fragment instance and substitutes every template.
///
/// Each instance sees its caller's environment extended with its own
/// bindings; a binding given as a template is substituted in the caller's
/// environment before the instance body is visited.
pub(crate) fn finalize(
    workspace: &str,
    nodes: &[GraphNode],
    outputs: &[(String, Value)],
    effects: &SideEffectCollector,
    env: &Environment,
) -> Result<ExecutionGraph, TemplateError> {
    let mut finalizer = Finalizer {
        graph: ExecutionGraph::default(),
    };
    finalizer.flatten(nodes, env, workspace)?;

    let context = format!("outputs of {}", workspace);
    for (name, value) in outputs {
        let resolved = finalizer.resolve(value, env, &context)?;
        finalizer.graph.outputs.push((name.clone(), resolved));
    }
    finalizer.graph.side_effects = finalizer.graph.expand_effects(effects.nodes());
    Ok(finalizer.graph)
}

struct Finalizer {
    graph: ExecutionGraph,
}

impl Finalizer {
    fn flatten(
        &mut self,
        nodes: &[GraphNode],
        env: &Environment,
        path: &str,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            let context = format!("{} in {}", node.label(), path);
            match &node.kind {
                // Placeholders only exist inside captured definitions.
                NodeKind::Input(_) => {}
                NodeKind::Operation(op) => {
                    let params = node
                        .params
                        .iter()
                        .map(|(k, p)| Ok((k.clone(), resolve_param(p, env, &context)?)))
                        .collect::<Result<BTreeMap<_, _>, TemplateError>>()?;
                    let inputs = node
                        .inputs
                        .iter()
                        .map(|(k, v)| Ok((k.clone(), self.resolve(v, env, &context)?)))
                        .collect::<Result<Vec<_>, TemplateError>>()?;
                    self.graph.push(ResolvedNode {
                        id: node.id,
                        op: op.clone(),
                        params,
                        inputs,
                        outputs: node.outputs.clone(),
                    });
                }
                NodeKind::Instance(instance) => {
                    let mut inner = env.clone();
                    for (name, param) in instance.bindings() {
                        let text = match param {
                            Param::Literal(l) => l.to_string(),
                            Param::Template(t) => t.resolve(env, &context)?,
                        };
                        inner.insert(name.clone(), text);
                    }

                    let inner_path = format!("{} > {}", path, instance.definition().name());
                    self.flatten(instance.body(), &inner, &inner_path)?;

                    for (name, value) in instance.outputs() {
                        let resolved = self.resolve(value, &inner, &context)?;
                        self.graph
                            .aliases
                            .insert(GraphHandle::new(node.id, name.clone()), resolved);
                    }
                    self.graph
                        .instance_effects
                        .insert(node.id, instance.effects().nodes().to_vec());
                }
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        value: &Value,
        env: &Environment,
        context: &str,
    ) -> Result<Resolved, TemplateError> {
        match value {
            Value::Handle(h) => Ok(self.graph.resolve_handle(h)),
            Value::Literal(l) => Ok(Resolved::Literal(l.clone())),
            Value::Template(t) => Ok(Resolved::Literal(Literal::String(
                t.resolve(env, context)?,
            ))),
        }
    }
}

fn resolve_param(param: &Param, env: &Environment, context: &str) -> Result<Literal, TemplateError> {
    match param {
        Param::Literal(l) => Ok(l.clone()),
        Param::Template(t) => Ok(Literal::String(t.resolve(env, context)?)),
    }
}
