//! The top-level graph a user authors, saves and submits.

use crate::engine::Engine;
use crate::error::{BindingError, SaveError, TemplateError, WorkspaceError};
use crate::fragment::{FragmentInstance, Outputs, ParamDecl};
use crate::graph::{
    Environment, ExecutionGraph, Graph, GraphNode, Literal, NodeId, Resolved, Value,
};
use crate::session::{Scope, Session};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "debug-tools")]
use {crate::graph::DisplayGraph, std::fs};

mod artifact;
mod finalize;
mod validate;

pub use artifact::{GraphRecord, NodeRecord, RecordKind, SavedWorkspace};

/// Lifecycle of a workspace. `Saved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    Open,
    Saving,
    Saved,
}

/// A named top-level graph with its own parameters, outputs and side
/// effects.
#[derive(Debug)]
pub struct Workspace {
    name: String,
    parameters: Vec<ParamDecl>,
    graph: Graph,
    outputs: Vec<(String, Value)>,
    state: WorkspaceState,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            graph: Graph::new(),
            outputs: Vec::new(),
            state: WorkspaceState::Open,
        }
    }

    /// Declares workspace parameters, supplied when the workspace is
    /// finalized. Declared defaults fill in for values not supplied.
    pub fn with_parameters<I, P>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParamDecl>,
    {
        self.parameters.extend(parameters.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParamDecl] {
        &self.parameters
    }

    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.graph.node(id)
    }

    pub fn instance(&self, id: NodeId) -> Option<&FragmentInstance> {
        self.graph.node(id).and_then(GraphNode::instance)
    }

    pub fn outputs(&self) -> &[(String, Value)] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Runs `body` against this workspace's graph. Whatever it returns
    /// becomes (or replaces, by name) the workspace outputs.
    ///
    /// If `body` fails, or returns a value foreign to this workspace, the
    /// nodes and effects it added are dropped again.
    pub fn author<F>(&mut self, session: &mut Session, body: F) -> Result<(), WorkspaceError>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<Outputs, BindingError>,
    {
        if self.state == WorkspaceState::Saved {
            return Err(SaveError::Sealed(self.name.clone()).into());
        }

        let nodes = self.graph.len();
        let effects = self.graph.effects().len();
        let outputs = match self.run_author(session, body) {
            Ok(outputs) => outputs,
            Err(e) => {
                self.graph.truncate(nodes, effects);
                debug!(workspace = %self.name, kept = nodes, error = %e, "authoring rolled back");
                return Err(e.into());
            }
        };
        for (name, value) in outputs {
            match self.outputs.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = value,
                None => self.outputs.push((name, value)),
            }
        }
        Ok(())
    }

    fn run_author<F>(&mut self, session: &mut Session, body: F) -> Result<Vec<(String, Value)>, BindingError>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<Outputs, BindingError>,
    {
        let outputs = {
            let mut scope = Scope::new(session, &mut self.graph);
            body(&mut scope)?
        };
        let entries = outputs.into_entries();
        for (_, value) in &entries {
            self.graph.check_value(value, &self.name)?;
        }
        Ok(entries)
    }

    /// Checks that every custom box name used anywhere in the workspace
    /// stands for one body and does not clash with the workspace itself.
    pub fn validate(&self) -> Result<Vec<GraphRecord>, SaveError> {
        validate::collect_fragments(&self.name, self.graph.nodes())
    }

    /// Canonical content of the workspace itself.
    pub fn record(&self) -> GraphRecord {
        GraphRecord::from_nodes(
            &self.name,
            &[],
            &self.parameters,
            self.graph.nodes(),
            &self.outputs,
            self.graph.effects(),
        )
    }

    /// Validates the workspace and every custom box it uses, then seals it.
    ///
    /// Every template must be resolvable from the declared parameters. On
    /// failure the workspace is left open so it can be fixed and saved
    /// again.
    #[instrument(level = "debug", skip(self), fields(workspace = %self.name))]
    pub fn save(&mut self, path: &str) -> Result<SavedWorkspace, WorkspaceError> {
        if self.state == WorkspaceState::Saved {
            return Err(SaveError::Sealed(self.name.clone()).into());
        }

        self.state = WorkspaceState::Saving;
        match self.check_for_save() {
            Ok(fragments) => {
                self.state = WorkspaceState::Saved;
                info!(path, fragments = fragments.len(), "saved workspace");
                Ok(SavedWorkspace {
                    path: path.to_string(),
                    root: self.record(),
                    fragments,
                })
            }
            Err(e) => {
                self.state = WorkspaceState::Open;
                warn!(error = %e, "workspace rejected");
                Err(e)
            }
        }
    }

    fn check_for_save(&self) -> Result<Vec<GraphRecord>, WorkspaceError> {
        let fragments = self.validate()?;
        // Declared names are enough to prove every marker is bound.
        let declared: Environment = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.default.clone().unwrap_or_default()))
            .collect();
        self.finalize(&declared)?;
        Ok(fragments)
    }

    /// Inlines every fragment instance and substitutes every template, with
    /// `env` supplying the workspace parameters.
    #[instrument(level = "debug", skip_all, fields(workspace = %self.name))]
    pub fn finalize(&self, env: &Environment) -> Result<ExecutionGraph, TemplateError> {
        let env = self.environment(env);
        finalize::finalize(
            &self.name,
            self.graph.nodes(),
            &self.outputs,
            self.graph.effects(),
            &env,
        )
    }

    /// Computes `value` through `engine`.
    pub fn compute<E: Engine>(
        &self,
        engine: &mut E,
        value: &Value,
        env: &Environment,
    ) -> Result<E::Output, WorkspaceError> {
        let graph = self.prepare(env)?;
        let target = match value {
            Value::Handle(handle) => {
                if !self.graph.contains(handle.node) {
                    return Err(WorkspaceError::UnknownNode(handle.node));
                }
                graph.resolve_handle(handle)
            }
            Value::Literal(literal) => Resolved::Literal(literal.clone()),
            Value::Template(template) => Resolved::Literal(Literal::String(
                template.resolve(&self.environment(env), &self.name)?,
            )),
        };
        info!(workspace = %self.name, "submitting computation");
        Ok(engine.compute(&graph, &target)?)
    }

    /// Computes the workspace output called `name`.
    pub fn compute_output<E: Engine>(
        &self,
        engine: &mut E,
        name: &str,
        env: &Environment,
    ) -> Result<E::Output, WorkspaceError> {
        let value = self
            .output(name)
            .ok_or_else(|| WorkspaceError::UnknownOutput(name.to_string()))?
            .clone();
        self.compute(engine, &value, env)
    }

    /// Runs the side effects of one node of the workspace: the node itself
    /// for an operation, every effect registered inside it for an instance.
    pub fn trigger<E: Engine>(
        &self,
        engine: &mut E,
        node: NodeId,
        env: &Environment,
    ) -> Result<(), WorkspaceError> {
        if !self.graph.contains(node) {
            return Err(WorkspaceError::UnknownNode(node));
        }
        let graph = self.prepare(env)?;
        let effects = graph.expand_effects(&[node]);
        info!(workspace = %self.name, node, effects = effects.len(), "triggering");
        Ok(engine.trigger(&graph, &effects)?)
    }

    /// Runs every side effect registered on the workspace, in registration
    /// order.
    pub fn trigger_all_side_effects<E: Engine>(
        &self,
        engine: &mut E,
        env: &Environment,
    ) -> Result<(), WorkspaceError> {
        let graph = self.prepare(env)?;
        info!(
            workspace = %self.name,
            effects = graph.side_effects.len(),
            "triggering all side effects"
        );
        Ok(engine.trigger(&graph, &graph.side_effects)?)
    }

    /// Validation first: a workspace with clashing names is never submitted.
    fn prepare(&self, env: &Environment) -> Result<ExecutionGraph, WorkspaceError> {
        self.validate()?;
        let graph = self.finalize(env)?;

        #[cfg(feature = "debug-tools")]
        {
            let path = format!("debug_output/{}.txt", self.sanitize_filename());
            let content = DisplayGraph { graph: &graph }.to_string();
            if let Err(e) = fs::create_dir_all("debug_output").and_then(|_| fs::write(&path, content)) {
                warn!(path = %path, error = %e, "could not write debug output");
            }
        }

        Ok(graph)
    }

    fn environment(&self, env: &Environment) -> Environment {
        let mut merged: Environment = self
            .parameters
            .iter()
            .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
            .collect();
        merged.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    #[cfg(feature = "debug-tools")]
    fn sanitize_filename(&self) -> String {
        self.name
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect::<String>()
    }
}
