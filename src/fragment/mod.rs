//! Fragments: ordinary closures turned into reusable graph templates.
//!
//! A [`Fragment`] pairs a [`Signature`] with a body. The first call with a
//! given slot layout runs the body once against placeholder inputs and keeps
//! the recorded nodes as a [`FragmentDefinition`]; every call, including the
//! first, then stamps out a private copy of that definition wired to the
//! caller's arguments.

use crate::effects::SideEffectCollector;
use crate::error::BindingError;
use crate::graph::{GraphHandle, GraphNode, NodeId, Value};
use crate::session::Scope;
use crate::workspace::GraphRecord;
use std::fmt;
use std::rc::Rc;

mod args;
mod capture;
mod instance;
mod registry;
pub mod signature;

pub use args::Args;
pub use instance::FragmentInstance;
pub use registry::{CaptureKey, DefinitionRegistry};
pub use signature::{CallArgs, FixedParam, ParamDecl, Signature};

pub(crate) use capture::capture;
pub(crate) use instance::instantiate;

/// The closure type behind a fragment.
pub type Body = dyn Fn(&mut Scope<'_>, &Args) -> Result<Outputs, BindingError>;

/// Identity of a fragment function, assigned by the session that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub(crate) u64);

/// What a body (or a workspace) returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Outputs {
    /// Nothing to return; the body only registers side effects.
    None,
    /// One implicit output, exposed as `output`.
    Single(Value),
    /// One output per entry, in the given order.
    Named(Vec<(String, Value)>),
}

impl Outputs {
    pub const SINGLE: &'static str = "output";

    pub fn single(value: impl Into<Value>) -> Self {
        Outputs::Single(value.into())
    }

    pub fn named<I, S, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Outputs::Named(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Value)> {
        match self {
            Outputs::None => Vec::new(),
            Outputs::Single(v) => vec![(Self::SINGLE.to_string(), v)],
            Outputs::Named(entries) => entries,
        }
    }
}

impl From<Value> for Outputs {
    fn from(value: Value) -> Self {
        Outputs::Single(value)
    }
}

/// Whether a definition returned one value or a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    None,
    Single,
    Named,
}

/// A fragment function: name, signature, declared parameters and body.
#[derive(Clone)]
pub struct Fragment {
    pub(crate) id: FragmentId,
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) parameters: Vec<ParamDecl>,
    pub(crate) body: Rc<Body>,
}

impl Fragment {
    pub fn id(&self) -> FragmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParamDecl] {
        &self.parameters
    }

    /// Same function under a different persisted name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares external parameters, bound by keyword at every call site.
    pub fn with_parameters<I, P>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParamDecl>,
    {
        self.parameters.extend(parameters.into_iter().map(Into::into));
        self
    }

    pub fn with_parameter_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParamDecl::with_default(name, default));
        self
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A captured fragment body.
#[derive(Debug)]
pub struct FragmentDefinition {
    pub(crate) key: CaptureKey,
    pub(crate) name: String,
    pub(crate) slots: Vec<String>,
    pub(crate) parameters: Vec<ParamDecl>,
    pub(crate) placeholders: Vec<(String, NodeId)>,
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) outputs: Vec<(String, Value)>,
    pub(crate) shape: OutputShape,
    pub(crate) effects: SideEffectCollector,
    pub(crate) record: GraphRecord,
}

impl FragmentDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &CaptureKey {
        &self.key
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn parameters(&self) -> &[ParamDecl] {
        &self.parameters
    }

    /// Captured nodes, placeholder inputs included.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn outputs(&self) -> &[(String, Value)] {
        &self.outputs
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    pub fn effects(&self) -> &SideEffectCollector {
        &self.effects
    }

    /// Canonical, persistable content. Two definitions are the same fragment
    /// exactly when their records are equal.
    pub fn record(&self) -> &GraphRecord {
        &self.record
    }

    pub(crate) fn placeholder(&self, slot: &str) -> Option<NodeId> {
        self.placeholders
            .iter()
            .find(|(s, _)| s == slot)
            .map(|(_, id)| *id)
    }
}

/// The caller's view of one fragment call.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub(crate) fragment: String,
    pub(crate) node: NodeId,
    pub(crate) shape: OutputShape,
    pub(crate) outputs: Vec<(String, Value)>,
}

impl Instance {
    /// The instance node in the caller's graph; register it to surface the
    /// fragment's side effects.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The single output of a fragment that returned one value.
    pub fn value(&self) -> Result<Value, BindingError> {
        match self.shape {
            OutputShape::Single => Ok(Value::Handle(GraphHandle::new(
                self.node,
                Outputs::SINGLE,
            ))),
            OutputShape::None => Err(BindingError::NoOutputs {
                name: self.fragment.clone(),
            }),
            OutputShape::Named => Err(BindingError::SingleOutputExpected {
                name: self.fragment.clone(),
                outputs: self.outputs.iter().map(|(n, _)| n.clone()).collect(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn outputs(&self) -> &[(String, Value)] {
        &self.outputs
    }
}
