use crate::graph::NodeId;
use itertools::Itertools;
use thiserror::Error;

/// Errors raised synchronously while authoring: a call or an operation whose
/// arguments do not fit the declared inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("Fragment '{fragment}' is missing a value for input '{slot}'")]
    MissingArgument { fragment: String, slot: String },

    #[error("Fragment '{fragment}' is missing a value for parameter '{parameter}'")]
    MissingParameter { fragment: String, parameter: String },

    #[error("Fragment '{fragment}' takes {expected} positional argument(s), but {given} were given")]
    TooManyPositional {
        fragment: String,
        expected: usize,
        given: usize,
    },

    #[error("Fragment '{fragment}' got multiple values for '{name}'")]
    MultipleValues { fragment: String, name: String },

    #[error("Fragment '{fragment}' got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { fragment: String, name: String },

    #[error("Fragment '{fragment}' would expose input '{slot}' twice; rename the keyword or the parameter")]
    AmbiguousSlot { fragment: String, slot: String },

    #[error("Fragment '{fragment}' has no input or parameter named '{name}'")]
    UnknownSlot { fragment: String, name: String },

    #[error("'{name}' is a parameter of '{fragment}' and cannot take graph handle {handle}")]
    HandleAsParameter {
        fragment: String,
        name: String,
        handle: String,
    },

    #[error("Handle {handle} passed to '{target}' belongs to a different graph")]
    ForeignHandle { handle: String, target: String },

    #[error("Node #{node} is the fragment input '{slot}' and cannot be registered as a side effect")]
    PlaceholderEffect { node: NodeId, slot: String },

    #[error("Node #{node} has no output named '{output}'")]
    UnknownOutput { node: NodeId, output: String },

    #[error("Operation '{operation}' binds input '{input}' more than once")]
    DuplicateInput { operation: String, input: String },

    #[error("'{name}' produces no outputs")]
    NoOutputs { name: String },

    #[error("'{name}' returns named outputs [{outputs}]; pick one by name", outputs = .outputs.join(", "))]
    SingleOutputExpected { name: String, outputs: Vec<String> },

    #[error("Fragment '{fragment}' calls itself while it is being captured")]
    RecursiveCapture { fragment: String },
}

/// Errors found when parameter templates are substituted during finalization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Unresolved parameter '{marker}' in template {template:?} ({context})")]
    Unresolved {
        marker: String,
        template: String,
        context: String,
    },

    #[error("Malformed template {template:?}: unterminated or empty marker at byte {position}")]
    Malformed { template: String, position: usize },
}

/// Errors that block a workspace from being saved or submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    #[error("Duplicate custom box name(s): [{}]", .0.iter().map(|n| format!("'{}'", n)).join(", "))]
    DuplicateNames(Vec<String>),

    #[error("Duplicate name: {0}")]
    NameClash(String),

    #[error("Workspace '{0}' is already saved and can no longer change")]
    Sealed(String),
}

/// An opaque failure reported by the execution engine.
#[derive(Error, Debug)]
#[error("Execution failed: {message}")]
pub struct ExecutionError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors while encoding, decoding or storing a saved workspace.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Serialization failed: {0}")]
    Encode(String),

    #[error("Deserialization failed: {0}")]
    Decode(String),

    #[error("Could not access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure of the end-to-end workspace entry points.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Workspace has no output named '{0}'")]
    UnknownOutput(String),

    #[error("Node #{0} is not part of this workspace")]
    UnknownNode(NodeId),
}
