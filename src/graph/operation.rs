use super::{Param, Value};
use std::collections::BTreeMap;

/// Description of a primitive operation to add to a graph.
///
/// This is the boundary to the engine's catalogue of operations: the
/// authoring layer never interprets `op`, it only wires inputs and carries
/// parameters through.
///
/// ```rust
/// use boxwright::prelude::*;
///
/// let op = Operation::new("filterEquals")
///     .param("column", "name")
///     .param("value", pp("$who"))
///     .outputs(["table"]);
/// assert_eq!(op.tag(), "filterEquals");
/// ```
#[derive(Debug, Clone)]
pub struct Operation {
    pub(crate) op: String,
    pub(crate) params: BTreeMap<String, Param>,
    pub(crate) inputs: Vec<(String, Value)>,
    pub(crate) outputs: Vec<String>,
}

impl Operation {
    /// A new operation with a single output named `output`.
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            params: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: vec!["output".to_string()],
        }
    }

    pub fn tag(&self) -> &str {
        &self.op
    }

    pub fn input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Param>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = names.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the operation as a pure side effect with no outputs.
    pub fn sink(mut self) -> Self {
        self.outputs.clear();
        self
    }
}
