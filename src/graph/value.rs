use super::template::ParameterTemplate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a node. Unique within an authoring session, so two graphs
/// (or two instances of one fragment) never share a node.
pub type NodeId = u64;

/// Constant values that can be bound to inputs and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

// Manual implementation to handle f64
impl Eq for Literal {}

// Manual implementation to handle f64 by hashing its bits
impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Literal::Number(n) => n.to_bits().hash(state),
            Literal::Bool(b) => b.hash(state),
            Literal::String(s) => s.hash(state),
            Literal::Null => {}
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral values print without a fraction, but only while the
            // conversion to i64 is exact.
            Literal::Number(n) if is_exact_integer(*n) => write!(f, "{}", *n as i64),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::String(s) => write!(f, "{}", s),
            Literal::Null => write!(f, "null"),
        }
    }
}

const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn is_exact_integer(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER && !(n == 0.0 && n.is_sign_negative())
}

/// Reference to one named output of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphHandle {
    pub node: NodeId,
    pub output: String,
}

impl GraphHandle {
    pub fn new(node: NodeId, output: impl Into<String>) -> Self {
        Self {
            node,
            output: output.into(),
        }
    }
}

impl fmt::Display for GraphHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.node, self.output)
    }
}

/// Anything that can flow into a node input or a fragment slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Handle(GraphHandle),
    Literal(Literal),
    Template(ParameterTemplate),
}

impl Value {
    pub fn as_handle(&self) -> Option<&GraphHandle> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Handle(h) => write!(f, "{}", h),
            Value::Literal(l) => write!(f, "{:?}", l.to_string()),
            Value::Template(t) => write!(f, "pp({:?})", t.source()),
        }
    }
}

/// A node parameter: fixed text or a template waiting for its environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    Literal(Literal),
    Template(ParameterTemplate),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Literal(l) => write!(f, "{:?}", l.to_string()),
            Param::Template(t) => write!(f, "pp({:?})", t.source()),
        }
    }
}

impl From<GraphHandle> for Value {
    fn from(handle: GraphHandle) -> Self {
        Value::Handle(handle)
    }
}

impl From<&GraphHandle> for Value {
    fn from(handle: &GraphHandle) -> Self {
        Value::Handle(handle.clone())
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        Value::Literal(literal)
    }
}

impl From<ParameterTemplate> for Value {
    fn from(template: ParameterTemplate) -> Self {
        Value::Template(template)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Literal(Literal::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Literal(Literal::String(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Literal(Literal::Number(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Literal(Literal::Number(n as f64))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Literal(Literal::Bool(b))
    }
}

impl From<ParameterTemplate> for Param {
    fn from(template: ParameterTemplate) -> Self {
        Param::Template(template)
    }
}

impl From<Literal> for Param {
    fn from(literal: Literal) -> Self {
        Param::Literal(literal)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Literal(Literal::String(s.to_string()))
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Literal(Literal::String(s))
    }
}

impl From<f64> for Param {
    fn from(n: f64) -> Self {
        Param::Literal(Literal::Number(n))
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::Literal(Literal::Number(n as f64))
    }
}

impl From<bool> for Param {
    fn from(b: bool) -> Self {
        Param::Literal(Literal::Bool(b))
    }
}
