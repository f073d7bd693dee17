use crate::error::BindingError;
use crate::graph::{ParameterTemplate, Value};

/// The arguments a fragment body sees while it is captured.
///
/// Data inputs are placeholder handles; declared parameters are templates
/// referring to the parameter by name. Every data slot can also be used as a
/// template via [`Args::template`]: when the call site binds that slot to a
/// literal, the template resolves to the literal's text.
#[derive(Debug, Clone)]
pub struct Args {
    fragment: String,
    fixed: Vec<(String, Value)>,
    varargs: Vec<Value>,
    kwargs: Vec<(String, Value)>,
    params: Vec<String>,
}

impl Args {
    pub(crate) fn new(
        fragment: String,
        fixed: Vec<(String, Value)>,
        varargs: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        params: Vec<String>,
    ) -> Self {
        Self {
            fragment,
            fixed,
            varargs,
            kwargs,
            params,
        }
    }

    /// The value of a fixed parameter, or the template of a declared one.
    pub fn get(&self, name: &str) -> Result<Value, BindingError> {
        if let Some((_, value)) = self.fixed.iter().find(|(n, _)| n == name) {
            return Ok(value.clone());
        }
        if self.params.iter().any(|p| p == name) {
            return Ok(Value::Template(ParameterTemplate::marker(name)));
        }
        Err(BindingError::UnknownSlot {
            fragment: self.fragment.clone(),
            name: name.to_string(),
        })
    }

    /// Template referring to a declared parameter or a data slot.
    pub fn template(&self, name: &str) -> Result<ParameterTemplate, BindingError> {
        let known = self.params.iter().any(|p| p == name)
            || self.fixed.iter().any(|(n, _)| n == name);
        if known {
            Ok(ParameterTemplate::marker(name))
        } else {
            Err(BindingError::UnknownSlot {
                fragment: self.fragment.clone(),
                name: name.to_string(),
            })
        }
    }

    /// Extra positional arguments gathered by the variadic collector.
    pub fn varargs(&self) -> &[Value] {
        &self.varargs
    }

    /// Extra keyword arguments gathered by the variadic-keyword collector,
    /// keyed by the caller's keyword.
    pub fn kwargs(&self) -> &[(String, Value)] {
        &self.kwargs
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}
