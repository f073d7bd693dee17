use crate::error::BindingError;
use crate::graph::{Param, Value};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// A fixed (named) parameter of a fragment function.
#[derive(Debug, Clone)]
pub struct FixedParam {
    pub name: String,
    pub default: Option<Value>,
}

/// The shape of a fragment function's argument list: fixed positional
/// parameters, an optional variadic-positional collector, keyword-only
/// parameters and an optional variadic-keyword collector.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    positional: Vec<FixedParam>,
    varargs: Option<String>,
    keyword_only: Vec<FixedParam>,
    varkw: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(mut self, name: impl Into<String>) -> Self {
        self.positional.push(FixedParam {
            name: name.into(),
            default: None,
        });
        self
    }

    pub fn positional_with_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        self.positional.push(FixedParam {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    pub fn varargs(mut self, name: impl Into<String>) -> Self {
        self.varargs = Some(name.into());
        self
    }

    pub fn keyword_only(mut self, name: impl Into<String>) -> Self {
        self.keyword_only.push(FixedParam {
            name: name.into(),
            default: None,
        });
        self
    }

    pub fn keyword_only_with_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        self.keyword_only.push(FixedParam {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    pub fn varkw(mut self, name: impl Into<String>) -> Self {
        self.varkw = Some(name.into());
        self
    }

    fn fixed(&self) -> impl Iterator<Item = &FixedParam> {
        self.positional.iter().chain(self.keyword_only.iter())
    }
}

/// An external parameter declared on a fragment or workspace. Callers bind it
/// by keyword; inside the body it is only available as a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub default: Option<String>,
}

impl ParamDecl {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

impl From<&str> for ParamDecl {
    fn from(name: &str) -> Self {
        ParamDecl::required(name)
    }
}

/// The arguments of one call site.
///
/// ```rust
/// use boxwright::prelude::*;
///
/// let args = CallArgs::new().arg("name").kwarg("p", pp("$p"));
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.push((name.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The result of matching a call against a signature.
#[derive(Debug, Clone)]
pub(crate) struct BoundCall {
    /// Normalized data slots in their canonical order.
    pub slots: Vec<(String, Value)>,
    /// Declared parameters, in declaration order.
    pub params: Vec<(String, Param)>,
    pub layout: SlotLayout,
}

/// How the normalized slots map back onto the function's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SlotLayout {
    pub positional: Vec<String>,
    pub varargs: usize,
    pub keyword_only: Vec<String>,
    pub varkw: Vec<String>,
}

impl BoundCall {
    pub fn slot_names(&self) -> Vec<String> {
        self.slots.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// Matches `args` against `signature` and the declared `params`.
///
/// A fixed parameter that shares its name with a declared parameter is
/// treated as that parameter and does not produce a data slot.
pub(crate) fn bind(
    fragment: &str,
    signature: &Signature,
    params: &[ParamDecl],
    args: &CallArgs,
) -> Result<BoundCall, BindingError> {
    let is_param = |name: &str| params.iter().any(|p| p.name == name);
    let mut fixed_values: Vec<(String, Option<Value>)> = signature
        .fixed()
        .map(|p| (p.name.clone(), None))
        .collect();
    let mut param_values: Vec<(String, Option<Param>)> =
        params.iter().map(|p| (p.name.clone(), None)).collect();

    // Positional arguments fill the fixed positional parameters first.
    let positional_count = signature.positional.len();
    let mut extras = Vec::new();
    for (i, value) in args.positional.iter().enumerate() {
        if i < positional_count {
            fixed_values[i].1 = Some(value.clone());
        } else if signature.varargs.is_some() {
            extras.push(value.clone());
        } else {
            return Err(BindingError::TooManyPositional {
                fragment: fragment.to_string(),
                expected: positional_count,
                given: args.positional.len(),
            });
        }
    }

    let mut collected: Vec<(String, Value)> = Vec::new();
    for (name, value) in &args.keywords {
        if let Some(slot) = fixed_values.iter_mut().find(|(n, _)| n == name) {
            if slot.1.is_some() {
                return Err(BindingError::MultipleValues {
                    fragment: fragment.to_string(),
                    name: name.clone(),
                });
            }
            slot.1 = Some(value.clone());
        } else if let Some(param) = param_values.iter_mut().find(|(n, _)| n == name) {
            if param.1.is_some() {
                return Err(BindingError::MultipleValues {
                    fragment: fragment.to_string(),
                    name: name.clone(),
                });
            }
            param.1 = Some(to_param(fragment, name, value)?);
        } else if signature.varkw.is_some() {
            if collected.iter().any(|(n, _)| n == name) {
                return Err(BindingError::MultipleValues {
                    fragment: fragment.to_string(),
                    name: name.clone(),
                });
            }
            collected.push((name.clone(), value.clone()));
        } else {
            return Err(BindingError::UnexpectedKeyword {
                fragment: fragment.to_string(),
                name: name.clone(),
            });
        }
    }

    // Fixed parameters doubling as declared parameters move over.
    for (name, value) in fixed_values.iter_mut() {
        if !is_param(name) {
            continue;
        }
        if let Some(value) = value.take() {
            let param = param_values
                .iter_mut()
                .find(|(n, _)| n == name)
                .map(|(_, p)| p);
            if let Some(slot) = param {
                if slot.is_some() {
                    return Err(BindingError::MultipleValues {
                        fragment: fragment.to_string(),
                        name: name.clone(),
                    });
                }
                *slot = Some(to_param(fragment, name, &value)?);
            }
        }
    }

    let mut slots: Vec<(String, Value)> = Vec::new();
    let mut layout = SlotLayout {
        positional: Vec::new(),
        varargs: extras.len(),
        keyword_only: Vec::new(),
        varkw: Vec::new(),
    };
    let defaults = signature.fixed().map(|p| p.default.clone());
    let fixed: Vec<_> = fixed_values.into_iter().zip(defaults).collect();
    let (positional, keyword_only) = fixed.split_at(positional_count);

    for ((name, value), default) in positional {
        if is_param(name) {
            continue;
        }
        slots.push((name.clone(), require(fragment, name, value, default)?));
        layout.positional.push(name.clone());
    }
    if let Some(varargs) = &signature.varargs {
        for (i, value) in extras.into_iter().enumerate() {
            slots.push((format!("{}_{}", varargs, i + 1), value));
        }
    }
    for ((name, value), default) in keyword_only {
        if is_param(name) {
            continue;
        }
        slots.push((name.clone(), require(fragment, name, value, default)?));
        layout.keyword_only.push(name.clone());
    }
    if let Some(varkw) = &signature.varkw {
        for (key, value) in collected {
            slots.push((format!("{}_{}", varkw, key), value));
            layout.varkw.push(key);
        }
    }

    let mut seen = AHashSet::new();
    for (name, _) in &slots {
        if !seen.insert(name.as_str()) || is_param(name) {
            return Err(BindingError::AmbiguousSlot {
                fragment: fragment.to_string(),
                slot: name.clone(),
            });
        }
    }

    let params = params
        .iter()
        .zip(param_values)
        .map(|(decl, (name, value))| match (value, &decl.default) {
            (Some(value), _) => Ok((name, value)),
            (None, Some(default)) => Ok((name, Param::from(default.as_str()))),
            (None, None) => Err(BindingError::MissingParameter {
                fragment: fragment.to_string(),
                parameter: name,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BoundCall {
        slots,
        params,
        layout,
    })
}

fn require(
    fragment: &str,
    name: &str,
    value: &Option<Value>,
    default: &Option<Value>,
) -> Result<Value, BindingError> {
    value
        .clone()
        .or_else(|| default.clone())
        .ok_or_else(|| BindingError::MissingArgument {
            fragment: fragment.to_string(),
            slot: name.to_string(),
        })
}

fn to_param(fragment: &str, name: &str, value: &Value) -> Result<Param, BindingError> {
    match value {
        Value::Literal(l) => Ok(Param::Literal(l.clone())),
        Value::Template(t) => Ok(Param::Template(t.clone())),
        Value::Handle(h) => Err(BindingError::HandleAsParameter {
            fragment: fragment.to_string(),
            name: name.to_string(),
            handle: h.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphHandle, pp};

    fn eg() -> Value {
        Value::Handle(GraphHandle::new(1, "graph"))
    }

    fn full() -> Signature {
        Signature::new()
            .positional("i")
            .varargs("j")
            .keyword_only("k")
            .varkw("l")
    }

    #[test]
    fn normalizes_every_parameter_kind() {
        let args = CallArgs::new()
            .arg(eg())
            .arg(eg())
            .arg(eg())
            .kwarg("k", eg())
            .kwarg("l", eg())
            .kwarg("m", eg());
        let bound = bind("f", &full(), &[], &args).unwrap();
        assert_eq!(bound.slot_names(), vec!["i", "j_1", "j_2", "k", "l_l", "l_m"]);
        assert_eq!(bound.layout.varargs, 2);
        assert_eq!(bound.layout.varkw, vec!["l", "m"]);
    }

    #[test]
    fn keyword_only_order_follows_declaration_not_call() {
        let sig = Signature::new().keyword_only("b").keyword_only("a");
        let args = CallArgs::new().kwarg("a", 1i64).kwarg("b", 2i64);
        let bound = bind("f", &sig, &[], &args).unwrap();
        assert_eq!(bound.slot_names(), vec!["b", "a"]);
    }

    #[test]
    fn missing_fixed_argument_is_reported_with_its_name() {
        let err = bind("f", &full(), &[], &CallArgs::new().arg(eg())).unwrap_err();
        assert_eq!(
            err,
            BindingError::MissingArgument {
                fragment: "f".to_string(),
                slot: "k".to_string()
            }
        );
    }

    #[test]
    fn defaults_fill_missing_fixed_arguments() {
        let sig = Signature::new().positional("x").positional_with_default("limit", 10i64);
        let bound = bind("f", &sig, &[], &CallArgs::new().arg(eg())).unwrap();
        assert_eq!(bound.slots[1], ("limit".to_string(), Value::from(10i64)));
    }

    #[test]
    fn rejects_extra_positional_and_unknown_keyword() {
        let sig = Signature::new().positional("x");
        let err = bind("f", &sig, &[], &CallArgs::new().arg(eg()).arg(eg())).unwrap_err();
        assert!(matches!(err, BindingError::TooManyPositional { expected: 1, given: 2, .. }));

        let err = bind("f", &sig, &[], &CallArgs::new().arg(eg()).kwarg("y", eg())).unwrap_err();
        assert!(matches!(err, BindingError::UnexpectedKeyword { name, .. } if name == "y"));
    }

    #[test]
    fn keyword_repeating_a_positional_is_rejected() {
        let sig = Signature::new().positional("x");
        let err = bind("f", &sig, &[], &CallArgs::new().arg(eg()).kwarg("x", eg())).unwrap_err();
        assert!(matches!(err, BindingError::MultipleValues { name, .. } if name == "x"));
    }

    #[test]
    fn collected_keyword_colliding_with_fixed_slot_is_ambiguous() {
        let sig = Signature::new().positional("l_m").varkw("l");
        let args = CallArgs::new().arg(eg()).kwarg("m", eg());
        let err = bind("f", &sig, &[], &args).unwrap_err();
        assert!(matches!(err, BindingError::AmbiguousSlot { slot, .. } if slot == "l_m"));
    }

    #[test]
    fn declared_parameters_are_not_slots() {
        let sig = Signature::new().positional("t").positional("query");
        let params = [ParamDecl::required("query")];
        let args = CallArgs::new().arg(eg()).kwarg("query", pp("select $column"));
        let bound = bind("f", &sig, &params, &args).unwrap();
        assert_eq!(bound.slot_names(), vec!["t"]);
        assert_eq!(
            bound.params,
            vec![("query".to_string(), Param::Template(pp("select $column")))]
        );
    }

    #[test]
    fn parameters_need_a_value_or_default_and_reject_handles() {
        let sig = Signature::new().positional("x");
        let params = [ParamDecl::required("p"), ParamDecl::with_default("q", "7")];
        let err = bind("f", &sig, &params, &CallArgs::new().arg(eg())).unwrap_err();
        assert!(matches!(err, BindingError::MissingParameter { parameter, .. } if parameter == "p"));

        let bound = bind("f", &sig, &params, &CallArgs::new().arg(eg()).kwarg("p", "a")).unwrap();
        assert_eq!(bound.params[1], ("q".to_string(), Param::from("7")));

        let err = bind("f", &sig, &params, &CallArgs::new().arg(eg()).kwarg("p", eg())).unwrap_err();
        assert!(matches!(err, BindingError::HandleAsParameter { .. }));
    }
}
