//! Deferred string templates.
//!
//! A [`ParameterTemplate`] is kept verbatim while a graph is being authored and
//! only substituted when the graph is finalized for submission. Markers take
//! the forms `$name` and `${name}`; `$$` stands for a literal dollar sign and a
//! `$` followed by anything else is kept as is.

use crate::error::TemplateError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter values visible at one point of the graph, by parameter name.
pub type Environment = AHashMap<String, String>;

/// A string with substitution markers, resolved once at finalize time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterTemplate {
    source: String,
}

/// Shorthand for [`ParameterTemplate::new`].
pub fn pp(source: impl Into<String>) -> ParameterTemplate {
    ParameterTemplate::new(source)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Marker(&'a str),
}

impl ParameterTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// A template consisting of a single reference to `name`.
    pub fn marker(name: &str) -> Self {
        Self::new(format!("${{{}}}", name))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names referenced by this template, in order of appearance.
    pub fn markers(&self) -> Result<Vec<String>, TemplateError> {
        Ok(self
            .segments()?
            .into_iter()
            .filter_map(|s| match s {
                Segment::Marker(name) => Some(name.to_string()),
                Segment::Text(_) => None,
            })
            .collect())
    }

    /// Substitutes every marker from `env`. The substituted values are not
    /// scanned again.
    pub fn resolve(&self, env: &Environment, context: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in self.segments()? {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Marker(name) => {
                    let value = env.get(name).ok_or_else(|| TemplateError::Unresolved {
                        marker: name.to_string(),
                        template: self.source.clone(),
                        context: context.to_string(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn segments(&self) -> Result<Vec<Segment<'_>>, TemplateError> {
        let src = self.source.as_str();
        let bytes = src.as_bytes();
        let mut segments = Vec::new();
        let mut text_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }
            match bytes.get(i + 1) {
                Some(b'$') => {
                    // Keep the first `$`, drop the second.
                    segments.push(Segment::Text(&src[text_start..i + 1]));
                    i += 2;
                    text_start = i;
                }
                Some(b'{') => {
                    let close = src[i + 2..].find('}').ok_or_else(|| TemplateError::Malformed {
                        template: self.source.clone(),
                        position: i,
                    })?;
                    let name = &src[i + 2..i + 2 + close];
                    if name.is_empty() {
                        return Err(TemplateError::Malformed {
                            template: self.source.clone(),
                            position: i,
                        });
                    }
                    if text_start < i {
                        segments.push(Segment::Text(&src[text_start..i]));
                    }
                    segments.push(Segment::Marker(name));
                    i += close + 3;
                    text_start = i;
                }
                Some(c) if c.is_ascii_alphabetic() || *c == b'_' => {
                    let end = src[i + 1..]
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .map_or(src.len(), |offset| i + 1 + offset);
                    if text_start < i {
                        segments.push(Segment::Text(&src[text_start..i]));
                    }
                    segments.push(Segment::Marker(&src[i + 1..end]));
                    i = end;
                    text_start = i;
                }
                _ => i += 1,
            }
        }
        if text_start < src.len() {
            segments.push(Segment::Text(&src[text_start..]));
        }
        Ok(segments)
    }
}

impl fmt::Display for ParameterTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_both_marker_forms() {
        let t = pp("select $col from vertices where name == \"${who}\"");
        let out = t.resolve(&env(&[("col", "age"), ("who", "Bob")]), "test").unwrap();
        assert_eq!(out, "select age from vertices where name == \"Bob\"");
        assert_eq!(t.markers().unwrap(), vec!["col", "who"]);
    }

    #[test]
    fn bare_marker_stops_at_non_identifier() {
        let t = pp("$a.b-$c");
        assert_eq!(t.resolve(&env(&[("a", "1"), ("c", "2")]), "test").unwrap(), "1.b-2");
    }

    #[test]
    fn dollar_escapes_and_stray_dollars_are_text() {
        let t = pp("cost: $$5, $ 3, $9");
        assert!(t.markers().unwrap().is_empty());
        assert_eq!(t.resolve(&Environment::new(), "test").unwrap(), "cost: $5, $ 3, $9");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let t = pp("$q");
        let out = t.resolve(&env(&[("q", "select $column")]), "test").unwrap();
        assert_eq!(out, "select $column");
    }

    #[test]
    fn missing_marker_names_the_marker() {
        let err = pp("where x > ${limit}")
            .resolve(&env(&[("field", "x")]), "node #4")
            .unwrap_err();
        match err {
            TemplateError::Unresolved { marker, context, .. } => {
                assert_eq!(marker, "limit");
                assert_eq!(context, "node #4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_brace_is_malformed() {
        assert!(matches!(
            pp("abc ${oops").markers(),
            Err(TemplateError::Malformed { position: 4, .. })
        ));
        assert!(matches!(pp("${}").markers(), Err(TemplateError::Malformed { .. })));
    }

    #[test]
    fn marker_helper_round_trips() {
        let t = ParameterTemplate::marker("p");
        assert_eq!(t.source(), "${p}");
        assert_eq!(t.resolve(&env(&[("p", "name")]), "test").unwrap(), "name");
    }
}
