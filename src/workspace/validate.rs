use super::GraphRecord;
use crate::error::SaveError;
use crate::fragment::{FragmentDefinition, FragmentId};
use crate::graph::{GraphNode, NodeKind};
use ahash::AHashSet;
use itertools::Itertools;
use std::rc::Rc;

/// Collects every custom box reachable from `nodes`, nested calls included,
/// and checks that each name stands for exactly one fragment.
///
/// A fragment called at several arities is captured once per arity; those
/// captures share a name legitimately and each keeps its own record. Two
/// different fragments may only share a name if their bodies are
/// identical. Records are returned in the order they were first reached.
pub(crate) fn collect_fragments(
    workspace: &str,
    nodes: &[GraphNode],
) -> Result<Vec<GraphRecord>, SaveError> {
    let mut walk = Walk {
        workspace,
        visited: AHashSet::new(),
        records: Vec::new(),
        duplicates: Vec::new(),
    };
    walk.nodes(nodes)?;

    if walk.duplicates.is_empty() {
        Ok(walk.records.into_iter().map(|(_, record)| record).collect())
    } else {
        Err(SaveError::DuplicateNames(
            walk.duplicates.into_iter().unique().collect(),
        ))
    }
}

struct Walk<'a> {
    workspace: &'a str,
    visited: AHashSet<*const FragmentDefinition>,
    records: Vec<(Identity, GraphRecord)>,
    duplicates: Vec<String>,
}

/// The function and declared-parameter set a capture was made from.
#[derive(Debug, PartialEq)]
struct Identity {
    fragment: FragmentId,
    parameters: Vec<String>,
}

impl Identity {
    fn of(definition: &FragmentDefinition) -> Self {
        let key = definition.key();
        Self {
            fragment: key.fragment,
            parameters: key.parameters.clone(),
        }
    }
}

impl Walk<'_> {
    fn nodes(&mut self, nodes: &[GraphNode]) -> Result<(), SaveError> {
        for node in nodes {
            if let NodeKind::Instance(instance) = &node.kind {
                self.definition(instance.definition())?;
            }
        }
        Ok(())
    }

    fn definition(&mut self, definition: &Rc<FragmentDefinition>) -> Result<(), SaveError> {
        if definition.name() == self.workspace {
            return Err(SaveError::NameClash(definition.name().to_string()));
        }
        if !self.visited.insert(Rc::as_ptr(definition)) {
            return Ok(());
        }

        let identity = Identity::of(definition);
        let record = definition.record();
        let same_name = || self.records.iter().filter(|(_, r)| r.name == definition.name());
        if same_name().any(|(id, r)| *id != identity && r != record) {
            self.duplicates.push(definition.name().to_string());
        } else if !same_name().any(|(_, r)| r == record) {
            self.records.push((identity, record.clone()));
        }
        self.nodes(definition.nodes())
    }
}
