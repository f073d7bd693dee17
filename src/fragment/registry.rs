use super::{FragmentDefinition, FragmentId};
use ahash::AHashMap;
use std::rc::Rc;

/// Everything a captured body depends on: which function, under which
/// name, with which declared parameters and which normalized slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureKey {
    pub fragment: FragmentId,
    pub name: String,
    pub parameters: Vec<String>,
    pub slots: Vec<String>,
}

/// Write-once cache of captured definitions, owned by a session.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: AHashMap<CaptureKey, Rc<FragmentDefinition>>,
    in_progress: Vec<FragmentId>,
    captures: usize,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CaptureKey) -> Option<Rc<FragmentDefinition>> {
        self.definitions.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// How many bodies have been run so far.
    pub fn captures(&self) -> usize {
        self.captures
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Rc<FragmentDefinition>> {
        self.definitions.values()
    }

    /// Returns false if `fragment` is already being captured further up the
    /// stack.
    pub(crate) fn begin_capture(&mut self, fragment: FragmentId) -> bool {
        if self.in_progress.contains(&fragment) {
            return false;
        }
        self.in_progress.push(fragment);
        true
    }

    pub(crate) fn end_capture(&mut self, fragment: FragmentId) {
        if let Some(pos) = self.in_progress.iter().rposition(|f| *f == fragment) {
            self.in_progress.remove(pos);
        }
    }

    pub(crate) fn insert(&mut self, definition: FragmentDefinition) -> Rc<FragmentDefinition> {
        self.captures += 1;
        let definition = Rc::new(definition);
        self.definitions
            .insert(definition.key.clone(), Rc::clone(&definition));
        definition
    }
}
