use crate::graph::NodeId;
use ahash::AHashSet;

/// Ordered, duplicate-free list of nodes whose only purpose is their effect
/// outside the graph (persisting a snapshot, exporting a file).
///
/// Registering an instance node stands for every effect registered inside
/// that instance's body; those are expanded when the effects are triggered.
#[derive(Debug, Clone, Default)]
pub struct SideEffectCollector {
    order: Vec<NodeId>,
    seen: AHashSet<NodeId>,
}

impl SideEffectCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` unless it is already registered. Returns whether it was
    /// added.
    pub fn register(&mut self, node: NodeId) -> bool {
        if self.seen.insert(node) {
            self.order.push(node);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.seen.contains(&node)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Forgets every registration after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.order.len() {
            return;
        }
        for id in self.order.drain(len..) {
            self.seen.remove(&id);
        }
    }

    pub(crate) fn map_ids(&self, mut f: impl FnMut(NodeId) -> NodeId) -> Self {
        let mut mapped = Self::new();
        for &id in &self.order {
            mapped.register(f(id));
        }
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_registration_order_and_dedupes() {
        let mut sec = SideEffectCollector::new();
        assert!(sec.register(7));
        assert!(sec.register(3));
        assert!(!sec.register(7));
        assert!(sec.register(5));
        assert_eq!(sec.nodes(), &[7, 3, 5]);
        assert!(sec.contains(3));
    }

    #[test]
    fn truncate_forgets_later_registrations() {
        let mut sec = SideEffectCollector::new();
        sec.register(1);
        sec.register(2);
        sec.register(3);
        sec.truncate(1);
        assert_eq!(sec.nodes(), &[1]);
        assert!(!sec.contains(2));
        assert!(sec.register(3));
        sec.truncate(5);
        assert_eq!(sec.nodes(), &[1, 3]);
    }
}
