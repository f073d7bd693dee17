use crate::graph::{ExecutionGraph, NodeId, Resolved};

pub use crate::error::ExecutionError;

/// The collaborator that actually runs finalized graphs.
///
/// Graphs handed to an engine contain primitive operations only: every
/// fragment has been inlined and every template substituted.
pub trait Engine {
    /// Whatever a computation produces, e.g. a table or a scalar.
    type Output;

    /// Computes `target`, which is either an output of a node in `graph` or
    /// a constant.
    fn compute(
        &mut self,
        graph: &ExecutionGraph,
        target: &Resolved,
    ) -> Result<Self::Output, ExecutionError>;

    /// Executes the given side-effect nodes of `graph`, in order.
    fn trigger(&mut self, graph: &ExecutionGraph, effects: &[NodeId]) -> Result<(), ExecutionError>;
}
