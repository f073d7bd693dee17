use super::{ExecutionGraph, NodeId, Resolved};
use std::fmt;

/// Renders the operations feeding each output of a finalized graph as a tree.
/// Shared inputs are printed under every consumer.
pub struct DisplayGraph<'a> {
    pub graph: &'a ExecutionGraph,
}

impl<'a> fmt::Display for DisplayGraph<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, source) in &self.graph.outputs {
            writeln!(f, "{}", name)?;
            self.fmt_as_tree(source, f, "", true)?;
        }
        if !self.graph.side_effects.is_empty() {
            writeln!(f, "side effects")?;
            let count = self.graph.side_effects.len();
            for (i, id) in self.graph.side_effects.iter().enumerate() {
                self.fmt_node(*id, f, "", i + 1 == count)?;
            }
        }
        Ok(())
    }
}

impl<'a> DisplayGraph<'a> {
    fn fmt_as_tree(
        &self,
        source: &Resolved,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        match source {
            Resolved::Literal(v) => {
                let node_marker = if is_last { "└── " } else { "├── " };
                writeln!(f, "{}{}Literal: {}", prefix, node_marker, v)
            }
            Resolved::Handle(h) => self.fmt_node(h.node, f, prefix, is_last),
        }
    }

    fn fmt_node(
        &self,
        id: NodeId,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        let Some(node) = self.graph.node(id) else {
            return writeln!(f, "{}{}<Unknown node #{}>", prefix, node_marker, id);
        };
        write!(f, "{}{}{} #{}", prefix, node_marker, node.op, node.id)?;
        for (key, value) in &node.params {
            write!(f, " {}={:?}", key, value.to_string())?;
        }
        writeln!(f)?;

        let count = node.inputs.len();
        for (i, (_, input)) in node.inputs.iter().enumerate() {
            self.fmt_as_tree(input, f, &child_prefix, i + 1 == count)?;
        }
        Ok(())
    }
}
