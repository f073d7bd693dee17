//! Prelude module for convenient imports
//!
//! This module re-exports the types needed to define fragments, author
//! workspaces and submit them. Import it to get the everyday surface without
//! naming each module.
//!
//! # Example
//!
//! ```rust
//! use boxwright::prelude::*;
//!
//! let mut session = Session::new();
//! let mut workspace = Workspace::new("example");
//! workspace
//!     .author(&mut session, |scope| {
//!         let table = scope.apply(Operation::new("createExampleGraph"))?;
//!         Ok(Outputs::single(table))
//!     })
//!     .unwrap();
//! assert_eq!(workspace.graph().len(), 1);
//! ```

// Authoring
pub use crate::fragment::{Args, CallArgs, Fragment, Instance, Outputs, ParamDecl, Signature};
pub use crate::session::{NodeRef, Scope, Session};
pub use crate::workspace::{SavedWorkspace, Workspace, WorkspaceState};

// Graph values
pub use crate::graph::{
    DisplayGraph, Environment, ExecutionGraph, GraphHandle, Literal, NodeId, Operation, Param,
    ParameterTemplate, Resolved, Value, pp,
};

// Execution
pub use crate::effects::SideEffectCollector;
pub use crate::engine::Engine;

// Error types
pub use crate::error::{
    ArtifactError, BindingError, ExecutionError, SaveError, TemplateError, WorkspaceError,
};
