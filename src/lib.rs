//! # Boxwright - Workspace Fragment Authoring
//!
//! **Boxwright** lets you describe reusable, parameterized pieces of a
//! computation graph ("custom boxes") as ordinary Rust closures, and compose
//! them into workspaces that an external execution engine runs.
//!
//! ## Core Workflow
//!
//! 1.  **Open a Session**: The session allocates node ids and caches every
//!     captured fragment body.
//! 2.  **Define Fragments**: `Session::fragment` turns a closure and a
//!     `Signature` into a `Fragment`. Declare external parameters with
//!     `with_parameters`.
//! 3.  **Author a Workspace**: Inside `Workspace::author`, add primitive
//!     operations and call fragments. The first call of a given shape runs
//!     the body once; every call gets its own private copy of the captured
//!     nodes.
//! 4.  **Save or Submit**: `Workspace::save` checks custom box names across
//!     the whole workspace. `compute`, `compute_output` and the trigger
//!     methods finalize the graph (inline instances, substitute templates)
//!     and hand it to an `Engine`.
//!
//! ## Quick Start
//!
//! ```rust
//! use boxwright::prelude::*;
//!
//! fn main() -> Result<(), WorkspaceError> {
//!     let mut session = Session::new();
//!
//!     // A custom box selecting one column of a table.
//!     let select = session.fragment(
//!         "select_column",
//!         Signature::new().positional("table").positional("column"),
//!         |scope, args| {
//!             let sql = pp(format!(
//!                 "select id, {} from input",
//!                 args.template("column")?
//!             ));
//!             let out = scope.apply(
//!                 Operation::new("sql1")
//!                     .input("input", args.get("table")?)
//!                     .param("sql", sql),
//!             )?;
//!             Ok(Outputs::single(out))
//!         },
//!     );
//!
//!     let mut workspace = Workspace::new("people");
//!     workspace.author(&mut session, |scope| {
//!         let table = scope.apply(Operation::new("createExampleGraph"))?;
//!         let names = scope.call(&select, CallArgs::new().arg(&table).arg("name"))?;
//!         let ages = scope.call(&select, CallArgs::new().arg(&table).arg("age"))?;
//!         Ok(Outputs::named([("names", names.value()?), ("ages", ages.value()?)]))
//!     })?;
//!
//!     // One capture, two private instances.
//!     assert_eq!(session.registry().captures(), 1);
//!
//!     let graph = workspace.finalize(&Environment::new())?;
//!     println!("{}", DisplayGraph { graph: &graph });
//!
//!     let saved = workspace.save("users/me/people")?;
//!     assert_eq!(saved.fragments.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod effects;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod graph;
pub mod prelude;
pub mod session;
pub mod workspace;
