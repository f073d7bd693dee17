pub mod display;
pub mod node;
pub mod operation;
pub mod resolved;
pub mod template;
pub mod value;

pub use display::*;
pub use node::*;
pub use operation::*;
pub use resolved::*;
pub use template::*;
pub use value::*;
