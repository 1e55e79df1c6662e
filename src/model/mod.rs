pub mod edge;
pub mod handle;
pub mod io;
pub mod node;
pub mod payload;
pub mod variable;

pub use edge::*;
pub use io::*;
pub use node::*;
pub use payload::*;
pub use variable::*;

pub type NodeId = String;
pub type EdgeId = String;
pub type HandleId = String;
/// Stable identity of one configured item inside a node (a symbol row, an indicator,
/// a variable). Survives attribute edits; positions do not.
pub type ConfigId = u32;
