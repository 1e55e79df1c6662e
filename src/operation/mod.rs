//! Typing of operation nodes: the registry of known operations and the resolver that
//! derives each node's effective output kind.

pub mod registry;
pub mod resolver;

pub use registry::{OperationCategory, OperationRegistry, OperationSpec};
pub use resolver::{InputSlot, OperationTypeResolver, SlotMismatch};
