pub mod algorithm;
pub mod node;
pub(crate) mod params;
pub mod port;

pub use algorithm::{Algorithm, ComputeContext};
pub use node::{ExecutionNode, Node, NodeRef, NodeStats};
pub use port::{OutputPort, OutputUpdate, PortDescriptor};
