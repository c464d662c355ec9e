//! Backend dispatch and traversal.
//!
//! Domain objects are mapped onto backend view nodes through the process-wide override table;
//! the resulting tree is reconciled against the scene every frame and walked by render passes.

pub mod factory;
pub mod frame;
pub mod overrides;
pub mod pass;
pub mod view_node;

pub use factory::ViewNodeFactory;
pub use frame::{
    DrawStyle, FrameContext, FrameOutput, FrameStats, PickBuffer, PropCounts, PropState,
    RendererState, TraceEvent,
};
pub use overrides::{
    ViewNodeCtor, lookup_override, register_builtin_backends, register_override,
    registered_classes, unregister_override,
};
pub use pass::{ForwardPass, ReleasePass, RenderPass, SelectionPass, TranslucentPass};
pub use view_node::{NodeCore, Operation, Traversal, ViewNode, ViewNodeId, ViewNodeImpl};

#[cfg(test)]
#[path = "../../tests/unit/scene_graph/mod.rs"]
mod tests;
