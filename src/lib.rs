#![forbid(unsafe_code)]

//! Demand-driven visualization pipeline with backend-neutral scene dispatch.
//!
//! Data flows through [`pipeline`] nodes that recompute only when something upstream changed.
//! Renderable objects in [`scene`] are mapped onto backend view nodes by [`scene_graph`] and
//! drawn by a [`render::RenderView`].

pub mod data;
pub mod filters;
pub mod foundation;
pub mod pipeline;
pub mod render;
pub mod runtime;
pub mod scene;
pub mod scene_graph;

pub use data::{DataObject, DataRef, PolyData};
pub use filters::{AppendPolyData, ConeSource, DataSetReader, ElevationFilter, ShrinkPolyData};
pub use foundation::core::{Bounds, Canvas, Rect, Rgb, Vec3};
pub use foundation::error::{VizError, VizResult};
pub use foundation::stamp::{ObjectId, Stamp, Stamped};
pub use pipeline::{Algorithm, ComputeContext, ExecutionNode, Node, NodeRef, OutputPort};
pub use render::{BackendKind, FrameRGBA, RenderView, RenderViewOpts};
pub use runtime::{AnimationScheduler, LocalPool, LocalSpawner, Task};
pub use scene::{
    Actor, Actor2D, Camera, Mapper, Prop, PropRef, Property, RenderWindow, Renderer, SceneObject,
    Volume,
};
pub use scene_graph::{FrameStats, ViewNodeFactory};
