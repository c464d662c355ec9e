//! Renderable domain objects.
//!
//! These carry no backend state. Each exposes its class hierarchy for override dispatch and
//! the children that receive their own view nodes.

pub mod camera;
pub mod mapper;
pub mod object;
pub mod prop;
pub mod property;
pub mod renderer;
pub mod window;

pub use camera::{Camera, Projected};
pub use mapper::{MappedGeometry, Mapper, MapperAlgorithm};
pub use object::{SceneObject, SceneRef, downcast_scene, downcast_scene_ref};
pub use prop::{Actor, Actor2D, Prop, PropRef, Volume};
pub use property::{LookupTable, Property};
pub use renderer::Renderer;
pub use window::RenderWindow;

#[cfg(test)]
#[path = "../../tests/unit/scene/mod.rs"]
mod tests;
