//! CPU raster backend powered by `vello_cpu`.
//!
//! Props are drawn as depth-sorted, flat-shaded triangles projected through the renderer's
//! orthographic camera. Mapper output is converted once per output stamp into a shared
//! [`nodes::GeometryBuffer`] held by the resource registry.

pub mod nodes;
pub mod raster;

use crate::scene_graph::overrides::register_override;

pub const BACKEND: &str = "cpu";

/// Register the CPU view nodes. Safe to call more than once.
pub fn register() {
    register_override(BACKEND, "RenderWindow", nodes::window_node);
    register_override(BACKEND, "Renderer", nodes::renderer_node);
    register_override(BACKEND, "Camera", nodes::camera_node);
    // Any 3D prop without its own entry draws as a surface.
    register_override(BACKEND, "Prop3D", nodes::surface_prop_node);
    register_override(BACKEND, "Actor", nodes::surface_prop_node);
    register_override(BACKEND, "Volume", nodes::volume_node);
    register_override(BACKEND, "Actor2D", nodes::overlay_node);
    register_override(BACKEND, "Mapper", nodes::mapper_node);
}

#[cfg(test)]
#[path = "../../../tests/unit/render/cpu/nodes.rs"]
mod tests;
