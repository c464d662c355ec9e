pub mod backend;
pub mod composite;
pub mod cpu;
pub mod recording;
pub mod resources;
pub mod surface_pool;
pub mod view;

pub use backend::{BackendKind, FrameRGBA};
pub use resources::{ResourceKey, ResourceRegistry, ResourceRegistryOpts, ResourceStats};
pub use surface_pool::{SurfacePool, SurfacePoolOpts, SurfacePoolStats};
pub use view::{RenderView, RenderViewOpts};
