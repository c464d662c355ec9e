use std::rc::Rc;

use crate::foundation::core::{Canvas, Rect, Rgb};
use crate::foundation::error::{VizError, VizResult};
use crate::foundation::stamp::ObjectId;
use crate::render::resources::ResourceRegistry;
use crate::render::surface_pool::{SurfaceDesc, SurfacePool};
use crate::scene::renderer::Renderer;
use crate::scene_graph::factory::ViewNodeFactory;
use crate::scene_graph::view_node::Operation;

/// Renderer being traversed, set by the renderer's view node in its prepass.
#[derive(Clone)]
pub struct RendererState {
    pub renderer: Rc<Renderer>,
    /// Viewport in pixels, y down.
    pub viewport_px: Rect,
}

/// How a mapper draws for the current prop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawStyle {
    #[default]
    Surface,
    /// The box around the geometry, for volumes.
    Bounds,
}

/// Prop being traversed, set by the prop's view node for its mapper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropState {
    pub prop: ObjectId,
    pub color: Rgb,
    pub opacity: f64,
    pub style: DrawStyle,
    /// Non-zero id written to the selection buffer during a pick traversal.
    pub pick_id: u32,
}

/// What the query traversal found for the current renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropCounts {
    pub opaque: usize,
    pub translucent: usize,
    pub volumes: usize,
    pub overlays: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub node_visits: u64,
    pub draws: u64,
    pub triangles: u64,
    /// Draws abandoned because a resource could not be produced.
    pub skipped_draws: u64,
    /// View nodes whose traversal failed.
    pub skipped_nodes: u64,
    /// Objects that could not be mapped onto the backend.
    pub dispatch_failures: u64,
    pub translucent_composites: u64,
    pub view_nodes: usize,
    pub resource_bytes: usize,
    pub pipeline_updates: u64,
}

/// One entry of the traversal log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    Visit {
        op: Operation,
        prepass: bool,
        class_name: &'static str,
        object: ObjectId,
    },
    /// Pass-level marker, e.g. entering an off-screen sub-traversal.
    Marker(&'static str),
}

/// Selection buffer: one object slot per pixel, 0 meaning nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickBuffer {
    pub width: u32,
    pub height: u32,
    ids: Vec<u32>,
}

impl PickBuffer {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            ids: vec![0; canvas.width as usize * canvas.height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.ids[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, id: u32) {
        if x < self.width && y < self.height {
            self.ids[(y * self.width + x) as usize] = id;
        }
    }
}

/// Everything a traversal can touch during one frame.
pub struct FrameContext<'a> {
    pub factory: &'a ViewNodeFactory,
    pub resources: &'a mut ResourceRegistry,
    surfaces: &'a mut SurfacePool,
    pub canvas: Canvas,
    targets: Vec<vello_cpu::Pixmap>,
    leases: Vec<vello_cpu::Pixmap>,
    pub renderer: Option<RendererState>,
    pub prop: Option<PropState>,
    pub counts: PropCounts,
    pub stats: FrameStats,
    pub trace: Vec<TraceEvent>,
    pub pick: Option<PickBuffer>,
    pick_objects: Vec<ObjectId>,
}

/// What is left of a frame once its traversals are done.
pub struct FrameOutput {
    pub target: Option<vello_cpu::Pixmap>,
    pub stats: FrameStats,
    pub trace: Vec<TraceEvent>,
    pub pick: Option<PickBuffer>,
    pub pick_objects: Vec<ObjectId>,
}

impl FrameOutput {
    /// Object drawn at `(x, y)` in the selection buffer.
    pub fn picked(&self, x: u32, y: u32) -> Option<ObjectId> {
        let id = self.pick.as_ref()?.get(x, y);
        let slot = usize::try_from(id).ok()?.checked_sub(1)?;
        self.pick_objects.get(slot).copied()
    }
}

impl<'a> FrameContext<'a> {
    pub fn new(
        factory: &'a ViewNodeFactory,
        resources: &'a mut ResourceRegistry,
        surfaces: &'a mut SurfacePool,
        canvas: Canvas,
    ) -> Self {
        Self {
            factory,
            resources,
            surfaces,
            canvas,
            targets: Vec::new(),
            leases: Vec::new(),
            renderer: None,
            prop: None,
            counts: PropCounts::default(),
            stats: FrameStats::default(),
            trace: Vec::new(),
            pick: None,
            pick_objects: Vec::new(),
        }
    }

    pub fn with_pick_buffer(mut self) -> Self {
        self.pick = Some(PickBuffer::new(self.canvas));
        self
    }

    fn desc(&self) -> SurfaceDesc {
        SurfaceDesc::for_canvas(self.canvas)
    }

    /// Make sure the frame target exists and is transparent.
    pub fn begin_target(&mut self) -> VizResult<()> {
        if let Some(bottom) = self.targets.first_mut() {
            bottom.data_as_u8_slice_mut().fill(0);
            return Ok(());
        }
        let desc = self.desc();
        let target = self.surfaces.borrow_cleared(desc)?;
        self.targets.push(target);
        Ok(())
    }

    /// Surface draws currently land on: the innermost off-screen target, else the frame.
    pub fn target_mut(&mut self) -> Option<&mut vello_cpu::Pixmap> {
        self.targets.last_mut()
    }

    pub fn target_depth(&self) -> usize {
        self.targets.len()
    }

    /// Redirect draws into a fresh transparent off-screen target.
    pub fn push_offscreen(&mut self) -> VizResult<()> {
        if self.targets.is_empty() {
            return Err(VizError::context_unavailable(
                "off-screen target requested before the frame target",
            ));
        }
        let desc = self.desc();
        let p = self.surfaces.borrow_cleared(desc)?;
        self.targets.push(p);
        Ok(())
    }

    /// Stop redirecting. The frame target itself is never popped.
    pub fn pop_offscreen(&mut self) -> Option<vello_cpu::Pixmap> {
        if self.targets.len() <= 1 {
            return None;
        }
        self.targets.pop()
    }

    /// Transparent canvas-sized scratch surface; hand it back with [`FrameContext::recycle`].
    pub fn scratch(&mut self) -> VizResult<vello_cpu::Pixmap> {
        let desc = self.desc();
        self.surfaces.borrow_cleared(desc)
    }

    pub fn recycle(&mut self, pixmap: vello_cpu::Pixmap) {
        let desc = self.desc();
        self.surfaces.release(desc, pixmap);
    }

    /// Keep a surface alive until the end of the frame, then return it to the pool.
    pub fn retire(&mut self, pixmap: vello_cpu::Pixmap) {
        self.leases.push(pixmap);
    }

    /// Allocate a selection id for `obj` in this frame.
    pub fn register_pick_object(&mut self, obj: ObjectId) -> u32 {
        if let Some(i) = self.pick_objects.iter().position(|o| *o == obj) {
            return i as u32 + 1;
        }
        self.pick_objects.push(obj);
        self.pick_objects.len() as u32
    }

    pub fn record(&mut self, event: TraceEvent) {
        self.trace.push(event);
    }

    /// Return every lease to the pool and hand over the frame target.
    pub fn finish(mut self) -> FrameOutput {
        let desc = self.desc();
        for p in self.leases.drain(..) {
            self.surfaces.release(desc, p);
        }
        // Unbalanced off-screen pushes are dropped back into the pool too.
        while self.targets.len() > 1 {
            if let Some(p) = self.targets.pop() {
                self.surfaces.release(desc, p);
            }
        }
        self.stats.resource_bytes = self.resources.memory_usage();
        FrameOutput {
            target: self.targets.pop(),
            stats: self.stats,
            trace: self.trace,
            pick: self.pick,
            pick_objects: self.pick_objects,
        }
    }
}
