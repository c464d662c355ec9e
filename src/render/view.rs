//! Frame orchestration for one window on one backend.

use std::collections::HashSet;
use std::rc::Rc;

use crate::foundation::error::{VizError, VizResult};
use crate::foundation::stamp::ObjectId;
use crate::render::backend::{BackendKind, FrameRGBA};
use crate::render::resources::{ResourceRegistry, ResourceRegistryOpts};
use crate::render::surface_pool::{SurfaceDesc, SurfacePool, SurfacePoolOpts, SurfacePoolStats};
use crate::runtime::task::{Promise, Task, promise};
use crate::scene::object::{SceneObject as _, SceneRef};
use crate::scene::prop::PropRef;
use crate::scene::window::RenderWindow;
use crate::scene_graph::factory::ViewNodeFactory;
use crate::scene_graph::frame::{FrameContext, FrameOutput, FrameStats, PropCounts, TraceEvent};
use crate::scene_graph::overrides::register_builtin_backends;
use crate::scene_graph::pass::{ForwardPass, ReleasePass, RenderPass, SelectionPass};
use crate::scene_graph::view_node::{ViewNode, ViewNodeId};

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderViewOpts {
    pub surface_pool: SurfacePoolOpts,
    pub resources: ResourceRegistryOpts,
    /// Register the built-in backends on construction.
    pub register_builtins: bool,
    /// Keep the per-frame traversal log (the recording backend fills it).
    pub keep_trace: bool,
}

impl Default for RenderViewOpts {
    fn default() -> Self {
        Self {
            surface_pool: SurfacePoolOpts::default(),
            resources: ResourceRegistryOpts::default(),
            register_builtins: true,
            keep_trace: true,
        }
    }
}

/// Renders a [`RenderWindow`] through one backend.
///
/// Owns the view-node tree, the graphics resource registry and the surface pool. The tree is
/// created on the first frame and reconciled on every later one.
pub struct RenderView {
    window: Rc<RenderWindow>,
    factory: ViewNodeFactory,
    opts: RenderViewOpts,
    root: Option<ViewNode>,
    resources: ResourceRegistry,
    surfaces: SurfacePool,
    forward: ForwardPass,
    captures: Vec<Promise<FrameRGBA>>,
    last_frame: Option<FrameRGBA>,
    last_stats: FrameStats,
    trace: Vec<TraceEvent>,
    frames: u64,
}

impl RenderView {
    pub fn new(window: &Rc<RenderWindow>, kind: BackendKind, opts: RenderViewOpts) -> Self {
        Self::with_factory(window, ViewNodeFactory::new(kind.name()), opts)
    }

    /// Render through a caller-configured factory, e.g. one with local overrides.
    pub fn with_factory(
        window: &Rc<RenderWindow>,
        factory: ViewNodeFactory,
        opts: RenderViewOpts,
    ) -> Self {
        if opts.register_builtins {
            register_builtin_backends();
        }
        Self {
            window: Rc::clone(window),
            factory,
            opts,
            root: None,
            resources: ResourceRegistry::new(opts.resources),
            surfaces: SurfacePool::new(opts.surface_pool),
            forward: ForwardPass::new(),
            captures: Vec::new(),
            last_frame: None,
            last_stats: FrameStats::default(),
            trace: Vec::new(),
            frames: 0,
        }
    }

    pub fn window(&self) -> &Rc<RenderWindow> {
        &self.window
    }

    pub fn factory(&self) -> &ViewNodeFactory {
        &self.factory
    }

    /// Render one frame.
    ///
    /// Runs the pre-render hooks, pulls the pipeline of every visible mapper, reconciles the
    /// view tree and replays the forward pass. Only categorical failures are returned; broken
    /// objects and draws are logged and counted in the stats.
    #[tracing::instrument(level = "debug", skip_all, fields(backend = %self.factory.backend()))]
    pub fn render(&mut self) -> VizResult<FrameStats> {
        self.window.run_pre_render_hooks();
        let pulled = self.pull_pipelines();
        let result = self.run_pass(PassKind::Forward, pulled);
        match result {
            Ok((stats, image)) => {
                self.frames += 1;
                for capture in self.captures.drain(..) {
                    capture.resolve(image.clone());
                }
                self.last_frame = Some(image);
                self.last_stats = stats.clone();
                tracing::debug!(
                    frame = self.frames,
                    draws = stats.draws,
                    view_nodes = stats.view_nodes,
                    "frame rendered"
                );
                Ok(stats)
            }
            Err(err) => {
                tracing::error!(%err, "frame aborted");
                for capture in self.captures.drain(..) {
                    capture.reject(VizError::context_unavailable(format!(
                        "frame aborted: {err}"
                    )));
                }
                Err(err)
            }
        }
    }

    /// A task that resolves with the next rendered frame. Does not render by itself.
    pub fn capture_image(&mut self) -> Task<FrameRGBA> {
        let (p, task) = promise();
        self.captures.push(p);
        task
    }

    /// The visible, pickable prop drawn at pixel `(x, y)`, if any.
    pub fn pick(&mut self, x: u32, y: u32) -> VizResult<Option<PropRef>> {
        self.pull_pipelines();
        let picked = {
            let (out, _) = self.run_frame(PassKind::Selection, 0)?;
            out.picked(x, y)
        };
        Ok(picked.and_then(|id| self.find_prop(id)))
    }

    /// Release every view node's graphics resources and drop the view tree.
    ///
    /// The next frame rebuilds the tree from scratch.
    pub fn release_graphics_resources(&mut self) -> VizResult<()> {
        let Some(mut root) = self.root.take() else {
            return Ok(());
        };
        let canvas = self.window.canvas();
        let mut frame =
            FrameContext::new(&self.factory, &mut self.resources, &mut self.surfaces, canvas);
        let released = ReleasePass.traverse(&mut root, &mut frame);
        drop(frame.finish());
        if !self.resources.is_empty() {
            tracing::warn!(
                left = self.resources.len(),
                "resources still held after release; dropping them"
            );
            self.resources.release_all();
        }
        self.surfaces.clear();
        released
    }

    pub fn root(&self) -> Option<&ViewNode> {
        self.root.as_ref()
    }

    /// `(object, view node)` pairs of the current tree, pre-order.
    pub fn view_node_ids(&self) -> Vec<(ObjectId, ViewNodeId)> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.walk(&mut |n| out.push((n.renderable().object_id(), n.id())));
        }
        out
    }

    pub fn last_frame(&self) -> Option<&FrameRGBA> {
        self.last_frame.as_ref()
    }

    pub fn last_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    /// Traversal log of the last frame.
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// What each renderer's query traversal found in the last frame.
    pub fn prop_counts(&self) -> &[PropCounts] {
        self.forward.last_counts()
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn surface_pool_stats(&self) -> SurfacePoolStats {
        self.surfaces.stats()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Update every visible mapper once. Returns how many were pulled.
    fn pull_pipelines(&self) -> u64 {
        let mut seen = HashSet::new();
        for renderer in self.window.renderers() {
            for prop in renderer.visible_props() {
                if let Some(mapper) = prop.mapper()
                    && seen.insert(mapper.object_id())
                {
                    mapper.update();
                }
            }
        }
        seen.len() as u64
    }

    fn find_prop(&self, id: ObjectId) -> Option<PropRef> {
        self.window
            .renderers()
            .iter()
            .flat_map(|r| r.props())
            .find(|p| p.object_id() == id)
    }

    fn ensure_root(&mut self) -> VizResult<()> {
        if self.root.is_some() {
            return Ok(());
        }
        let window: SceneRef = self.window.clone();
        let root = self.factory.create_node(&window).map_err(|err| match err {
            VizError::NoOverride { .. } => {
                VizError::context_unavailable(format!("cannot render the window: {err}"))
            }
            other => other,
        })?;
        self.root = Some(root);
        Ok(())
    }

    fn run_pass(&mut self, kind: PassKind, pulled: u64) -> VizResult<(FrameStats, FrameRGBA)> {
        let (out, image) = self.run_frame(kind, pulled)?;
        if self.opts.keep_trace {
            self.trace = out.trace;
        }
        let image = image.ok_or_else(|| VizError::context_unavailable("no frame target"))?;
        Ok((out.stats, image))
    }

    /// One traversal of `kind` over the tree, returning the frame output and its pixels.
    fn run_frame(
        &mut self,
        kind: PassKind,
        pulled: u64,
    ) -> VizResult<(FrameOutput, Option<FrameRGBA>)> {
        self.ensure_root()?;
        let canvas = self.window.canvas();
        let Some(root) = self.root.as_mut() else {
            return Err(VizError::context_unavailable("no root view node"));
        };

        let mut frame =
            FrameContext::new(&self.factory, &mut self.resources, &mut self.surfaces, canvas);
        if kind == PassKind::Selection {
            frame = frame.with_pick_buffer();
        }
        frame.stats.pipeline_updates = pulled;
        let walked = match frame.begin_target() {
            Ok(()) => match kind {
                PassKind::Forward => self.forward.traverse(root, &mut frame),
                PassKind::Selection => SelectionPass.traverse(root, &mut frame),
            },
            Err(err) => Err(err),
        };
        let mut out = frame.finish();

        let desc = SurfaceDesc::for_canvas(canvas);
        let image = out.target.take().map(|target| {
            let image = FrameRGBA {
                width: canvas.width,
                height: canvas.height,
                data: target.data_as_u8_slice().to_vec(),
                premultiplied: true,
            };
            self.surfaces.release(desc, target);
            image
        });
        walked?;
        Ok((out, image))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassKind {
    Forward,
    Selection,
}
