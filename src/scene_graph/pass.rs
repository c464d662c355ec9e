//! Render passes: ordered operation sequences replayed over the view tree.
//!
//! A pass decides which operations run on which part of the tree. The forward pass walks
//! renderers one at a time and hands their translucent props to a nested [`TranslucentPass`],
//! which redirects drawing into an off-screen target and composites it back.

use crate::foundation::error::{VizError, VizResult};
use crate::foundation::stamp::ObjectId;
use crate::render::composite::over_in_place_clipped;
use crate::scene::object::downcast_scene;
use crate::scene::renderer::Renderer;
use crate::scene_graph::frame::{FrameContext, PropCounts, TraceEvent};
use crate::scene_graph::view_node::{Operation, ViewNode};

pub trait RenderPass {
    fn name(&self) -> &'static str;

    fn traverse(&mut self, root: &mut ViewNode, frame: &mut FrameContext<'_>) -> VizResult<()>;
}

/// Run `op` over `node`, logging non-fatal failures instead of returning them.
fn traverse_logged(
    node: &mut ViewNode,
    op: Operation,
    frame: &mut FrameContext<'_>,
) -> VizResult<()> {
    match node.traverse(op, frame) {
        Err(err) if !err.is_fatal() => {
            tracing::error!(class = node.class_name(), op = op.name(), %err, "traversal failed; skipped");
            frame.stats.skipped_nodes += 1;
            Ok(())
        }
        other => other,
    }
}

/// Children of the window node that are renderers, in order.
fn renderer_ids(root: &ViewNode) -> Vec<ObjectId> {
    root.child_ids()
        .into_iter()
        .filter(|id| {
            root.core()
                .child(*id)
                .is_some_and(|c| downcast_scene::<Renderer>(c.renderable()).is_some())
        })
        .collect()
}

/// Build, then opaque, translucent, volume and overlay geometry per renderer.
#[derive(Debug, Default)]
pub struct ForwardPass {
    translucent: TranslucentPass,
    last_counts: Vec<PropCounts>,
}

impl ForwardPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the query traversal found per renderer in the last frame.
    pub fn last_counts(&self) -> &[PropCounts] {
        &self.last_counts
    }
}

impl RenderPass for ForwardPass {
    fn name(&self) -> &'static str {
        "forward"
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn traverse(&mut self, root: &mut ViewNode, frame: &mut FrameContext<'_>) -> VizResult<()> {
        root.traverse(Operation::Build, frame)?;
        self.last_counts.clear();

        for id in renderer_ids(root) {
            let Some(ren) = root.child_mut(id) else {
                continue;
            };
            frame.counts = PropCounts::default();
            traverse_logged(ren, Operation::Query, frame)?;
            let counts = frame.counts;
            self.last_counts.push(counts);

            // Runs even without opaque props: the renderer clears its background here.
            traverse_logged(ren, Operation::Opaque, frame)?;
            if counts.translucent > 0 {
                self.translucent.traverse(ren, frame)?;
            }
            if counts.volumes > 0 {
                traverse_logged(ren, Operation::Volume, frame)?;
            }
            if counts.overlays > 0 {
                traverse_logged(ren, Operation::Overlay, frame)?;
            }
        }

        frame.stats.view_nodes = root.count();
        Ok(())
    }
}

/// Draws translucent props into an off-screen target, then composites it over the viewport.
#[derive(Debug, Default)]
pub struct TranslucentPass {
    composites: u64,
}

impl TranslucentPass {
    pub fn composites(&self) -> u64 {
        self.composites
    }
}

impl RenderPass for TranslucentPass {
    fn name(&self) -> &'static str {
        "translucent"
    }

    /// `root` is a renderer's view node.
    fn traverse(&mut self, root: &mut ViewNode, frame: &mut FrameContext<'_>) -> VizResult<()> {
        let Some(renderer) = downcast_scene::<Renderer>(root.renderable()) else {
            return traverse_logged(root, Operation::Translucent, frame);
        };
        let clip = frame.canvas.viewport_px(renderer.viewport());

        frame.push_offscreen()?;
        frame.record(TraceEvent::Marker("translucent:begin"));
        let walked = traverse_logged(root, Operation::Translucent, frame);
        frame.record(TraceEvent::Marker("translucent:end"));
        let Some(layer) = frame.pop_offscreen() else {
            return walked;
        };
        walked?;

        let width = frame.canvas.width;
        let composited = match frame.target_mut() {
            Some(target) => over_in_place_clipped(
                target.data_as_u8_slice_mut(),
                layer.data_as_u8_slice(),
                width,
                clip,
                1.0,
            ),
            None => Err(VizError::resource("no frame target to composite onto")),
        };
        match composited {
            Ok(()) => {
                frame.stats.translucent_composites += 1;
                self.composites += 1;
            }
            Err(err) => {
                tracing::error!(%err, "translucent composite failed; layer dropped");
                frame.stats.skipped_draws += 1;
            }
        }
        frame.record(TraceEvent::Marker("translucent:composite"));
        frame.retire(layer);
        Ok(())
    }
}

/// Renders pickable props into the selection buffer.
#[derive(Debug, Default)]
pub struct SelectionPass;

impl RenderPass for SelectionPass {
    fn name(&self) -> &'static str {
        "selection"
    }

    fn traverse(&mut self, root: &mut ViewNode, frame: &mut FrameContext<'_>) -> VizResult<()> {
        root.traverse(Operation::Build, frame)?;
        for id in renderer_ids(root) {
            if let Some(ren) = root.child_mut(id) {
                traverse_logged(ren, Operation::Pick, frame)?;
            }
        }
        frame.stats.view_nodes = root.count();
        Ok(())
    }
}

/// Gives every graphics resource in the tree back.
#[derive(Debug, Default)]
pub struct ReleasePass;

impl RenderPass for ReleasePass {
    fn name(&self) -> &'static str {
        "release"
    }

    fn traverse(&mut self, root: &mut ViewNode, frame: &mut FrameContext<'_>) -> VizResult<()> {
        root.traverse(Operation::Release, frame)
    }
}
