//! Backend that draws nothing and records every visit.
//!
//! One generic node is registered for `"Object"`, the root of every hierarchy, so any scene can
//! be traversed. Useful for inspecting pass order and reconciliation without pixels.

use crate::foundation::error::VizResult;
use crate::scene::object::SceneRef;
use crate::scene_graph::frame::{FrameContext, TraceEvent};
use crate::scene_graph::overrides::register_override;
use crate::scene_graph::view_node::{NodeCore, Operation, Traversal, ViewNodeImpl};

pub const BACKEND: &str = "recording";

#[derive(Debug, Default)]
pub struct RecordingNode {
    visits: u64,
}

impl RecordingNode {
    pub fn visits(&self) -> u64 {
        self.visits
    }
}

pub fn recording_node(_: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::<RecordingNode>::default())
}

impl ViewNodeImpl for RecordingNode {
    fn traverse(
        &mut self,
        op: Operation,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<Traversal> {
        let Some(prop) = core.renderable().as_prop() else {
            return Ok(Traversal::Default);
        };
        let visible = prop.visibility();
        let roles = core.renderable().class_hierarchy();
        // The draw operation a rasterizing backend would give this prop.
        let draw_op = if roles.contains(&"Volume") {
            Operation::Volume
        } else if roles.contains(&"Actor2D") {
            Operation::Overlay
        } else if prop.is_opaque() {
            Operation::Opaque
        } else {
            Operation::Translucent
        };
        if op == Operation::Query && visible {
            match draw_op {
                Operation::Volume => frame.counts.volumes += 1,
                Operation::Overlay => frame.counts.overlays += 1,
                Operation::Opaque => frame.counts.opaque += 1,
                _ => frame.counts.translucent += 1,
            }
        }
        let take_part = match op {
            Operation::Build | Operation::Release | Operation::Query => true,
            Operation::Pick => visible && prop.pickable(),
            other => visible && other == draw_op,
        };
        Ok(if take_part {
            Traversal::Default
        } else {
            Traversal::Handled
        })
    }

    fn apply(
        &mut self,
        op: Operation,
        prepass: bool,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        self.visits += 1;
        let obj = core.renderable();
        frame.record(TraceEvent::Visit {
            op,
            prepass,
            class_name: obj.class_name(),
            object: obj.object_id(),
        });
        Ok(())
    }
}

pub fn register() {
    register_override(BACKEND, "Object", recording_node);
}
