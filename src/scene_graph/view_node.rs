//! Backend view nodes and their reconciliation against the scene.
//!
//! Every reachable domain object gets one view node per parent path. A view node keeps its
//! children in a map keyed by the child's object id; each build traversal marks the children
//! that are still present, creates the missing ones and releases the rest. Unchanged children
//! keep their instance, and with it any backend state they hold.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::error::VizResult;
use crate::foundation::stamp::ObjectId;
use crate::scene::object::SceneRef;
use crate::scene_graph::frame::FrameContext;

static NEXT_VIEW_NODE: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewNodeId(pub u64);

impl ViewNodeId {
    fn next() -> Self {
        Self(NEXT_VIEW_NODE.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Traversal operations, each replayed over the whole view tree by some pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Reconcile view nodes with the scene.
    Build,
    /// Count what later passes have to draw.
    Query,
    Opaque,
    Translucent,
    Volume,
    Overlay,
    /// Render object ids for selection.
    Pick,
    /// Free graphics resources.
    Release,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Query => "query",
            Self::Opaque => "opaque",
            Self::Translucent => "translucent",
            Self::Volume => "volume",
            Self::Overlay => "overlay",
            Self::Pick => "pick",
            Self::Release => "release",
        }
    }
}

/// Whether an implementation took over the traversal of one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// Prepass, children, postpass.
    Default,
    /// The implementation already did whatever it wanted, including nothing.
    Handled,
}

/// Backend-specific behavior of one view node.
pub trait ViewNodeImpl: Any {
    /// Called top-down (`prepass == true`) before the children, bottom-up after them.
    fn apply(
        &mut self,
        _op: Operation,
        _prepass: bool,
        _core: &mut NodeCore,
        _frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        Ok(())
    }

    /// Override to skip or reshape the traversal of an operation.
    fn traverse(
        &mut self,
        _op: Operation,
        _core: &mut NodeCore,
        _frame: &mut FrameContext<'_>,
    ) -> VizResult<Traversal> {
        Ok(Traversal::Default)
    }

    /// Domain objects that get child view nodes. Defaults to the scene children.
    fn build_children(&self, core: &NodeCore) -> Vec<SceneRef> {
        core.renderable().scene_children()
    }

    /// Give back every graphics resource this node registered on.
    fn release(&mut self, _core: &NodeCore, _frame: &mut FrameContext<'_>) {}
}

/// The backend-independent part of a view node: its renderable and its children.
pub struct NodeCore {
    id: ViewNodeId,
    renderable: SceneRef,
    children: HashMap<ObjectId, ViewNode>,
    order: Vec<ObjectId>,
    visited: HashSet<ObjectId>,
}

impl NodeCore {
    pub fn id(&self) -> ViewNodeId {
        self.id
    }

    pub fn renderable(&self) -> &SceneRef {
        &self.renderable
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, obj: ObjectId) -> Option<&ViewNode> {
        self.children.get(&obj)
    }

    /// Children in the order they were last reconciled.
    pub fn children(&self) -> impl Iterator<Item = &ViewNode> + '_ {
        self.order.iter().filter_map(|id| self.children.get(id))
    }

    /// Start a reconciliation round.
    pub fn prepare_nodes(&mut self) {
        self.visited.clear();
        self.order.clear();
    }

    /// Keep the child for `obj`, creating it if needed.
    ///
    /// A dispatch failure is logged and the object skipped; its siblings are unaffected.
    pub fn add_missing_node(&mut self, obj: &SceneRef, frame: &mut FrameContext<'_>) -> bool {
        let key = obj.object_id();
        if !self.visited.insert(key) {
            return true;
        }
        if !self.children.contains_key(&key) {
            match frame.factory.create_node(obj) {
                Ok(node) => {
                    self.children.insert(key, node);
                }
                Err(err) => {
                    tracing::error!(class = obj.class_name(), id = %key, %err, "no view node; object skipped");
                    frame.stats.dispatch_failures += 1;
                    self.visited.remove(&key);
                    return false;
                }
            }
        }
        self.order.push(key);
        true
    }

    pub fn add_missing_nodes(&mut self, objs: &[SceneRef], frame: &mut FrameContext<'_>) {
        for obj in objs {
            self.add_missing_node(obj, frame);
        }
    }

    /// Release and drop children not marked since [`NodeCore::prepare_nodes`].
    pub fn remove_unused_nodes(&mut self, frame: &mut FrameContext<'_>) {
        let stale: Vec<ObjectId> = self
            .children
            .keys()
            .filter(|k| !self.visited.contains(k))
            .copied()
            .collect();
        for key in stale {
            if let Some(mut node) = self.children.remove(&key) {
                node.release_tree(frame);
            }
        }
    }

    /// Run `op` over the children in order.
    ///
    /// Non-fatal child failures are logged and counted; fatal ones abort the traversal.
    pub fn traverse_children(
        &mut self,
        op: Operation,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        for key in &self.order {
            let Some(child) = self.children.get_mut(key) else {
                continue;
            };
            if let Err(err) = child.traverse(op, frame) {
                if err.is_fatal() {
                    return Err(err);
                }
                tracing::error!(
                    class = child.class_name(),
                    op = op.name(),
                    %err,
                    "view node failed; skipped"
                );
                frame.stats.skipped_nodes += 1;
            }
        }
        Ok(())
    }

    fn release_children(&mut self, frame: &mut FrameContext<'_>) {
        for node in self.children.values_mut() {
            node.release_tree(frame);
        }
    }
}

pub struct ViewNode {
    core: NodeCore,
    matched: &'static str,
    imp: Box<dyn ViewNodeImpl>,
}

impl ViewNode {
    pub fn new(renderable: SceneRef, matched: &'static str, imp: Box<dyn ViewNodeImpl>) -> Self {
        Self {
            core: NodeCore {
                id: ViewNodeId::next(),
                renderable,
                children: HashMap::new(),
                order: Vec::new(),
                visited: HashSet::new(),
            },
            matched,
            imp,
        }
    }

    pub fn id(&self) -> ViewNodeId {
        self.core.id
    }

    pub fn core(&self) -> &NodeCore {
        &self.core
    }

    pub fn renderable(&self) -> &SceneRef {
        &self.core.renderable
    }

    pub fn class_name(&self) -> &'static str {
        self.core.renderable.class_name()
    }

    /// The hierarchy entry dispatch matched, e.g. `"Prop3D"` for a type with no own override.
    pub fn matched_override(&self) -> &'static str {
        self.matched
    }

    /// Object ids of the children, in traversal order.
    pub fn child_ids(&self) -> Vec<ObjectId> {
        self.core.order.clone()
    }

    pub fn child_mut(&mut self, obj: ObjectId) -> Option<&mut ViewNode> {
        self.core.children.get_mut(&obj)
    }

    pub fn implementation<T: ViewNodeImpl>(&self) -> Option<&T> {
        let any: &dyn Any = self.imp.as_ref();
        any.downcast_ref::<T>()
    }

    /// Depth-first search for the first view node of `obj`.
    pub fn find(&self, obj: ObjectId) -> Option<&ViewNode> {
        if self.core.renderable.object_id() == obj {
            return Some(self);
        }
        self.core.children().find_map(|c| c.find(obj))
    }

    /// Every view node in the tree, pre-order.
    pub fn walk(&self, f: &mut dyn FnMut(&ViewNode)) {
        f(self);
        for c in self.core.children() {
            c.walk(f);
        }
    }

    pub fn count(&self) -> usize {
        1 + self.core.children().map(ViewNode::count).sum::<usize>()
    }

    /// Replay `op` over this subtree.
    pub fn traverse(&mut self, op: Operation, frame: &mut FrameContext<'_>) -> VizResult<()> {
        frame.stats.node_visits += 1;
        if op == Operation::Release {
            self.release_tree(frame);
            return Ok(());
        }
        if self.imp.traverse(op, &mut self.core, frame)? == Traversal::Handled {
            return Ok(());
        }
        self.imp.apply(op, true, &mut self.core, frame)?;
        if op == Operation::Build {
            let objs = self.imp.build_children(&self.core);
            self.core.prepare_nodes();
            self.core.add_missing_nodes(&objs, frame);
            self.core.remove_unused_nodes(frame);
        }
        self.core.traverse_children(op, frame)?;
        self.imp.apply(op, false, &mut self.core, frame)
    }

    /// Release this node and everything below it.
    pub fn release_tree(&mut self, frame: &mut FrameContext<'_>) {
        self.core.release_children(frame);
        self.imp.release(&self.core, frame);
    }
}

impl std::fmt::Debug for ViewNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewNode")
            .field("id", &self.core.id)
            .field("class", &self.class_name())
            .field("matched", &self.matched)
            .field("children", &self.core.order.len())
            .finish()
    }
}
