use super::*;
use crate::foundation::core::Canvas;
use crate::foundation::error::{VizError, VizResult};
use crate::foundation::stamp::Stamped;
use crate::render::resources::{ResourceKey, ResourceRegistry};
use crate::render::surface_pool::SurfacePool;
use crate::scene::object::{SceneObject, SceneRef};
use std::cell::RefCell;
use std::rc::Rc;

struct Leaf {
    stamped: Stamped,
    hierarchy: &'static [&'static str],
}

impl Leaf {
    fn new(hierarchy: &'static [&'static str]) -> Rc<Self> {
        Rc::new(Self {
            stamped: Stamped::new(),
            hierarchy,
        })
    }
}

impl SceneObject for Leaf {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        self.hierarchy
    }
}

struct Group {
    stamped: Stamped,
    children: RefCell<Vec<SceneRef>>,
}

impl Group {
    fn new(children: Vec<SceneRef>) -> Rc<Self> {
        Rc::new(Self {
            stamped: Stamped::new(),
            children: RefCell::new(children),
        })
    }

    fn remove(&self, obj: &SceneRef) {
        self.children
            .borrow_mut()
            .retain(|c| c.object_id() != obj.object_id());
        self.stamped.modified();
    }
}

impl SceneObject for Group {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        &["Group", "Object"]
    }

    fn scene_children(&self) -> Vec<SceneRef> {
        self.children.borrow().clone()
    }
}

const GLYPH: &[&str] = &["Glyph", "Actor", "Prop3D", "Prop", "Object"];
const SIBLING: &[&str] = &["Sibling", "Prop3D", "Prop", "Object"];
const UNMAPPED: &[&str] = &["Unmapped"];

/// Records every visit under its own tag.
struct Tag(&'static str);

impl ViewNodeImpl for Tag {
    fn apply(
        &mut self,
        op: Operation,
        prepass: bool,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        frame.record(TraceEvent::Visit {
            op,
            prepass,
            class_name: self.0,
            object: core.renderable().object_id(),
        });
        Ok(())
    }
}

fn actor_tag(_: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(Tag("actor")))
}

fn prop3d_tag(_: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(Tag("prop3d")))
}

fn object_tag(_: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(Tag("object")))
}

/// Holds one registry resource from its first build until released.
#[derive(Default)]
struct Holder {
    key: Option<ResourceKey>,
}

impl ViewNodeImpl for Holder {
    fn apply(
        &mut self,
        op: Operation,
        prepass: bool,
        core: &mut NodeCore,
        frame: &mut FrameContext<'_>,
    ) -> VizResult<()> {
        if op == Operation::Build && prepass && self.key.is_none() {
            let key = ResourceKey::new(core.renderable().object_id(), "blob");
            frame
                .resources
                .set_resource_for_user(key, core.id(), Rc::new(7u32), 1, 4);
            self.key = Some(key);
        }
        Ok(())
    }

    fn release(&mut self, core: &NodeCore, frame: &mut FrameContext<'_>) {
        if let Some(key) = self.key.take() {
            frame.resources.unregister_user(key, core.id());
        }
    }
}

fn holder(_: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::<Holder>::default())
}

/// Skips its children for every operation but build.
struct Gate;

impl ViewNodeImpl for Gate {
    fn traverse(
        &mut self,
        op: Operation,
        _core: &mut NodeCore,
        _frame: &mut FrameContext<'_>,
    ) -> VizResult<Traversal> {
        Ok(if op == Operation::Build {
            Traversal::Default
        } else {
            Traversal::Handled
        })
    }
}

fn gate(_: &SceneRef) -> VizResult<Box<dyn ViewNodeImpl>> {
    Ok(Box::new(Gate))
}

fn canvas() -> Canvas {
    Canvas::new(4, 4).unwrap()
}

fn traverse(
    root: &mut ViewNode,
    factory: &ViewNodeFactory,
    resources: &mut ResourceRegistry,
    ops: &[Operation],
) -> (FrameStats, Vec<TraceEvent>) {
    let mut surfaces = SurfacePool::default();
    let mut frame = FrameContext::new(factory, resources, &mut surfaces, canvas());
    for &op in ops {
        root.traverse(op, &mut frame).unwrap();
    }
    let out = frame.finish();
    (out.stats, out.trace)
}

#[test]
fn derived_override_wins_and_siblings_fall_back_to_the_base() {
    let backend = "sg-precedence";
    register_override(backend, "Actor", actor_tag);
    register_override(backend, "Prop3D", prop3d_tag);
    let factory = ViewNodeFactory::new(backend);

    let glyph: SceneRef = Leaf::new(GLYPH);
    let sibling: SceneRef = Leaf::new(SIBLING);
    assert_eq!(factory.resolve(&glyph).unwrap().0, "Actor");
    assert_eq!(factory.resolve(&sibling).unwrap().0, "Prop3D");

    let node = factory.create_node(&glyph).unwrap();
    assert_eq!(node.matched_override(), "Actor");
    assert_eq!(node.class_name(), "Glyph");
    assert_eq!(node.implementation::<Tag>().unwrap().0, "actor");
    assert_eq!(factory.created(), 1);
}

#[test]
fn last_registration_for_a_name_wins() {
    let backend = "sg-overwrite";
    assert!(register_override(backend, "Prop3D", prop3d_tag).is_none());
    assert!(register_override(backend, "Prop3D", actor_tag).is_some());
    let factory = ViewNodeFactory::new(backend);
    let node = factory.create_node(&(Leaf::new(SIBLING) as SceneRef)).unwrap();
    assert_eq!(node.implementation::<Tag>().unwrap().0, "actor");
    assert_eq!(registered_classes(backend), vec!["Prop3D"]);

    assert!(unregister_override(backend, "Prop3D").is_some());
    assert!(lookup_override(backend, "Prop3D").is_none());
}

#[test]
fn local_overrides_shadow_the_global_table_at_the_same_level() {
    let backend = "sg-local";
    register_override(backend, "Actor", actor_tag);
    let factory = ViewNodeFactory::new(backend).with_override("Actor", prop3d_tag);
    let node = factory.create_node(&(Leaf::new(GLYPH) as SceneRef)).unwrap();
    assert_eq!(node.implementation::<Tag>().unwrap().0, "prop3d");

    // A global entry for a more derived type still beats a local base entry.
    let factory = ViewNodeFactory::new(backend).with_override("Prop3D", prop3d_tag);
    let node = factory.create_node(&(Leaf::new(GLYPH) as SceneRef)).unwrap();
    assert_eq!(node.implementation::<Tag>().unwrap().0, "actor");
}

#[test]
fn no_match_is_a_named_error() {
    let factory = ViewNodeFactory::new("sg-empty");
    let err = factory
        .create_node(&(Leaf::new(UNMAPPED) as SceneRef))
        .unwrap_err();
    match err {
        VizError::NoOverride {
            class_name,
            backend,
        } => {
            assert_eq!(class_name, "Unmapped");
            assert_eq!(backend, "sg-empty");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dispatch_failure_skips_only_that_object() {
    let backend = "sg-partial";
    register_override(backend, "Object", object_tag);
    let factory = ViewNodeFactory::new(backend);
    let ok: SceneRef = Leaf::new(&["Thing", "Object"]);
    let bad: SceneRef = Leaf::new(UNMAPPED);
    let ok2: SceneRef = Leaf::new(&["Other", "Object"]);
    let group: SceneRef = Group::new(vec![ok.clone(), bad, ok2.clone()]);

    let mut root = factory.create_node(&group).unwrap();
    let mut resources = ResourceRegistry::default();
    let (stats, _) = traverse(&mut root, &factory, &mut resources, &[Operation::Build]);
    assert_eq!(stats.dispatch_failures, 1);
    assert_eq!(root.core().num_children(), 2);
    assert!(root.find(ok.object_id()).is_some());
    assert!(root.find(ok2.object_id()).is_some());
}

#[test]
fn reconciling_unchanged_membership_keeps_the_same_nodes() {
    let backend = "sg-stable";
    register_override(backend, "Object", object_tag);
    let factory = ViewNodeFactory::new(backend);
    let a: SceneRef = Leaf::new(&["A", "Object"]);
    let b: SceneRef = Leaf::new(&["B", "Object"]);
    let group: SceneRef = Group::new(vec![a.clone(), b.clone()]);
    let mut root = factory.create_node(&group).unwrap();
    let mut resources = ResourceRegistry::default();

    traverse(&mut root, &factory, &mut resources, &[Operation::Build]);
    let ids = |root: &ViewNode| {
        let mut out = Vec::new();
        root.walk(&mut |n| out.push(n.id()));
        out
    };
    let first = ids(&root);
    let created = factory.created();

    traverse(&mut root, &factory, &mut resources, &[Operation::Build]);
    assert_eq!(ids(&root), first);
    assert_eq!(factory.created(), created);
    assert_eq!(root.count(), 3);
}

#[test]
fn removed_children_release_their_resources() {
    let backend = "sg-release";
    register_override(backend, "Object", holder);
    let factory = ViewNodeFactory::new(backend);
    let a: SceneRef = Leaf::new(&["A", "Object"]);
    let b: SceneRef = Leaf::new(&["B", "Object"]);
    let group = Group::new(vec![a.clone(), b.clone()]);
    let group_ref: SceneRef = group.clone();
    let mut root = factory.create_node(&group_ref).unwrap();
    let mut resources = ResourceRegistry::default();

    traverse(&mut root, &factory, &mut resources, &[Operation::Build]);
    assert_eq!(resources.len(), 3);
    let kept = root.core().child(b.object_id()).unwrap().id();

    group.remove(&a);
    traverse(&mut root, &factory, &mut resources, &[Operation::Build]);
    assert_eq!(resources.len(), 2);
    assert!(!resources.contains(ResourceKey::new(a.object_id(), "blob")));
    assert_eq!(root.core().child(b.object_id()).unwrap().id(), kept);

    traverse(&mut root, &factory, &mut resources, &[Operation::Release]);
    assert!(resources.is_empty());
    assert_eq!(resources.stats().released, 3);
}

#[test]
fn prepass_runs_top_down_and_postpass_bottom_up() {
    let backend = "sg-order";
    register_override(backend, "Object", object_tag);
    let factory = ViewNodeFactory::new(backend);
    let leaf: SceneRef = Leaf::new(&["Leaf", "Object"]);
    let group: SceneRef = Group::new(vec![leaf.clone()]);
    let mut root = factory.create_node(&group).unwrap();
    let mut resources = ResourceRegistry::default();

    let (_, trace) = traverse(
        &mut root,
        &factory,
        &mut resources,
        &[Operation::Build, Operation::Opaque],
    );
    let opaque: Vec<_> = trace
        .iter()
        .filter_map(|e| match e {
            TraceEvent::Visit {
                op: Operation::Opaque,
                prepass,
                object,
                ..
            } => Some((*object, *prepass)),
            _ => None,
        })
        .collect();
    assert_eq!(
        opaque,
        vec![
            (group.object_id(), true),
            (leaf.object_id(), true),
            (leaf.object_id(), false),
            (group.object_id(), false),
        ]
    );
}

#[test]
fn handled_traversals_skip_the_subtree() {
    let backend = "sg-gate";
    register_override(backend, "Group", gate);
    register_override(backend, "Object", object_tag);
    let factory = ViewNodeFactory::new(backend);
    let leaf: SceneRef = Leaf::new(&["Leaf", "Object"]);
    let group: SceneRef = Group::new(vec![leaf]);
    let mut root = factory.create_node(&group).unwrap();
    let mut resources = ResourceRegistry::default();

    let (stats, trace) = traverse(
        &mut root,
        &factory,
        &mut resources,
        &[Operation::Build, Operation::Opaque],
    );
    // Build reached the leaf; opaque stopped at the gate.
    assert_eq!(root.count(), 2);
    assert_eq!(stats.node_visits, 3);
    assert!(trace.iter().all(|e| matches!(
        e,
        TraceEvent::Visit {
            op: Operation::Build,
            ..
        }
    )));
}

#[test]
fn frame_targets_nest_and_return_to_the_pool() {
    let factory = ViewNodeFactory::new("sg-frame");
    let mut resources = ResourceRegistry::default();
    let mut surfaces = SurfacePool::default();
    {
        let mut frame = FrameContext::new(&factory, &mut resources, &mut surfaces, canvas());
        assert!(frame.push_offscreen().is_err());
        frame.begin_target().unwrap();
        frame.push_offscreen().unwrap();
        assert_eq!(frame.target_depth(), 2);
        let layer = frame.pop_offscreen().unwrap();
        assert!(frame.pop_offscreen().is_none());
        frame.retire(layer);
        let out = frame.finish();
        assert!(out.target.is_some());
    }
    let stats = surfaces.stats();
    assert_eq!(stats.alloc_surfaces, 2);
    assert_eq!(stats.retained_surfaces, 1);
}

#[test]
fn pick_ids_map_back_to_objects() {
    let factory = ViewNodeFactory::new("sg-pick");
    let mut resources = ResourceRegistry::default();
    let mut surfaces = SurfacePool::default();
    let a: SceneRef = Leaf::new(&["A", "Object"]);
    let mut frame =
        FrameContext::new(&factory, &mut resources, &mut surfaces, canvas()).with_pick_buffer();
    let id = frame.register_pick_object(a.object_id());
    assert_eq!(frame.register_pick_object(a.object_id()), id);
    if let Some(pick) = frame.pick.as_mut() {
        pick.set(1, 2, id);
    }
    let out = frame.finish();
    assert_eq!(out.picked(1, 2), Some(a.object_id()));
    assert_eq!(out.picked(0, 0), None);
}
