use super::*;
use crate::filters::ConeSource;
use crate::foundation::core::{Rect, Rgb};
use crate::pipeline::Node;
use std::cell::Cell;
use std::rc::Rc;

fn cone_actor() -> (Node<ConeSource>, Rc<Mapper>, Rc<Actor>) {
    let cone = Node::new(ConeSource::default());
    let mapper = Mapper::new();
    mapper.set_input_connection(&cone.output_port(0)).unwrap();
    let actor = Actor::with_mapper(mapper.clone());
    (cone, mapper, actor)
}

#[test]
fn hierarchies_run_most_derived_first() {
    let (_, mapper, actor) = cone_actor();
    assert_eq!(actor.class_hierarchy()[0], "Actor");
    assert_eq!(actor.class_name(), "Actor");
    assert_eq!(mapper.class_hierarchy(), &["Mapper", "AbstractMapper", "Object"]);
    assert_eq!(Renderer::new().class_hierarchy()[1], "Viewport");
    assert_eq!(
        Actor2D::new(Rect::ZERO, Rgb::WHITE).class_hierarchy(),
        &["Actor2D", "Prop", "Object"]
    );
}

#[test]
fn scene_children_follow_membership() {
    let (_, mapper, actor) = cone_actor();
    let ren = Renderer::new();
    ren.add_view_prop(actor.clone());
    let kids = ren.scene_children();
    assert_eq!(kids.len(), 2);
    assert_eq!(kids[0].class_name(), "Camera");
    assert_eq!(kids[1].object_id(), actor.object_id());

    let actor_kids = actor.scene_children();
    assert_eq!(actor_kids.len(), 1);
    assert_eq!(actor_kids[0].object_id(), mapper.object_id());

    let as_prop: PropRef = actor.clone();
    assert!(ren.remove_view_prop(&as_prop));
    assert_eq!(ren.scene_children().len(), 1);
}

#[test]
fn adding_the_same_prop_twice_is_a_no_op() {
    let (_, _, actor) = cone_actor();
    let ren = Renderer::new();
    assert!(ren.add_view_prop(actor.clone()));
    let s = ren.stamp();
    assert!(!ren.add_view_prop(actor));
    assert_eq!(ren.stamp(), s);
}

#[test]
fn reset_camera_pulls_visible_pipelines() {
    let (cone, _, actor) = cone_actor();
    let ren = Renderer::new();
    ren.add_view_prop(actor.clone());
    ren.reset_camera();
    assert_eq!(cone.compute_count(), 1);
    let cam = ren.camera();
    assert!(cam.parallel_scale() > 0.5);

    actor.set_visibility(false);
    assert!(!ren.visible_bounds().is_valid());
}

#[test]
fn translucency_follows_opacity() {
    let (_, mapper, actor) = cone_actor();
    assert!(actor.is_opaque());
    actor.property().set_opacity(0.4);
    assert!(!actor.is_opaque());
    assert!(!Volume::new(mapper).is_opaque());
}

#[test]
fn mapper_colors_scalars_only_when_visible() {
    use crate::filters::ElevationFilter;
    let cone = Node::new(ConeSource::default());
    let elev = Node::new(ElevationFilter::default());
    elev.set_input_connection(&cone.output_port(0), 0).unwrap();
    let mapper = Mapper::new();
    mapper.set_input_connection(&elev.output_port(0)).unwrap();

    let g = mapper.geometry().unwrap();
    assert_eq!(g.colors.as_ref().unwrap().len(), g.positions.len());
    assert_eq!(g.num_triangles(), 6 + 4);

    mapper.set_scalar_visibility(false);
    assert!(mapper.geometry().unwrap().colors.is_none());
    let (_, stamp) = mapper.cached_geometry().unwrap();
    mapper.set_scalar_visibility(false);
    assert_eq!(mapper.cached_geometry().unwrap().1, stamp);
}

#[test]
fn viewport_must_fit_the_unit_square() {
    let ren = Renderer::new();
    assert!(ren.set_viewport(Rect::new(0.0, 0.0, 0.5, 1.0)).unwrap());
    assert!(ren.set_viewport(Rect::new(0.5, 0.0, 1.5, 1.0)).is_err());
    assert!(ren.set_viewport(Rect::new(0.2, 0.2, 0.2, 0.8)).is_err());
}

#[test]
fn pre_render_hooks_run_in_order_and_persist() {
    let win = RenderWindow::new(8, 8).unwrap();
    let hits = Rc::new(Cell::new(0u32));
    let h = hits.clone();
    win.on_pre_render(move |_| h.set(h.get() + 1));
    win.run_pre_render_hooks();
    win.run_pre_render_hooks();
    assert_eq!(hits.get(), 2);
}

#[test]
fn window_size_changes_bump_the_stamp() {
    let win = RenderWindow::new(8, 8).unwrap();
    let s = win.stamp();
    win.set_size(8, 8).unwrap();
    assert_eq!(win.stamp(), s);
    win.set_size(16, 8).unwrap();
    assert!(win.stamp().is_newer_than(s));
    assert!(win.set_size(0, 8).is_err());
}
