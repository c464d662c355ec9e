use super::*;
use crate::foundation::core::Rgb;
use crate::foundation::error::VizError;
use crate::scene::mapper::MappedGeometry;
use crate::scene::object::SceneRef;
use crate::scene::prop::Actor;
use crate::scene_graph::factory::ViewNodeFactory;
use crate::scene_graph::overrides::registered_classes;
use super::nodes::GeometryBuffer;

fn geometry(triangles: Vec<[usize; 3]>, colors: Option<Vec<Rgb>>) -> MappedGeometry {
    let mut g = MappedGeometry::default();
    g.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    g.triangles = triangles;
    g.colors = colors;
    g
}

#[test]
fn register_covers_every_builtin_role() {
    register();
    let classes = registered_classes(BACKEND);
    for name in [
        "RenderWindow",
        "Renderer",
        "Camera",
        "Prop3D",
        "Actor",
        "Volume",
        "Actor2D",
        "Mapper",
    ] {
        assert!(classes.contains(&name), "{name} missing");
    }
}

#[test]
fn actors_dispatch_to_their_own_entry() {
    register();
    let factory = ViewNodeFactory::new(BACKEND);
    let actor: SceneRef = Actor::new();
    let node = factory.create_node(&actor).unwrap();
    assert_eq!(node.matched_override(), "Actor");
    assert!(node.implementation::<nodes::SurfacePropNode>().is_some());
}

#[test]
fn non_props_are_refused_by_prop_constructors() {
    let camera: SceneRef = std::rc::Rc::new(crate::scene::camera::Camera::new());
    assert!(nodes::surface_prop_node(&camera).is_err());
    assert!(nodes::mapper_node(&camera).is_err());
}

#[test]
fn geometry_buffer_averages_vertex_colors() {
    let g = geometry(
        vec![[0, 1, 2]],
        Some(vec![Rgb::new(0.0, 0.0, 0.0), Rgb::new(0.3, 0.0, 0.0), Rgb::new(0.6, 0.0, 0.0)]),
    );
    let buf = GeometryBuffer::from_geometry(&g).unwrap();
    assert_eq!(buf.triangles.len(), 1);
    let c = buf.colors.as_ref().unwrap()[0];
    assert!((c.r - 0.3).abs() < 1e-12);
    assert!(buf.byte_size() > 0);
}

#[test]
fn broken_geometry_is_a_resource_error() {
    let err = GeometryBuffer::from_geometry(&geometry(vec![[0, 1, 9]], None)).unwrap_err();
    assert!(matches!(err, VizError::Resource(_)));

    let err = GeometryBuffer::from_geometry(&geometry(vec![[0, 1, 2]], Some(vec![Rgb::WHITE])))
        .unwrap_err();
    assert!(matches!(err, VizError::Resource(_)));
}
