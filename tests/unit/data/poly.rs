use super::*;
use crate::data::object::{DataRef, downcast_data};
use std::rc::Rc;

fn quad() -> PolyData {
    let mut polys = CellArray::new();
    polys.push_cell(&[0, 1, 2, 3]);
    PolyData::from_parts(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        polys,
        FieldData::default(),
    )
}

#[test]
fn fan_triangulates_polygons() {
    let q = quad();
    let tris: Vec<_> = q.triangles().collect();
    assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);
}

#[test]
fn cells_with_invalid_ids_are_skipped() {
    let mut q = quad();
    let mut polys = CellArray::new();
    polys.push_cell(&[0, 1, 9]);
    polys.push_cell(&[0, 1]);
    q.set_polys(polys);
    assert_eq!(q.triangles().count(), 0);
}

#[test]
fn mutators_bump_stamp() {
    let mut q = quad();
    let s0 = q.stamp();
    q.set_points(vec![[0.0; 3]]);
    let s1 = q.stamp();
    assert!(s1.is_newer_than(s0));
    q.point_data_mut();
    assert!(q.stamp().is_newer_than(s1));
}

#[test]
fn bounds_cover_points() {
    assert_eq!(quad().bounds().0, [0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
    assert!(!PolyData::new().bounds().is_valid());
}

#[test]
fn downcast_through_shared_ref() {
    let d: DataRef = Rc::new(quad());
    assert_eq!(d.class_name(), "PolyData");
    let typed = downcast_data::<PolyData>(&d).unwrap();
    assert_eq!(typed.num_points(), 4);
    assert!(Rc::ptr_eq(&(typed as DataRef), &d));
}
