use super::*;
use crate::data::{DataObject, DataRef, PolyData};
use crate::foundation::error::VizError;
use crate::pipeline::Node;
use crate::runtime::task::{LocalPool, Promise, Task, promise};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn cone_has_resolution_plus_one_points() {
    let cone = ConeSource {
        resolution: 8,
        capping: false,
        ..ConeSource::default()
    }
    .build()
    .unwrap();
    assert_eq!(cone.num_points(), 9);
    assert_eq!(cone.num_cells(), 8);

    let capped = ConeSource::default().build().unwrap();
    assert_eq!(capped.num_cells(), 7);
    assert_eq!(capped.polys().cell(6).unwrap().len(), 6);
}

#[test]
fn cone_rejects_degenerate_resolution() {
    let err = ConeSource {
        resolution: 2,
        ..ConeSource::default()
    }
    .build()
    .unwrap_err();
    assert!(err.to_string().contains("resolution"));
}

#[test]
fn cone_bounds_follow_height_and_radius() {
    let cone = ConeSource {
        height: 2.0,
        radius: 1.0,
        resolution: 4,
        ..ConeSource::default()
    }
    .build()
    .unwrap();
    let b = cone.bounds().0;
    assert!((b[0] + 1.0).abs() < 1e-12);
    assert!((b[1] - 1.0).abs() < 1e-12);
    assert!((b[3] - 1.0).abs() < 1e-12);
}

#[test]
fn shrink_moves_points_towards_centroid() {
    let cone = ConeSource {
        resolution: 4,
        capping: false,
        ..ConeSource::default()
    }
    .build()
    .unwrap();
    let shrunk = ShrinkPolyData { shrink_factor: 0.0 }.shrink(&cone).unwrap();
    assert_eq!(shrunk.num_points(), 12);
    let first = shrunk.polys().cell(0).unwrap();
    let p: Vec<_> = first.iter().map(|&i| shrunk.points()[i]).collect();
    assert_eq!(p[0], p[1]);
    assert_eq!(p[1], p[2]);

    assert!(ShrinkPolyData { shrink_factor: 1.5 }.shrink(&cone).is_err());
}

#[test]
fn shrink_carries_point_scalars() {
    let cone = ConeSource::default().build().unwrap();
    let lifted = ElevationFilter {
        low_point: [-0.5, 0.0, 0.0],
        high_point: [0.5, 0.0, 0.0],
        scalar_range: [0.0, 1.0],
    }
    .apply(&cone);
    let shrunk = ShrinkPolyData::default().shrink(&lifted).unwrap();
    let scalars = shrunk.point_data().scalars().unwrap();
    assert_eq!(scalars.name, "Elevation");
    assert_eq!(scalars.num_tuples(), shrunk.num_points());
}

#[test]
fn elevation_is_clamped_to_the_segment() {
    let f = ElevationFilter {
        low_point: [0.0, 0.0, 0.0],
        high_point: [0.0, 0.0, 2.0],
        scalar_range: [10.0, 20.0],
    };
    assert_eq!(f.elevation([0.0, 0.0, 1.0]), 15.0);
    assert_eq!(f.elevation([5.0, 5.0, -3.0]), 10.0);
    assert_eq!(f.elevation([0.0, 0.0, 9.0]), 20.0);
}

#[test]
fn append_offsets_connectivity() {
    let a = ConeSource {
        resolution: 3,
        capping: false,
        ..ConeSource::default()
    }
    .build()
    .unwrap();
    let out = AppendPolyData::append(&[&a, &a]);
    assert_eq!(out.num_points(), 8);
    assert_eq!(out.num_cells(), 6);
    assert_eq!(out.polys().cell(3).unwrap(), &[4, 5, 6]);
    // Arrays missing on one side are dropped.
    let lifted = ElevationFilter::default().apply(&a);
    assert!(AppendPolyData::append(&[&lifted, &a]).point_data().is_empty());
    assert!(
        AppendPolyData::append(&[&lifted, &lifted])
            .point_data()
            .scalars()
            .is_some()
    );
}

#[derive(Default)]
struct ManualFetch {
    pending: RefCell<Vec<Promise<DataRef>>>,
}

impl Fetch for ManualFetch {
    fn fetch(&self, _url: &str) -> Task<DataRef> {
        let (p, t) = promise();
        self.pending.borrow_mut().push(p);
        t
    }
}

#[test]
fn reader_publishes_data_after_the_continuation_runs() {
    let fetch = Rc::new(ManualFetch::default());
    let mut pool = LocalPool::new();
    let reader = Node::new(DataSetReader::new("mem://cone", fetch.clone()));
    let shrink = Node::new(ShrinkPolyData::default());
    shrink
        .set_input_connection(&reader.output_port(0), 0)
        .unwrap();

    let task = reader.load(&pool.spawner());
    assert!(shrink.output_data(0).is_none());

    let data: DataRef = Rc::new(ConeSource::default().build().unwrap());
    fetch.pending.borrow_mut().remove(0).resolve(data.clone());
    // Nothing happens until the pool is drained on the render thread.
    assert!(!reader.params().is_loaded());
    pool.run_until_stalled();

    let loaded = pollster::block_on(task).unwrap();
    assert!(Rc::ptr_eq(&loaded, &data));
    assert!(Rc::ptr_eq(&reader.output_data(0).unwrap(), &data));
    assert!(shrink.output::<PolyData>(0).is_some());
}

#[test]
fn reader_failure_keeps_previous_output() {
    let fetch = Rc::new(ManualFetch::default());
    let mut pool = LocalPool::new();
    let reader = Node::new(DataSetReader::new("mem://x", fetch.clone()));

    let first = reader.load(&pool.spawner());
    let data: DataRef = Rc::new(PolyData::new());
    fetch.pending.borrow_mut().remove(0).resolve(data.clone());
    pool.run_until_stalled();
    assert!(pollster::block_on(first).is_ok());

    let second = reader.load(&pool.spawner());
    fetch
        .pending
        .borrow_mut()
        .remove(0)
        .reject(VizError::resource("404"));
    pool.run_until_stalled();
    assert!(pollster::block_on(second).is_err());
    assert!(Rc::ptr_eq(&reader.output_data(0).unwrap(), &data));
}

#[test]
fn reader_without_fetcher_fails_fast() {
    let reader = Node::new(DataSetReader::default());
    let pool = LocalPool::new();
    let err = reader.load(&pool.spawner()).try_take().unwrap().err().unwrap();
    assert!(err.to_string().contains("no fetcher"));
}
