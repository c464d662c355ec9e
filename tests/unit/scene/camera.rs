use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn focal_point_projects_to_viewport_center() {
    let cam = Camera::new();
    let vp = Rect::new(0.0, 0.0, 200.0, 100.0);
    let p = cam.project([0.0, 0.0, 0.0], vp);
    assert_eq!(p.point, Point::new(100.0, 50.0));
    assert!(approx(p.depth, 1.0));
}

#[test]
fn world_up_is_screen_up() {
    let cam = Camera::new();
    cam.set_parallel_scale(2.0);
    let vp = Rect::new(0.0, 0.0, 100.0, 100.0);
    let top = cam.project([0.0, 2.0, 0.0], vp);
    assert!(approx(top.point.y, 0.0));
    let right = cam.project([1.0, 0.0, 0.0], vp);
    assert!(approx(right.point.x, 75.0));
}

#[test]
fn reset_fits_bounds_and_keeps_direction() {
    let cam = Camera::new();
    let before = cam.direction();
    cam.reset_to_bounds(Bounds([-1.0, 1.0, -1.0, 1.0, -1.0, 1.0]));
    assert_eq!(cam.focal_point(), [0.0, 0.0, 0.0]);
    let after = cam.direction();
    for i in 0..3 {
        assert!(approx(before[i], after[i]));
    }
    assert!(approx(cam.parallel_scale(), 3f64.sqrt()));
}

#[test]
fn azimuth_preserves_distance() {
    let cam = Camera::new();
    let s0 = cam.stamp();
    cam.azimuth(90.0);
    let p = cam.position();
    assert!(approx(p[0], 1.0));
    assert!(approx(p[2], 0.0));
    assert!(cam.stamp().is_newer_than(s0));
}

#[test]
fn unchanged_setters_keep_the_stamp() {
    let cam = Camera::new();
    let s0 = cam.stamp();
    assert!(!cam.set_position([0.0, 0.0, 1.0]));
    assert_eq!(cam.stamp(), s0);
}
