use super::*;
use crate::foundation::core::Canvas;

fn pixel(p: &vello_cpu::Pixmap, x: usize, y: usize) -> [u8; 4] {
    let w = usize::from(p.width());
    let i = (y * w + x) * 4;
    let d = p.data_as_u8_slice();
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

fn full_tri(w: f64, h: f64, rgba: [u8; 4], depth: f64) -> ScreenTriangle {
    // Covers the whole surface.
    ScreenTriangle {
        points: [
            Point::new(-1.0, -1.0),
            Point::new(2.0 * w + 2.0, -1.0),
            Point::new(-1.0, 2.0 * h + 2.0),
        ],
        depth,
        rgba,
    }
}

#[test]
fn triangles_land_inside_the_clip_only() {
    let mut target = vello_cpu::Pixmap::new(8, 8);
    let mut scratch = vello_cpu::Pixmap::new(8, 8);
    let clip = Rect::new(0.0, 0.0, 4.0, 8.0);
    fill_triangles(
        &mut target,
        &mut scratch,
        &[full_tri(8.0, 8.0, [255, 0, 0, 255], 1.0)],
        clip,
    )
    .unwrap();
    assert_eq!(pixel(&target, 1, 1), [255, 0, 0, 255]);
    assert_eq!(pixel(&target, 6, 1), [0, 0, 0, 0]);
}

#[test]
fn sorting_puts_far_triangles_first() {
    let mut tris = vec![
        full_tri(1.0, 1.0, [0, 0, 0, 255], 1.0),
        full_tri(1.0, 1.0, [0, 0, 0, 255], 5.0),
        full_tri(1.0, 1.0, [0, 0, 0, 255], 3.0),
    ];
    sort_far_to_near(&mut tris);
    let depths: Vec<f64> = tris.iter().map(|t| t.depth).collect();
    assert_eq!(depths, vec![5.0, 3.0, 1.0]);
}

#[test]
fn clear_rect_overwrites_with_premultiplied_color() {
    let mut target = vello_cpu::Pixmap::new(4, 4);
    clear_rect(&mut target, Rect::new(0.0, 0.0, 2.0, 2.0), [255, 255, 255, 128]);
    assert_eq!(pixel(&target, 0, 0), [128, 128, 128, 128]);
    assert_eq!(pixel(&target, 3, 3), [0, 0, 0, 0]);
}

#[test]
fn mismatched_scratch_is_a_resource_error() {
    let mut target = vello_cpu::Pixmap::new(4, 4);
    let mut scratch = vello_cpu::Pixmap::new(2, 2);
    let err = fill_rect(
        &mut target,
        &mut scratch,
        Rect::new(0.0, 0.0, 1.0, 1.0),
        [1, 2, 3, 255],
        Rect::new(0.0, 0.0, 4.0, 4.0),
    )
    .unwrap_err();
    assert!(matches!(err, VizError::Resource(_)));
}

#[test]
fn ids_are_stamped_on_covered_pixels() {
    let canvas = Canvas::new(6, 6).unwrap();
    let mut pick = PickBuffer::new(canvas);
    let mut scratch = vello_cpu::Pixmap::new(6, 6);
    let n = stamp_ids(
        &mut pick,
        &mut scratch,
        &[full_tri(6.0, 6.0, [0, 0, 0, 255], 0.0)],
        Rect::new(0.0, 0.0, 3.0, 6.0),
        7,
    );
    assert_eq!(n, 18);
    assert_eq!(pick.get(0, 0), 7);
    assert_eq!(pick.get(5, 0), 0);
    assert_eq!(pick.get(99, 0), 0);
}
