use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{VizError, VizResult};
use crate::render::composite::{over_in_place_clipped, pixel_span, premul_rgba8};
use crate::scene_graph::frame::PickBuffer;

/// One projected triangle with its straight RGBA8 fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenTriangle {
    pub points: [Point; 3],
    /// Mean distance along the view direction; larger is farther.
    pub depth: f64,
    pub rgba: [u8; 4],
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn triangle_path(points: &[Point; 3]) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    out.move_to(point_to_cpu(points[0]));
    out.line_to(point_to_cpu(points[1]));
    out.line_to(point_to_cpu(points[2]));
    out.close_path();
    out
}

fn check_same_size(a: &vello_cpu::Pixmap, b: &vello_cpu::Pixmap) -> VizResult<()> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(VizError::resource(format!(
            "scratch surface {}x{} does not match target {}x{}",
            b.width(),
            b.height(),
            a.width(),
            a.height()
        )));
    }
    Ok(())
}

/// Back-to-front order.
pub fn sort_far_to_near(tris: &mut [ScreenTriangle]) {
    tris.sort_by(|a, b| b.depth.total_cmp(&a.depth));
}

/// Fill `tris` in order and composite the result over `target`, inside `clip` only.
///
/// `scratch` must be transparent; `vello_cpu` renders into a fresh buffer, so drawing happens
/// there and is premul-over'd onto the target.
pub fn fill_triangles(
    target: &mut vello_cpu::Pixmap,
    scratch: &mut vello_cpu::Pixmap,
    tris: &[ScreenTriangle],
    clip: Rect,
) -> VizResult<()> {
    check_same_size(target, scratch)?;
    if tris.is_empty() {
        return Ok(());
    }
    let mut ctx = vello_cpu::RenderContext::new(target.width(), target.height());
    for t in tris {
        let [r, g, b, a] = t.rgba;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_path(&triangle_path(&t.points));
    }
    ctx.flush();
    ctx.render_to_pixmap(scratch);
    let width = u32::from(target.width());
    over_in_place_clipped(
        target.data_as_u8_slice_mut(),
        scratch.data_as_u8_slice(),
        width,
        clip,
        1.0,
    )
}

/// Fill an axis-aligned pixel rectangle, blended over `target`.
pub fn fill_rect(
    target: &mut vello_cpu::Pixmap,
    scratch: &mut vello_cpu::Pixmap,
    rect: Rect,
    rgba: [u8; 4],
    clip: Rect,
) -> VizResult<()> {
    check_same_size(target, scratch)?;
    let mut ctx = vello_cpu::RenderContext::new(target.width(), target.height());
    let [r, g, b, a] = rgba;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
    ctx.flush();
    ctx.render_to_pixmap(scratch);
    let width = u32::from(target.width());
    over_in_place_clipped(
        target.data_as_u8_slice_mut(),
        scratch.data_as_u8_slice(),
        width,
        clip,
        1.0,
    )
}

/// Overwrite the pixels inside `rect` with a straight RGBA8 color.
pub fn clear_rect(target: &mut vello_cpu::Pixmap, rect: Rect, rgba: [u8; 4]) {
    let w = usize::from(target.width());
    let h = usize::from(target.height());
    let Some((x0, y0, x1, y1)) = pixel_span(rect, w, h) else {
        return;
    };
    let px = premul_rgba8(rgba);
    let data = target.data_as_u8_slice_mut();
    for y in y0..y1 {
        for chunk in data[(y * w + x0) * 4..(y * w + x1) * 4].chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }
}

/// Rasterize `tris` as coverage and stamp `id` on every fully covered pixel inside `clip`.
///
/// Returns the number of pixels written.
pub fn stamp_ids(
    pick: &mut PickBuffer,
    scratch: &mut vello_cpu::Pixmap,
    tris: &[ScreenTriangle],
    clip: Rect,
    id: u32,
) -> usize {
    if tris.is_empty() || id == 0 {
        return 0;
    }
    let (w, h) = (scratch.width(), scratch.height());
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    for t in tris {
        ctx.fill_path(&triangle_path(&t.points));
    }
    ctx.flush();
    ctx.render_to_pixmap(scratch);

    let (w, h) = (usize::from(w), usize::from(h));
    let Some((x0, y0, x1, y1)) = pixel_span(clip, w, h) else {
        return 0;
    };
    let data = scratch.data_as_u8_slice();
    let mut written = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            // Partially covered edge pixels stay with whatever was below.
            if data[(y * w + x) * 4 + 3] == 255 {
                pick.set(x as u32, y as u32, id);
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
#[path = "../../../tests/unit/render/cpu/raster.rs"]
mod tests;
