use crate::foundation::core::Rect;
use crate::foundation::error::{VizError, VizResult};

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> VizResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VizError::resource(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// [`over_in_place`] restricted to the pixels inside `clip`, for per-viewport compositing.
pub fn over_in_place_clipped(
    dst: &mut [u8],
    src: &[u8],
    width: u32,
    clip: Rect,
    opacity: f32,
) -> VizResult<()> {
    if dst.len() != src.len() || width == 0 || !dst.len().is_multiple_of(4 * width as usize) {
        return Err(VizError::resource(
            "over_in_place_clipped expects equal-length rgba8 buffers of the given width",
        ));
    }
    let w = width as usize;
    let h = dst.len() / (4 * w);
    let Some((x0, y0, x1, y1)) = pixel_span(clip, w, h) else {
        return Ok(());
    };
    for y in y0..y1 {
        let row = (y * w + x0) * 4..(y * w + x1) * 4;
        over_in_place(&mut dst[row.clone()], &src[row], opacity)?;
    }
    Ok(())
}

/// Integer pixel range covered by `rect`, clamped to the surface. `None` if empty.
pub fn pixel_span(rect: Rect, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
    let clamp = |v: f64, max: usize| -> usize {
        if v.is_nan() {
            0
        } else {
            (v.round().max(0.0) as usize).min(max)
        }
    };
    let (x0, x1) = (clamp(rect.x0, width), clamp(rect.x1, width));
    let (y0, y1) = (clamp(rect.y0, height), clamp(rect.y1, height));
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

pub fn premul_rgba8(rgba: [u8; 4]) -> PremulRgba8 {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

/// Inverse of [`premul_rgba8`], for encoders that expect straight alpha.
pub fn unpremul_rgba8(px: PremulRgba8) -> [u8; 4] {
    let [r, g, b, a] = px;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| -> u8 {
        ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
    };
    [un(r), un(g), un(b), a]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
