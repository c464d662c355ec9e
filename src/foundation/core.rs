use crate::foundation::error::{VizError, VizResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// World-space position or direction.
pub type Vec3 = [f64; 3];

pub fn sub3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn add3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn scale3(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot3(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross3(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Unit vector in the direction of `a`, or `None` for a (near) zero vector.
pub fn normalize3(a: Vec3) -> Option<Vec3> {
    let len = dot3(a, a).sqrt();
    if !len.is_finite() || len <= f64::EPSILON {
        return None;
    }
    Some(scale3(a, 1.0 / len))
}

/// Axis-aligned world-space box stored as `[xmin, xmax, ymin, ymax, zmin, zmax]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds(pub [f64; 6]);

impl Bounds {
    /// Inverted box; the union identity.
    pub const EMPTY: Self = Self([
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
    ]);

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut b = Self::EMPTY;
        for p in points {
            b.add_point(*p);
        }
        b
    }

    pub fn is_valid(&self) -> bool {
        let b = &self.0;
        b[0] <= b[1] && b[2] <= b[3] && b[4] <= b[5]
    }

    pub fn add_point(&mut self, p: Vec3) {
        for axis in 0..3 {
            self.0[axis * 2] = self.0[axis * 2].min(p[axis]);
            self.0[axis * 2 + 1] = self.0[axis * 2 + 1].max(p[axis]);
        }
    }

    pub fn union(self, other: Self) -> Self {
        if !other.is_valid() {
            return self;
        }
        if !self.is_valid() {
            return other;
        }
        let mut out = self;
        for axis in 0..3 {
            out.0[axis * 2] = self.0[axis * 2].min(other.0[axis * 2]);
            out.0[axis * 2 + 1] = self.0[axis * 2 + 1].max(other.0[axis * 2 + 1]);
        }
        out
    }

    pub fn center(&self) -> Vec3 {
        let b = &self.0;
        [(b[0] + b[1]) * 0.5, (b[2] + b[3]) * 0.5, (b[4] + b[5]) * 0.5]
    }

    pub fn diagonal(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        let b = &self.0;
        let d = [b[1] - b[0], b[3] - b[2], b[5] - b[4]];
        dot3(d, d).sqrt()
    }

    /// The eight corner points.
    pub fn corners(&self) -> [Vec3; 8] {
        let b = &self.0;
        let mut out = [[0.0; 3]; 8];
        for (i, c) in out.iter_mut().enumerate() {
            *c = [
                b[i & 1],
                b[2 + ((i >> 1) & 1)],
                b[4 + ((i >> 2) & 1)],
            ];
        }
        out
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Straight (non-premultiplied) color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Straight RGBA8 with the given opacity.
    pub fn to_rgba8(self, opacity: f64) -> [u8; 4] {
        fn q(v: f64) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [q(self.r), q(self.g), q(self.b), q(opacity)]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Output surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// CPU targets are addressed with 16-bit dimensions.
    pub fn new(width: u32, height: u32) -> VizResult<Self> {
        if width == 0 || height == 0 {
            return Err(VizError::validation("canvas width/height must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(VizError::validation(format!(
                "canvas {width}x{height} exceeds the 65535px limit"
            )));
        }
        Ok(Self { width, height })
    }

    /// Pixel rectangle covered by a normalized viewport `[x0, y0, x1, y1]` (origin bottom-left).
    pub fn viewport_px(self, viewport: Rect) -> Rect {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        Rect::new(
            viewport.x0 * w,
            (1.0 - viewport.y1) * h,
            viewport.x1 * w,
            (1.0 - viewport.y0) * h,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
