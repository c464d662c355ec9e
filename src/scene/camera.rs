use std::cell::Cell;

use crate::foundation::core::{
    Bounds, Point, Rect, Vec3, add3, cross3, dot3, normalize3, scale3, sub3,
};
use crate::foundation::stamp::Stamped;
use crate::scene::object::{SceneObject, set_if_changed};

const HIERARCHY: &[&str] = &["Camera", "Object"];

/// Orthographic camera.
///
/// Looks from `position` towards `focal_point`; `parallel_scale` is half the world-space
/// height of the viewport.
#[derive(Debug)]
pub struct Camera {
    stamped: Stamped,
    position: Cell<Vec3>,
    focal_point: Cell<Vec3>,
    view_up: Cell<Vec3>,
    parallel_scale: Cell<f64>,
}

/// Projected point: viewport pixel plus distance along the view direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub point: Point,
    pub depth: f64,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            stamped: Stamped::new(),
            position: Cell::new([0.0, 0.0, 1.0]),
            focal_point: Cell::new([0.0, 0.0, 0.0]),
            view_up: Cell::new([0.0, 1.0, 0.0]),
            parallel_scale: Cell::new(1.0),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position.get()
    }

    pub fn set_position(&self, p: Vec3) -> bool {
        set_if_changed(&self.stamped, &self.position, p)
    }

    pub fn focal_point(&self) -> Vec3 {
        self.focal_point.get()
    }

    pub fn set_focal_point(&self, p: Vec3) -> bool {
        set_if_changed(&self.stamped, &self.focal_point, p)
    }

    pub fn view_up(&self) -> Vec3 {
        self.view_up.get()
    }

    pub fn set_view_up(&self, up: Vec3) -> bool {
        set_if_changed(&self.stamped, &self.view_up, up)
    }

    pub fn parallel_scale(&self) -> f64 {
        self.parallel_scale.get()
    }

    pub fn set_parallel_scale(&self, s: f64) -> bool {
        set_if_changed(&self.stamped, &self.parallel_scale, s.max(f64::EPSILON))
    }

    /// Unit view direction; falls back to -z for a degenerate camera.
    pub fn direction(&self) -> Vec3 {
        normalize3(sub3(self.focal_point(), self.position())).unwrap_or([0.0, 0.0, -1.0])
    }

    /// Orthonormal `(right, up, direction)`.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let dir = self.direction();
        let right = normalize3(cross3(dir, self.view_up()))
            .or_else(|| normalize3(cross3(dir, [1.0, 0.0, 0.0])))
            .unwrap_or([1.0, 0.0, 0.0]);
        let up = cross3(right, dir);
        (right, up, dir)
    }

    /// Map a world point into the pixel rectangle `viewport` (y down).
    pub fn project(&self, p: Vec3, viewport: Rect) -> Projected {
        let (right, up, dir) = self.basis();
        let rel = sub3(p, self.focal_point());
        let scale = viewport.height() / (2.0 * self.parallel_scale());
        let c = viewport.center();
        Projected {
            point: Point::new(
                c.x + dot3(rel, right) * scale,
                c.y - dot3(rel, up) * scale,
            ),
            depth: dot3(sub3(p, self.position()), dir),
        }
    }

    /// Keep the view direction and fit `bounds`.
    pub fn reset_to_bounds(&self, bounds: Bounds) {
        if !bounds.is_valid() {
            return;
        }
        let center = bounds.center();
        let radius = (bounds.diagonal() * 0.5).max(1e-6);
        let dir = self.direction();
        self.set_focal_point(center);
        self.set_position(sub3(center, scale3(dir, radius * 3.0)));
        self.set_parallel_scale(radius);
    }

    /// Rotate the position about the view-up axis through the focal point.
    pub fn azimuth(&self, degrees: f64) {
        let (_, up, _) = self.basis();
        let focal = self.focal_point();
        let v = sub3(self.position(), focal);
        let (s, c) = degrees.to_radians().sin_cos();
        // Rodrigues rotation.
        let rotated = add3(
            add3(scale3(v, c), scale3(cross3(up, v), s)),
            scale3(up, dot3(up, v) * (1.0 - c)),
        );
        self.set_position(add3(focal, rotated));
        self.set_view_up(up);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObject for Camera {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        HIERARCHY
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/camera.rs"]
mod tests;
