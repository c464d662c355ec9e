use std::cell::Cell;

use crate::foundation::core::Rgb;
use crate::foundation::stamp::{Stamp, Stamped};
use crate::scene::object::set_if_changed;

/// Surface appearance shared by props.
#[derive(Debug)]
pub struct Property {
    stamped: Stamped,
    color: Cell<Rgb>,
    opacity: Cell<f64>,
}

impl Property {
    pub fn new() -> Self {
        Self::with_color(Rgb::WHITE, 1.0)
    }

    pub fn with_color(color: Rgb, opacity: f64) -> Self {
        Self {
            stamped: Stamped::new(),
            color: Cell::new(color),
            opacity: Cell::new(opacity.clamp(0.0, 1.0)),
        }
    }

    pub fn stamp(&self) -> Stamp {
        self.stamped.stamp()
    }

    pub fn color(&self) -> Rgb {
        self.color.get()
    }

    pub fn set_color(&self, color: Rgb) -> bool {
        set_if_changed(&self.stamped, &self.color, color)
    }

    pub fn opacity(&self) -> f64 {
        self.opacity.get()
    }

    pub fn set_opacity(&self, opacity: f64) -> bool {
        set_if_changed(&self.stamped, &self.opacity, opacity.clamp(0.0, 1.0))
    }
}

impl Default for Property {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps scalars to colors along an HSV hue ramp.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LookupTable {
    /// Hue at the low and high end of the range, in `[0, 1]`.
    pub hue_range: [f64; 2],
    pub saturation: f64,
    pub value: f64,
}

impl Default for LookupTable {
    fn default() -> Self {
        // Blue to red.
        Self {
            hue_range: [0.667, 0.0],
            saturation: 1.0,
            value: 1.0,
        }
    }
}

impl LookupTable {
    pub fn map(&self, scalar: f64, range: [f64; 2]) -> Rgb {
        let span = range[1] - range[0];
        let t = if span.abs() > f64::EPSILON && scalar.is_finite() {
            ((scalar - range[0]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let hue = self.hue_range[0] + (self.hue_range[1] - self.hue_range[0]) * t;
        hsv_to_rgb(hue, self.saturation, self.value)
    }
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let h = (h.rem_euclid(1.0)) * 6.0;
    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i as u8 {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}
