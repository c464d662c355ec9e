use std::f64::consts::TAU;

use crate::data::{CellArray, FieldData, PolyData};
use crate::foundation::core::{Vec3, add3};
use crate::foundation::error::{VizError, VizResult};
use crate::pipeline::{Algorithm, ComputeContext, PortDescriptor};

const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::required("output")];

/// Right circular cone along +x: apex at `center + height/2`, base ring at `center - height/2`.
///
/// Produces `resolution + 1` points, `resolution` side triangles and, when `capping` is set,
/// one base polygon.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConeSource {
    pub resolution: u32,
    pub height: f64,
    pub radius: f64,
    pub center: Vec3,
    pub capping: bool,
}

impl Default for ConeSource {
    fn default() -> Self {
        Self {
            resolution: 6,
            height: 1.0,
            radius: 0.5,
            center: [0.0; 3],
            capping: true,
        }
    }
}

impl ConeSource {
    pub fn build(&self) -> VizResult<PolyData> {
        if self.resolution < 3 {
            return Err(VizError::validation(format!(
                "cone resolution must be >= 3, got {}",
                self.resolution
            )));
        }
        if !(self.height.is_finite() && self.radius.is_finite()) {
            return Err(VizError::validation("cone height/radius must be finite"));
        }

        let n = self.resolution as usize;
        let half = self.height * 0.5;
        let mut points = Vec::with_capacity(n + 1);
        points.push(add3(self.center, [half, 0.0, 0.0]));
        for i in 0..n {
            let a = TAU * (i as f64) / (n as f64);
            points.push(add3(
                self.center,
                [-half, self.radius * a.cos(), self.radius * a.sin()],
            ));
        }

        let mut polys = CellArray::new();
        for i in 0..n {
            polys.push_cell(&[0, 1 + i, 1 + (i + 1) % n]);
        }
        if self.capping {
            let ring: Vec<usize> = (1..=n).rev().collect();
            polys.push_cell(&ring);
        }
        Ok(PolyData::from_parts(points, polys, FieldData::default()))
    }
}

impl Algorithm for ConeSource {
    fn class_name(&self) -> &'static str {
        "ConeSource"
    }

    fn output_ports(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn request_data(&mut self, ctx: &mut ComputeContext) -> VizResult<()> {
        ctx.set_output(0, self.build()?)
    }
}
