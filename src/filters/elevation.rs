use crate::data::{DataArray, PolyData};
use crate::foundation::core::{Vec3, dot3, sub3};
use crate::foundation::error::VizResult;
use crate::pipeline::{Algorithm, ComputeContext, PortDescriptor};

const INPUTS: &[PortDescriptor] = &[PortDescriptor::required("input")];
const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::required("output")];

/// Attaches an "Elevation" scalar: each point's projection onto `low_point → high_point`,
/// clamped to the segment and mapped into `scalar_range`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ElevationFilter {
    pub low_point: Vec3,
    pub high_point: Vec3,
    pub scalar_range: [f64; 2],
}

impl Default for ElevationFilter {
    fn default() -> Self {
        Self {
            low_point: [0.0, 0.0, 0.0],
            high_point: [0.0, 0.0, 1.0],
            scalar_range: [0.0, 1.0],
        }
    }
}

impl ElevationFilter {
    pub fn elevation(&self, p: Vec3) -> f64 {
        let axis = sub3(self.high_point, self.low_point);
        let len2 = dot3(axis, axis);
        let t = if len2 > 0.0 {
            (dot3(sub3(p, self.low_point), axis) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let [lo, hi] = self.scalar_range;
        lo + (hi - lo) * t
    }

    pub fn apply(&self, input: &PolyData) -> PolyData {
        let values = input.points().iter().map(|&p| self.elevation(p)).collect();
        let mut point_data = input.point_data().clone();
        point_data.set_scalars(DataArray::scalars("Elevation", values));
        PolyData::from_parts(input.points().to_vec(), input.polys().clone(), point_data)
    }
}

impl Algorithm for ElevationFilter {
    fn class_name(&self) -> &'static str {
        "ElevationFilter"
    }

    fn input_ports(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn output_ports(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn request_data(&mut self, ctx: &mut ComputeContext) -> VizResult<()> {
        let input = ctx.input_as::<PolyData>(0)?;
        ctx.set_output(0, self.apply(&input))
    }
}
