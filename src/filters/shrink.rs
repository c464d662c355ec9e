use crate::data::{CellArray, DataArray, FieldData, PolyData};
use crate::foundation::core::{Vec3, add3, scale3, sub3};
use crate::foundation::error::{VizError, VizResult};
use crate::pipeline::{Algorithm, ComputeContext, PortDescriptor};

const INPUTS: &[PortDescriptor] = &[PortDescriptor::required("input")];
const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::required("output")];

/// Pulls every cell towards its centroid. Cells stop sharing points in the output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShrinkPolyData {
    pub shrink_factor: f64,
}

impl Default for ShrinkPolyData {
    fn default() -> Self {
        Self { shrink_factor: 0.5 }
    }
}

impl ShrinkPolyData {
    pub fn shrink(&self, input: &PolyData) -> VizResult<PolyData> {
        if !(0.0..=1.0).contains(&self.shrink_factor) {
            return Err(VizError::validation(format!(
                "shrink factor must be in [0, 1], got {}",
                self.shrink_factor
            )));
        }
        let src = input.points();
        let mut points: Vec<Vec3> = Vec::with_capacity(input.polys().connectivity_len());
        let mut polys = CellArray::new();
        let mut origin: Vec<usize> = Vec::with_capacity(points.capacity());

        for cell in input.polys().iter() {
            if cell.is_empty() || cell.iter().any(|&i| i >= src.len()) {
                continue;
            }
            let inv = 1.0 / cell.len() as f64;
            let centroid = cell
                .iter()
                .fold([0.0; 3], |acc, &i| add3(acc, scale3(src[i], inv)));
            let first = points.len();
            for &i in cell {
                points.push(add3(
                    centroid,
                    scale3(sub3(src[i], centroid), self.shrink_factor),
                ));
                origin.push(i);
            }
            let ids: Vec<usize> = (first..points.len()).collect();
            polys.push_cell(&ids);
        }

        let mut point_data = FieldData::default();
        let active = input.point_data().scalars().map(|a| a.name.clone());
        for array in input.point_data().arrays() {
            let mut values = Vec::with_capacity(origin.len() * array.num_components);
            for &i in &origin {
                if let Some(t) = array.tuple(i) {
                    values.extend_from_slice(t);
                }
            }
            let copied = DataArray::new(array.name.clone(), array.num_components, values);
            if active.as_deref() == Some(array.name.as_str()) {
                point_data.set_scalars(copied);
            } else {
                point_data.add_array(copied);
            }
        }

        Ok(PolyData::from_parts(points, polys, point_data))
    }
}

impl Algorithm for ShrinkPolyData {
    fn class_name(&self) -> &'static str {
        "ShrinkPolyData"
    }

    fn input_ports(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn output_ports(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn request_data(&mut self, ctx: &mut ComputeContext) -> VizResult<()> {
        let input = ctx.input_as::<PolyData>(0)?;
        let out = self.shrink(&input)?;
        ctx.set_output(0, out)
    }
}
