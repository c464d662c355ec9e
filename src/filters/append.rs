use crate::data::{CellArray, DataArray, FieldData, PolyData, downcast_data};
use crate::foundation::error::VizResult;
use crate::pipeline::{Algorithm, ComputeContext, PortDescriptor};

const INPUTS: &[PortDescriptor] = &[PortDescriptor::repeatable("input")];
const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::required("output")];

/// Concatenates any number of poly data inputs.
///
/// Point arrays survive only when every input carries an array of the same name and width.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AppendPolyData {}

impl AppendPolyData {
    pub fn append(inputs: &[&PolyData]) -> PolyData {
        let mut points = Vec::new();
        let mut polys = CellArray::new();
        let mut ids = Vec::new();
        for input in inputs {
            let offset = points.len();
            points.extend_from_slice(input.points());
            for cell in input.polys().iter() {
                ids.clear();
                ids.extend(cell.iter().map(|i| i + offset));
                polys.push_cell(&ids);
            }
        }

        let mut point_data = FieldData::default();
        if let Some((first, rest)) = inputs.split_first() {
            let active = first.point_data().scalars().map(|a| a.name.as_str());
            for array in first.point_data().arrays() {
                let others: Option<Vec<&DataArray>> = rest
                    .iter()
                    .map(|pd| {
                        pd.point_data()
                            .array(&array.name)
                            .filter(|a| a.num_components == array.num_components)
                    })
                    .collect();
                let Some(others) = others else {
                    continue;
                };
                let mut values = array.values.clone();
                for o in others {
                    values.extend_from_slice(&o.values);
                }
                let merged = DataArray::new(array.name.clone(), array.num_components, values);
                if active == Some(array.name.as_str()) {
                    point_data.set_scalars(merged);
                } else {
                    point_data.add_array(merged);
                }
            }
        }
        PolyData::from_parts(points, polys, point_data)
    }
}

impl Algorithm for AppendPolyData {
    fn class_name(&self) -> &'static str {
        "AppendPolyData"
    }

    fn input_ports(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn output_ports(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn request_data(&mut self, ctx: &mut ComputeContext) -> VizResult<()> {
        let inputs: Vec<_> = ctx
            .inputs_from(0)
            .filter_map(downcast_data::<PolyData>)
            .collect();
        let refs: Vec<&PolyData> = inputs.iter().map(|p| p.as_ref()).collect();
        ctx.set_output(0, Self::append(&refs))
    }
}
