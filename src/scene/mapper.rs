use std::rc::Rc;

use crate::data::{DataObject, DataRef, PolyData, downcast_data};
use crate::foundation::core::{Bounds, Rgb, Vec3};
use crate::foundation::error::VizResult;
use crate::foundation::stamp::{Stamp, Stamped};
use crate::pipeline::{Algorithm, ComputeContext, Node, OutputPort, PortDescriptor};
use crate::scene::object::SceneObject;
use crate::scene::property::LookupTable;

const HIERARCHY: &[&str] = &["Mapper", "AbstractMapper", "Object"];
const INPUTS: &[PortDescriptor] = &[PortDescriptor::required("input")];
const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::required("geometry")];

/// Draw-ready triangles produced by a mapper.
#[derive(Debug, Default)]
pub struct MappedGeometry {
    stamped: Stamped,
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[usize; 3]>,
    /// Per-position colors when scalars were mapped.
    pub colors: Option<Vec<Rgb>>,
    bounds: Bounds,
}

impl MappedGeometry {
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Rough retained size, used for resource accounting.
    pub fn byte_size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<Vec3>()
            + self.triangles.len() * std::mem::size_of::<[usize; 3]>()
            + self
                .colors
                .as_ref()
                .map_or(0, |c| c.len() * std::mem::size_of::<Rgb>())
    }
}

impl DataObject for MappedGeometry {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_name(&self) -> &'static str {
        "MappedGeometry"
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Pipeline terminus converting poly data into [`MappedGeometry`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MapperAlgorithm {
    pub scalar_visibility: bool,
    /// Explicit scalar range; the data range is used when unset.
    pub scalar_range: Option<[f64; 2]>,
    pub lookup_table: LookupTable,
}

impl Default for MapperAlgorithm {
    fn default() -> Self {
        Self {
            scalar_visibility: true,
            scalar_range: None,
            lookup_table: LookupTable::default(),
        }
    }
}

impl MapperAlgorithm {
    pub fn map(&self, input: &PolyData) -> MappedGeometry {
        let colors = if self.scalar_visibility {
            input.point_data().scalars().and_then(|s| {
                let range = self.scalar_range.or_else(|| s.range(0).map(|(a, b)| [a, b]))?;
                Some(
                    (0..input.num_points())
                        .map(|i| {
                            let v = s.tuple(i).map_or(f64::NAN, |t| t[0]);
                            self.lookup_table.map(v, range)
                        })
                        .collect(),
                )
            })
        } else {
            None
        };
        MappedGeometry {
            stamped: Stamped::new(),
            positions: input.points().to_vec(),
            triangles: input.triangles().collect(),
            colors,
            bounds: input.bounds(),
        }
    }
}

impl Algorithm for MapperAlgorithm {
    fn class_name(&self) -> &'static str {
        "Mapper"
    }

    fn input_ports(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn output_ports(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn request_data(&mut self, ctx: &mut ComputeContext) -> VizResult<()> {
        let input = ctx.input_as::<PolyData>(0)?;
        ctx.set_output(0, self.map(&input))
    }
}

/// Scene-side handle on a mapper node. Shares the node's identity and stamp.
pub struct Mapper {
    node: Node<MapperAlgorithm>,
}

impl Mapper {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            node: Node::new(MapperAlgorithm::default()),
        })
    }

    pub fn node(&self) -> &Node<MapperAlgorithm> {
        &self.node
    }

    pub fn set_input_connection(&self, port: &OutputPort) -> VizResult<()> {
        self.node.set_input_connection(port, 0)
    }

    pub fn set_input_data(&self, data: DataRef) -> VizResult<()> {
        self.node.set_input_data(data, 0)
    }

    pub fn set_scalar_visibility(&self, on: bool) {
        if self.node.params().scalar_visibility != on {
            self.node.configure(|m| m.scalar_visibility = on);
        }
    }

    pub fn set_scalar_range(&self, range: Option<[f64; 2]>) {
        if self.node.params().scalar_range != range {
            self.node.configure(|m| m.scalar_range = range);
        }
    }

    pub fn update(&self) {
        self.node.update();
    }

    /// Pull, then return the geometry.
    pub fn geometry(&self) -> Option<Rc<MappedGeometry>> {
        self.node.output::<MappedGeometry>(0)
    }

    /// Last geometry and its output stamp, without pulling.
    pub fn cached_geometry(&self) -> Option<(Rc<MappedGeometry>, Stamp)> {
        let (data, stamp) = self.node.cached_output(0)?;
        downcast_data::<MappedGeometry>(&data).map(|g| (g, stamp))
    }

    /// Bounds of the mapped input; pulls the pipeline.
    pub fn bounds(&self) -> Bounds {
        self.geometry().map_or(Bounds::EMPTY, |g| g.bounds)
    }
}

impl SceneObject for Mapper {
    fn stamped(&self) -> &Stamped {
        self.node.stamped()
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        HIERARCHY
    }
}
