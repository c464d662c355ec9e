use crate::data::array::{CellArray, FieldData};
use crate::data::object::DataObject;
use crate::foundation::core::{Bounds, Vec3};
use crate::foundation::stamp::Stamped;

/// Surface mesh: points, polygonal cells and per-point attributes.
///
/// Every bulk mutator bumps the object's stamp.
#[derive(Debug, Default)]
pub struct PolyData {
    stamped: Stamped,
    points: Vec<Vec3>,
    polys: CellArray,
    point_data: FieldData,
}

impl PolyData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(points: Vec<Vec3>, polys: CellArray, point_data: FieldData) -> Self {
        Self {
            stamped: Stamped::new(),
            points,
            polys,
            point_data,
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn polys(&self) -> &CellArray {
        &self.polys
    }

    pub fn point_data(&self) -> &FieldData {
        &self.point_data
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.polys.num_cells()
    }

    pub fn set_points(&mut self, points: Vec<Vec3>) {
        self.points = points;
        self.stamped.modified();
    }

    pub fn set_polys(&mut self, polys: CellArray) {
        self.polys = polys;
        self.stamped.modified();
    }

    pub fn point_data_mut(&mut self) -> &mut FieldData {
        self.stamped.modified();
        &mut self.point_data
    }

    /// Fan triangulation of every polygon with at least three valid point ids.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let n = self.points.len();
        self.polys
            .iter()
            .filter(move |cell| cell.len() >= 3 && cell.iter().all(|&i| i < n))
            .flat_map(|cell| (1..cell.len() - 1).map(move |k| [cell[0], cell[k], cell[k + 1]]))
    }
}

impl DataObject for PolyData {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_name(&self) -> &'static str {
        "PolyData"
    }

    fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.points)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/poly.rs"]
mod tests;
