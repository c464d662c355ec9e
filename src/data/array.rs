/// Named array of `num_components`-tuples stored flat.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataArray {
    pub name: String,
    pub num_components: usize,
    pub values: Vec<f64>,
}

impl DataArray {
    pub fn new(name: impl Into<String>, num_components: usize, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            num_components: num_components.max(1),
            values,
        }
    }

    pub fn scalars(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, 1, values)
    }

    pub fn num_tuples(&self) -> usize {
        self.values.len() / self.num_components
    }

    pub fn tuple(&self, i: usize) -> Option<&[f64]> {
        let start = i.checked_mul(self.num_components)?;
        self.values.get(start..start + self.num_components)
    }

    /// `(min, max)` of one component, or `None` when empty. Non-finite values are skipped.
    pub fn range(&self, component: usize) -> Option<(f64, f64)> {
        if component >= self.num_components {
            return None;
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self
            .values
            .iter()
            .skip(component)
            .step_by(self.num_components)
            .filter(|v| v.is_finite())
        {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        (lo <= hi).then_some((lo, hi))
    }
}

/// Ordered collection of arrays attached to points, with one optional active scalar array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldData {
    arrays: Vec<DataArray>,
    active_scalars: Option<usize>,
}

impl FieldData {
    /// Adds or replaces the array with the same name; returns its index.
    pub fn add_array(&mut self, array: DataArray) -> usize {
        if let Some(i) = self.arrays.iter().position(|a| a.name == array.name) {
            self.arrays[i] = array;
            return i;
        }
        self.arrays.push(array);
        self.arrays.len() - 1
    }

    pub fn set_scalars(&mut self, array: DataArray) {
        let i = self.add_array(array);
        self.active_scalars = Some(i);
    }

    pub fn scalars(&self) -> Option<&DataArray> {
        self.active_scalars.and_then(|i| self.arrays.get(i))
    }

    pub fn array(&self, name: &str) -> Option<&DataArray> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn arrays(&self) -> &[DataArray] {
        &self.arrays
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

/// Variable-length cells in offsets + connectivity form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellArray {
    offsets: Vec<usize>,
    connectivity: Vec<usize>,
}

impl CellArray {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    pub fn push_cell(&mut self, point_ids: &[usize]) {
        self.connectivity.extend_from_slice(point_ids);
        self.offsets.push(self.connectivity.len());
    }

    pub fn num_cells(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.num_cells() == 0
    }

    pub fn cell(&self, i: usize) -> Option<&[usize]> {
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        self.connectivity.get(start..end)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(|w| &self.connectivity[w[0]..w[1]])
    }

    pub fn connectivity_len(&self) -> usize {
        self.connectivity.len()
    }
}

impl Default for CellArray {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/array.rs"]
mod tests;
