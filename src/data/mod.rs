pub mod array;
pub mod object;
pub mod poly;

pub use array::{CellArray, DataArray, FieldData};
pub use object::{DataObject, DataRef, downcast_data, downcast_data_ref};
pub use poly::PolyData;
