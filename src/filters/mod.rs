//! Leaf computations used to drive the pipeline: one source, a few filters and an async reader.

pub mod append;
pub mod cone;
pub mod elevation;
pub mod reader;
pub mod shrink;

pub use append::AppendPolyData;
pub use cone::ConeSource;
pub use elevation::ElevationFilter;
pub use reader::{DataSetReader, Fetch};
pub use shrink::ShrinkPolyData;

#[cfg(test)]
#[path = "../../tests/unit/filters/mod.rs"]
mod tests;
