//! Error types for fdfd-core.

use thiserror::Error;

use crate::grid::{Axis, GridShape};

#[derive(Debug, Error)]
pub enum Error {
    #[error("grid {0} has an empty axis")]
    EmptyGrid(GridShape),

    #[error("E{axis} component has {actual} values, grid {shape} needs {expected}")]
    ComponentLength {
        axis: Axis,
        shape: GridShape,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
