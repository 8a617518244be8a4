//! Core data structures for the FDFD solver.
//!
//! This crate provides the structured grid description and the
//! three-component complex [`VecField`] used for electric fields, current
//! sources, coefficient fields and Krylov vectors alike.

pub mod error;
pub mod field;
pub mod grid;

pub use error::{Error, Result};
pub use field::VecField;
pub use grid::{Axis, GridShape};
