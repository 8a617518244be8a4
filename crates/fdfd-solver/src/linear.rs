//! Dense assembly and direct solves for small grids.
//!
//! A field is flattened component-major: all `Ex` cells, then `Ey`, then `Ez`,
//! each in grid order.

use fdfd_core::{Axis, GridShape, VecField};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64 as C64;

use crate::error::{Error, Result};
use crate::operator::FieldOperator;

/// Flatten a field into a column vector.
pub fn to_dvector(field: &VecField) -> DVector<C64> {
    DVector::from_iterator(field.len(), field.iter().copied())
}

/// Rebuild a field from a column vector of length `3 * shape.len()`.
pub fn from_dvector(shape: GridShape, v: &DVector<C64>) -> Result<VecField> {
    let n = shape.len();
    if v.len() != 3 * n {
        return Err(Error::DimensionMismatch {
            expected: 3 * n,
            actual: v.len(),
        });
    }
    let slice = v.as_slice();
    let comps = Axis::ALL.map(|a| slice[a.index() * n..(a.index() + 1) * n].to_vec());
    Ok(VecField::from_components(shape, comps)?)
}

/// Assemble `op` (with mass term `z`) column by column.
pub fn assemble_dense<O>(op: &O, z: &VecField) -> DMatrix<C64>
where
    O: FieldOperator + ?Sized,
{
    let shape = op.shape();
    let dim = 3 * shape.len();
    let mut a = DMatrix::zeros(dim, dim);
    let mut unit = VecField::zeros(shape);
    let mut col = VecField::zeros(shape);

    for axis in Axis::ALL {
        for idx in 0..shape.len() {
            unit.component_mut(axis)[idx] = C64::new(1.0, 0.0);
            op.apply(&unit, z, &mut col);
            unit.component_mut(axis)[idx] = C64::new(0.0, 0.0);

            let j = axis.index() * shape.len() + idx;
            for (i, value) in col.iter().enumerate() {
                a[(i, j)] = *value;
            }
        }
    }
    a
}

/// Solve a complex linear system Ax = b using LU decomposition.
pub fn solve_complex(a: &DMatrix<C64>, b: &DVector<C64>) -> Result<DVector<C64>> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    a.clone().lu().solve(b).ok_or(Error::SingularMatrix)
}

/// Direct solve of `op(x; z) = b` through the assembled matrix.
pub fn solve_dense<O>(op: &O, z: &VecField, b: &VecField) -> Result<VecField>
where
    O: FieldOperator + ?Sized,
{
    let shape = op.shape();
    for (what, actual) in [("z", z.shape()), ("b", b.shape())] {
        if actual != shape {
            return Err(Error::ShapeMismatch {
                what,
                expected: shape,
                actual,
            });
        }
    }
    let a = assemble_dense(op, z);
    let x = solve_complex(&a, &to_dvector(b))?;
    from_dvector(shape, &x)
}
