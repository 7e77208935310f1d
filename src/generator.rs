//! Liouville–von Neumann generator.
//!
//! For a time-independent operator `O` the state obeys
//!
//! ```text
//! dy/dt = -i [O, y] = -i (O y - y O)
//! ```
//!
//! which is the right-hand side evaluated here.

use ndarray::prelude::*;
use num_complex::Complex64;

use crate::error::DimensionMismatch;

/// Checks that `operator` and `state` are square and of the same dimension.
pub fn check_dimensions(
    operator: ArrayView2<Complex64>,
    state: ArrayView2<Complex64>,
) -> Result<(), DimensionMismatch> {
    let (o_rows, o_cols) = operator.dim();
    let (y_rows, y_cols) = state.dim();
    if o_rows == o_cols && y_rows == y_cols && o_rows == y_rows {
        Ok(())
    } else {
        Err(DimensionMismatch {
            operator: [o_rows, o_cols],
            state: [y_rows, y_cols],
        })
    }
}

/// Computes the commutator `[a, b] = a b - b a`.
pub fn commutator(
    a: ArrayView2<Complex64>,
    b: ArrayView2<Complex64>,
) -> Result<Array2<Complex64>, DimensionMismatch> {
    check_dimensions(a, b)?;
    Ok(a.dot(&b) - b.dot(&a))
}

/// Computes the derivative `-i [operator, state]`.
///
/// # Errors
///
/// Returns `DimensionMismatch` unless both matrices are square with the same
/// dimension. Nothing is multiplied in that case.
pub fn dyn_generator(
    operator: ArrayView2<Complex64>,
    state: ArrayView2<Complex64>,
) -> Result<Array2<Complex64>, DimensionMismatch> {
    let minus_i = -Complex64::i();
    Ok(commutator(operator, state)?.mapv_into(|z| z * minus_i))
}
