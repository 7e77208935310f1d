//! Density-matrix observables and common operators.

use ndarray::prelude::*;
use ndarray::{array, Zip};
use num_complex::Complex64;

use crate::error::DimensionMismatch;
use crate::generator::check_dimensions;

/// Trace of a square matrix.
pub fn trace(m: ArrayView2<Complex64>) -> Complex64 {
    debug_assert_eq!(m.nrows(), m.ncols());
    m.diag().sum()
}

/// Purity `Re Tr(ρ²)`; equal to 1 for pure states.
///
/// # Errors
///
/// Returns `DimensionMismatch` if `rho` is not square.
pub fn purity(rho: ArrayView2<Complex64>) -> Result<f64, DimensionMismatch> {
    check_dimensions(rho, rho)?;
    Ok(trace(rho.dot(&rho).view()).re)
}

/// Expectation value `Re Tr(O ρ)` of a Hermitian operator.
///
/// # Errors
///
/// Returns `DimensionMismatch` unless both matrices are square with the same
/// dimension.
pub fn expectation(
    operator: ArrayView2<Complex64>,
    rho: ArrayView2<Complex64>,
) -> Result<f64, DimensionMismatch> {
    check_dimensions(operator, rho)?;
    // Tr(O ρ) = Σ_ij O_ij ρ_ji, no need for the full product.
    Ok(Zip::from(operator)
        .and(rho.t())
        .fold(Complex64::new(0., 0.), |acc, &o, &r| acc + o * r)
        .re)
}

/// State fidelity `Re Tr(σ ρ)`.
///
/// Exact when `target` is a pure state `|ψ⟩⟨ψ|`, where it reduces to
/// `⟨ψ|ρ|ψ⟩`.
pub fn state_fidelity(
    rho: ArrayView2<Complex64>,
    target: ArrayView2<Complex64>,
) -> Result<f64, DimensionMismatch> {
    expectation(target, rho)
}

pub fn conjugate_transpose(m: ArrayView2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Returns `true` if `m` is square and within `tol` of its conjugate
/// transpose, elementwise.
pub fn is_hermitian(m: ArrayView2<Complex64>, tol: f64) -> bool {
    m.is_square()
        && Zip::from(m)
            .and(m.t())
            .fold(true, |acc, &a, &b| acc && (a - b.conj()).norm() <= tol)
}

/// Density matrix `|k⟩⟨k|` of the `k`-th computational basis state.
///
/// # Panics
///
/// Panics if `k >= dim`.
pub fn basis_state(dim: usize, k: usize) -> Array2<Complex64> {
    assert!(k < dim, "basis index {} out of range for dimension {}", k, dim);
    let mut rho = Array2::zeros((dim, dim));
    rho[[k, k]] = Complex64::new(1., 0.);
    rho
}

pub fn pauli_x() -> Array2<Complex64> {
    let (o, l) = (Complex64::new(0., 0.), Complex64::new(1., 0.));
    array![[o, l], [l, o]]
}

pub fn pauli_y() -> Array2<Complex64> {
    let (o, i) = (Complex64::new(0., 0.), Complex64::i());
    array![[o, -i], [i, o]]
}

pub fn pauli_z() -> Array2<Complex64> {
    let (o, l) = (Complex64::new(0., 0.), Complex64::new(1., 0.));
    array![[l, o], [o, -l]]
}
