//! Runge–Kutta steppers.
//!
//! Only autonomous systems `dy/dt = f(O, y)` with a fixed operator `O` are
//! handled, so the node coefficients `c` of the Butcher tableau never enter
//! the computation and are not stored.

use lazy_static::lazy_static;
use ndarray::prelude::*;
use num_complex::Complex64;

/// Performs one classical fourth-order Runge–Kutta step.
///
/// ```text
/// k1 = h f(O, y)
/// k2 = h f(O, y + k1/2)
/// k3 = h f(O, y + k2/2)
/// k4 = h f(O, y + k3)
/// y_new = y + (k1 + 2 k2 + 2 k3 + k4) / 6
/// ```
///
/// # Parameters
///
/// * `fun`: Right-hand side of the system, e.g.
///   [`dyn_generator`](crate::generator::dyn_generator). Calling
///   `fun(operator, y)` returns the derivative of `y`.
/// * `operator`: Fixed operator passed through to `fun`.
/// * `state`: Current state.
/// * `h`: Step size. A negative value steps backward in time.
///
/// # Errors
///
/// The first error returned by `fun` is returned unchanged; no partial result
/// is produced.
pub fn rk4<F, E>(
    mut fun: F,
    operator: ArrayView2<Complex64>,
    state: ArrayView2<Complex64>,
    h: f64,
) -> Result<Array2<Complex64>, E>
where
    F: FnMut(ArrayView2<Complex64>, ArrayView2<Complex64>) -> Result<Array2<Complex64>, E>,
{
    let k1 = fun(operator, state)? * h;
    let k2 = fun(operator, (&k1 * 0.5 + &state).view())? * h;
    let k3 = fun(operator, (&k2 * 0.5 + &state).view())? * h;
    let k4 = fun(operator, (&k3 + &state).view())? * h;
    Ok(&state + &((k1 + k2 * 2. + k3 * 2. + k4) * (1. / 6.)))
}

/// Performs one step of the explicit method `M`.
///
/// Stage `s` evaluates `fun` at `y + h Σ_j a[s][j] k_j` and the result is
/// `y + h Σ_s b[s] k_s`. Notation for the Butcher tableau is as in (ref 1).
///
/// # References
///
/// 1. E. Hairer, S. P. Norsett G. Wanner, "Solving Ordinary Differential
///    Equations I: Nonstiff Problems", Sec. II.1.
pub fn step_with<M, F, E>(
    mut fun: F,
    operator: ArrayView2<Complex64>,
    state: ArrayView2<Complex64>,
    h: f64,
) -> Result<Array2<Complex64>, E>
where
    M: RKMethod,
    F: FnMut(ArrayView2<Complex64>, ArrayView2<Complex64>) -> Result<Array2<Complex64>, E>,
{
    let mut k = Vec::with_capacity(M::NUM_STAGES);
    k.push(fun(operator, state)?);
    for a in M::a() {
        let mut y = state.to_owned();
        for (k_j, &a_j) in k.iter().zip(a) {
            if a_j != 0. {
                y.scaled_add(Complex64::new(h * a_j, 0.), k_j);
            }
        }
        k.push(fun(operator, y.view())?);
    }
    debug_assert_eq!(k.len(), M::NUM_STAGES);

    let mut y_new = state.to_owned();
    for (k_s, &b_s) in k.iter().zip(M::b()) {
        y_new.scaled_add(Complex64::new(h * b_s, 0.), k_s);
    }
    Ok(y_new)
}

pub trait RKMethod {
    /// Order of the method.
    const ORDER: usize;

    /// Number of stages in the method.
    const NUM_STAGES: usize;

    /// Coefficients for combining previous RK stages to compute the next
    /// stage, length `NUM_STAGES - 1`.
    ///
    /// For explicit methods the coefficients above the main diagonal are
    /// zeros, so `a` is stored as a list of arrays of increasing lengths. The
    /// first stage is always just `f`, thus no coefficients for it are
    /// required.
    fn a() -> &'static [ArrayView1<'static, f64>];

    /// Coefficients for combining RK stages for computing the final
    /// prediction, length `NUM_STAGES`.
    fn b() -> ArrayView1<'static, f64>;

    /// Performs one step of size `h`.
    ///
    /// Defaults to [`step_with`] on the tableau.
    fn step<F, E>(
        fun: F,
        operator: ArrayView2<Complex64>,
        state: ArrayView2<Complex64>,
        h: f64,
    ) -> Result<Array2<Complex64>, E>
    where
        Self: Sized,
        F: FnMut(ArrayView2<Complex64>, ArrayView2<Complex64>) -> Result<Array2<Complex64>, E>,
    {
        step_with::<Self, F, E>(fun, operator, state, h)
    }
}

/// Forward Euler method, order 1.
pub struct Euler;

impl RKMethod for Euler {
    const ORDER: usize = 1;

    const NUM_STAGES: usize = 1;

    fn a() -> &'static [ArrayView1<'static, f64>] {
        &[]
    }

    fn b() -> ArrayView1<'static, f64> {
        aview1(&[1.])
    }
}

/// Explicit midpoint method, order 2.
pub struct Midpoint;

impl RKMethod for Midpoint {
    const ORDER: usize = 2;

    const NUM_STAGES: usize = 2;

    fn a() -> &'static [ArrayView1<'static, f64>] {
        lazy_static! {
            static ref A: [ArrayView1<'static, f64>; 2 - 1] = [aview1(&[1./2.])];
        }
        &*A
    }

    fn b() -> ArrayView1<'static, f64> {
        aview1(&[0., 1.])
    }
}

/// Classical Runge–Kutta method, order 4.
///
/// [`RKMethod::step`] goes through [`rk4`]; [`step_with`] on this tableau
/// agrees with it up to rounding.
pub struct Rk4;

impl RKMethod for Rk4 {
    const ORDER: usize = 4;

    const NUM_STAGES: usize = 4;

    fn a() -> &'static [ArrayView1<'static, f64>] {
        lazy_static! {
            static ref A: [ArrayView1<'static, f64>; 4 - 1] = [
                aview1(&[1./2.]),
                aview1(&[0., 1./2.]),
                aview1(&[0., 0., 1.]),
            ];
        }
        &*A
    }

    fn b() -> ArrayView1<'static, f64> {
        aview1(&[1./6., 1./3., 1./3., 1./6.])
    }

    fn step<F, E>(
        fun: F,
        operator: ArrayView2<Complex64>,
        state: ArrayView2<Complex64>,
        h: f64,
    ) -> Result<Array2<Complex64>, E>
    where
        F: FnMut(ArrayView2<Complex64>, ArrayView2<Complex64>) -> Result<Array2<Complex64>, E>,
    {
        rk4(fun, operator, state, h)
    }
}
