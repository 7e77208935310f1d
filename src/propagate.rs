//! Fixed-step propagation over a time interval.

use log::{debug, trace};
use ndarray::prelude::*;
use num_complex::Complex64;
use std::error::Error;
use std::marker::PhantomData;

use crate::error::{CreatePropagatorError, DimensionMismatch, PropagateError};
use crate::generator::{check_dimensions, dyn_generator};
use crate::rk::{RKMethod, Rk4};
use crate::OdeIntegrate;

/// A step whose end lands within this fraction of `h` of the time bound is
/// stretched to end exactly on it.
const SNAP_TOLERANCE: f64 = 1e-9;

/// Evenly spaced time grid, endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationConfig {
    /// Initial time.
    pub t0: f64,
    /// Final time. May be smaller than `t0` to integrate backward.
    pub t_bound: f64,
    /// Number of grid points including both endpoints.
    pub num_points: usize,
    /// Record every intermediate state, not only the endpoints.
    pub store_trajectory: bool,
}

impl Default for PropagationConfig {
    /// 1000 points on `[0, 10]`, i.e. `h = 10 / 999`.
    fn default() -> Self {
        PropagationConfig {
            t0: 0.,
            t_bound: 10.,
            num_points: 1000,
            store_trajectory: true,
        }
    }
}

impl PropagationConfig {
    pub fn validate(&self) -> Result<(), CreatePropagatorError> {
        if !self.t0.is_finite() || !self.t_bound.is_finite() {
            return Err(CreatePropagatorError::TimeBoundNotFinite);
        }
        if self.num_points < 2 {
            return Err(CreatePropagatorError::TooFewPoints(self.num_points));
        }
        let h = self.step_size();
        if h <= 0. {
            return Err(CreatePropagatorError::StepNotPositive(h));
        }
        Ok(())
    }

    /// Absolute grid spacing.
    pub fn step_size(&self) -> f64 {
        (self.t_bound - self.t0).abs() / (self.num_points.max(2) - 1) as f64
    }
}

/// Fixed-step Runge–Kutta integrator for `dy/dt = fun(operator, y)`.
pub struct FixedStep<F, M>
where
    F: FnMut(ArrayView2<Complex64>, ArrayView2<Complex64>) -> Result<Array2<Complex64>, DimensionMismatch>,
    M: RKMethod,
{
    fun: F,
    method: PhantomData<M>,
    operator: Array2<Complex64>,
    /// Initial time.
    t0: f64,
    /// Current time.
    t: f64,
    /// Current state.
    y: Array2<Complex64>,
    /// Boundary time.
    t_bound: f64,
    /// Integration direction: +1 or -1.
    direction: f64,
    /// Absolute step size.
    h_abs: f64,
    /// Number of steps taken so far.
    n_steps: usize,
}

impl<F, M> FixedStep<F, M>
where
    F: FnMut(ArrayView2<Complex64>, ArrayView2<Complex64>) -> Result<Array2<Complex64>, DimensionMismatch>,
    M: RKMethod,
{
    /// Creates a new `FixedStep` integrator.
    ///
    /// # Parameters
    ///
    /// * `fun`: Right-hand side of the system. Calling `fun(operator, y)`
    ///   returns the derivative of `y`.
    ///
    /// * `operator`: Fixed operator passed to `fun`.
    ///
    /// * `t0`: Initial value of the independent variable.
    ///
    /// * `y0`: Initial state, square with the same dimension as `operator`.
    ///
    /// * `t_bound`: Boundary time. The integration won't continue beyond
    ///   it. It also determines the direction of the integration.
    ///
    /// * `h`: Absolute step size. The last step is shortened so that the
    ///   integration ends exactly at `t_bound`.
    pub fn new(
        fun: F,
        operator: Array2<Complex64>,
        t0: f64,
        y0: Array2<Complex64>,
        t_bound: f64,
        h: f64,
    ) -> Result<FixedStep<F, M>, CreatePropagatorError> {
        if !t0.is_finite() || !t_bound.is_finite() {
            return Err(CreatePropagatorError::TimeBoundNotFinite);
        }
        if !h.is_finite() || h <= 0. {
            return Err(CreatePropagatorError::StepNotPositive(h));
        }
        check_dimensions(operator.view(), y0.view())?;

        let direction = if t_bound < t0 { -1. } else { 1. };
        debug!(
            "fixed-step order-{} integrator: dim {}, t {} -> {}, h {}",
            M::ORDER,
            y0.nrows(),
            t0,
            t_bound,
            h
        );

        Ok(FixedStep {
            fun,
            method: PhantomData,
            operator,
            t0,
            t: t0,
            y: y0,
            t_bound,
            direction,
            h_abs: h,
            n_steps: 0,
        })
    }

    /// Creates an integrator over the grid described by `config`.
    pub fn from_config(
        fun: F,
        operator: Array2<Complex64>,
        y0: Array2<Complex64>,
        config: &PropagationConfig,
    ) -> Result<FixedStep<F, M>, CreatePropagatorError> {
        config.validate()?;
        FixedStep::new(fun, operator, config.t0, y0, config.t_bound, config.step_size())
    }

    /// Advances by one step, or does nothing if `t_bound` was reached.
    ///
    /// On error the time and state are left unchanged.
    pub fn advance(&mut self) -> Result<(), DimensionMismatch> {
        if self.finished() {
            return Ok(());
        }
        // Times are taken from the grid rather than accumulated so the
        // endpoint does not drift.
        let remaining = (self.t_bound - self.t).abs();
        let t_new = if remaining <= self.h_abs * (1. + SNAP_TOLERANCE) {
            self.t_bound
        } else {
            self.t0 + (self.n_steps + 1) as f64 * self.h_abs * self.direction
        };
        let h = t_new - self.t;

        self.y = M::step(&mut self.fun, self.operator.view(), self.y.view(), h)?;
        self.t = t_new;
        self.n_steps += 1;
        trace!("step {} to t = {}", self.n_steps, self.t);
        Ok(())
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> usize {
        self.n_steps
    }

    /// Absolute step size.
    pub fn step_size(&self) -> f64 {
        self.h_abs
    }

    pub fn operator(&self) -> ArrayView2<'_, Complex64> {
        self.operator.view()
    }

    /// Consumes the integrator, returning the current state.
    pub fn into_state(self) -> Array2<Complex64> {
        self.y
    }
}

impl<F, M> OdeIntegrate for FixedStep<F, M>
where
    F: FnMut(ArrayView2<Complex64>, ArrayView2<Complex64>) -> Result<Array2<Complex64>, DimensionMismatch>,
    M: RKMethod,
{
    fn len(&self) -> usize {
        self.y.len()
    }

    fn step(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(self.advance()?)
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn time_bound(&self) -> f64 {
        self.t_bound
    }

    fn state(&self) -> ArrayView2<'_, Complex64> {
        self.y.view()
    }
}

/// Sampled solution: `states[i]` is the state at `times[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<Array2<Complex64>>,
}

impl Trajectory {
    pub fn push(&mut self, t: f64, state: ArrayView2<Complex64>) {
        self.times.push(t);
        self.states.push(state.to_owned());
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Final time and state, if any.
    pub fn last(&self) -> Option<(f64, ArrayView2<'_, Complex64>)> {
        self.times
            .last()
            .zip(self.states.last())
            .map(|(&t, y)| (t, y.view()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, ArrayView2<'_, Complex64>)> + '_ {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(&t, y)| (t, y.view()))
    }
}

/// Integrates `dy/dt = -i [operator, y]` over the grid in `config`, taking
/// every step with [`rk4`](crate::rk::rk4).
///
/// The returned trajectory holds every grid point if
/// `config.store_trajectory` is set and only the two endpoints otherwise.
pub fn propagate(
    operator: ArrayView2<Complex64>,
    y0: ArrayView2<Complex64>,
    config: &PropagationConfig,
) -> Result<Trajectory, PropagateError> {
    let mut solver = FixedStep::<_, Rk4>::from_config(
        dyn_generator,
        operator.to_owned(),
        y0.to_owned(),
        config,
    )?;
    let mut trajectory = Trajectory::default();
    trajectory.push(solver.time(), solver.state());
    while !solver.finished() {
        solver.advance()?;
        if config.store_trajectory {
            trajectory.push(solver.time(), solver.state());
        }
    }
    if !config.store_trajectory {
        trajectory.push(solver.time(), solver.state());
    }
    debug!(
        "propagated to t = {} in {} steps",
        solver.time(),
        solver.steps()
    );
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observables::{basis_state, pauli_x};
    use crate::rk::{rk4, Euler};

    #[test]
    fn default_grid_spacing() {
        let config = PropagationConfig::default();
        assert_eq!(config.step_size(), 0.01001001001001001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_configs() {
        let base = PropagationConfig::default();
        let cases = vec![
            (
                PropagationConfig { t_bound: f64::INFINITY, ..base.clone() },
                CreatePropagatorError::TimeBoundNotFinite,
            ),
            (
                PropagationConfig { t0: f64::NAN, ..base.clone() },
                CreatePropagatorError::TimeBoundNotFinite,
            ),
            (
                PropagationConfig { num_points: 1, ..base.clone() },
                CreatePropagatorError::TooFewPoints(1),
            ),
            (
                PropagationConfig { t_bound: 0., ..base.clone() },
                CreatePropagatorError::StepNotPositive(0.),
            ),
        ];
        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn rejects_bad_step_and_shape() {
        let create = |h: f64, dim: usize| {
            FixedStep::<_, Euler>::new(dyn_generator, pauli_x(), 0., basis_state(dim, 0), 1., h)
                .map(|_| ())
        };
        assert_eq!(create(0., 2), Err(CreatePropagatorError::StepNotPositive(0.)));
        assert_eq!(create(-0.1, 2), Err(CreatePropagatorError::StepNotPositive(-0.1)));
        assert!(matches!(
            create(0.1, 3),
            Err(CreatePropagatorError::Dimension(DimensionMismatch { .. }))
        ));
        assert!(create(0.1, 2).is_ok());
    }

    #[test]
    fn lands_exactly_on_bound() {
        let config = PropagationConfig::default();
        let mut solver =
            FixedStep::<_, Rk4>::from_config(dyn_generator, pauli_x(), basis_state(2, 0), &config)
                .unwrap();
        solver.run_to_bound().unwrap();
        assert_eq!(solver.time(), 10.);
        assert_eq!(solver.steps(), 999);
        assert_eq!(solver.len(), 4);

        // Further steps are no-ops.
        let before = solver.state().to_owned();
        solver.step().unwrap();
        assert_eq!(solver.steps(), 999);
        assert_eq!(solver.state(), before);
    }

    #[test]
    fn shortens_last_step() {
        let mut solver =
            FixedStep::<_, Rk4>::new(dyn_generator, pauli_x(), 0., basis_state(2, 0), 1., 0.3)
                .unwrap();
        solver.run_to_bound().unwrap();
        assert_eq!(solver.steps(), 4);
        assert_eq!(solver.time(), 1.);
    }

    #[test]
    fn integrates_backward() {
        let mut solver =
            FixedStep::<_, Rk4>::new(dyn_generator, pauli_x(), 1., basis_state(2, 0), -1., 0.5)
                .unwrap();
        solver.run_to_bound().unwrap();
        assert_eq!(solver.steps(), 4);
        assert_eq!(solver.time(), -1.);
    }

    #[test]
    fn steps_go_through_rk4() {
        let h = 0.01001001001001001;
        let (o, y0) = (pauli_x(), basis_state(2, 0));
        let mut solver =
            FixedStep::<_, Rk4>::new(dyn_generator, o.clone(), 0., y0.clone(), 1., h).unwrap();
        assert_eq!(solver.operator(), o);
        solver.advance().unwrap();
        let expected = rk4(dyn_generator, o.view(), y0.view(), h).unwrap();
        assert_eq!(solver.state(), expected);
    }

    #[test]
    fn matches_manual_rk4_loop() {
        let config = PropagationConfig::default();
        let o = pauli_x();
        let trajectory = propagate(o.view(), basis_state(2, 0).view(), &config).unwrap();
        let mut y = basis_state(2, 0);
        for (t_prev, (t, rho)) in trajectory.times.iter().zip(trajectory.iter().skip(1)) {
            y = rk4(dyn_generator, o.view(), y.view(), t - t_prev).unwrap();
            assert_eq!(rho, y);
        }
    }

    #[test]
    fn endpoints_only() {
        let config = PropagationConfig {
            num_points: 11,
            t_bound: 1.,
            store_trajectory: false,
            ..PropagationConfig::default()
        };
        let trajectory = propagate(pauli_x().view(), basis_state(2, 0).view(), &config).unwrap();
        assert_eq!(trajectory.times, vec![0., 1.]);
        assert_eq!(trajectory.last().map(|(t, _)| t), Some(1.));
    }

    #[test]
    fn shape_error_surfaces_from_propagate() {
        let err = propagate(
            pauli_x().view(),
            basis_state(3, 0).view(),
            &PropagationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PropagateError::Create(CreatePropagatorError::Dimension(_))
        ));
    }
}
