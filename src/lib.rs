//! Fixed-step Runge–Kutta integration of the Liouville–von Neumann equation
//! `dy/dt = -i [O, y]` for complex square matrices.

pub mod error;
pub mod generator;
pub mod observables;
pub mod propagate;
pub mod rk;

pub use crate::error::{CreatePropagatorError, DimensionMismatch, PropagateError};
pub use crate::generator::{commutator, dyn_generator};
pub use crate::propagate::{propagate, FixedStep, PropagationConfig, Trajectory};
pub use crate::rk::rk4;

use ndarray::prelude::*;
use num_complex::Complex64;
use std::error::Error;

pub trait OdeIntegrate {
    /// Returns the number of elements in the state.
    fn len(&self) -> usize;
    /// Perform one step.
    fn step(&mut self) -> Result<(), Box<dyn Error>>;
    /// Current time.
    fn time(&self) -> f64;
    /// The ending time.
    fn time_bound(&self) -> f64;
    /// Current state.
    fn state(&self) -> ArrayView2<'_, Complex64>;
    /// Returns `true` if the integration has reached `time_bound`.
    fn finished(&self) -> bool {
        self.time() == self.time_bound()
    }
    /// Integrate until reaching `time_bound`.
    fn run_to_bound(&mut self) -> Result<(), Box<dyn Error>> {
        while !self.finished() {
            self.step()?;
        }
        Ok(())
    }
}
