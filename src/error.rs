//! Error types.

use thiserror::Error;

/// The operator and state are not square matrices of the same dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "operator is {}×{} but state is {}×{}; both must be square with the same dimension",
    .operator[0], .operator[1], .state[0], .state[1]
)]
pub struct DimensionMismatch {
    /// Shape of the operator, `[rows, cols]`.
    pub operator: [usize; 2],
    /// Shape of the state, `[rows, cols]`.
    pub state: [usize; 2],
}

/// Failure to set up a fixed-step propagation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CreatePropagatorError {
    #[error("t0 and t_bound must be finite")]
    TimeBoundNotFinite,
    #[error("step size {0} is not a positive finite number")]
    StepNotPositive(f64),
    /// The time grid needs at least its two endpoints.
    #[error("num_points must be at least 2, got {0}")]
    TooFewPoints(usize),
    #[error(transparent)]
    Dimension(#[from] DimensionMismatch),
}

/// Failure while running [`propagate`](crate::propagate::propagate).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagateError {
    #[error(transparent)]
    Create(#[from] CreatePropagatorError),
    #[error(transparent)]
    Dimension(#[from] DimensionMismatch),
}
