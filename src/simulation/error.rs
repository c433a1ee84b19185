//! Error kinds reported by the simulation core

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Parameters or initial state rejected before any computation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Requested sample times are empty, non-finite or not strictly increasing
    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    /// The state or its derivative became non-finite, or the step had to
    /// shrink below the time resolution (collision, finite-time blow-up)
    #[error("singular configuration encountered at time {t}")]
    Singular { t: f64 },

    /// The adaptive step shrank below the caller's `min_step`
    #[error("step size {h:e} underflowed at time {t}")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("maximum number of steps ({steps}) exceeded at time {t}")]
    MaxStepsExceeded { t: f64, steps: usize },
}

impl SimError {
    /// Simulation time at which integration stopped, if the error happened mid-run
    pub fn time(&self) -> Option<f64> {
        match self {
            Self::Singular { t }
            | Self::StepSizeUnderflow { t, .. }
            | Self::MaxStepsExceeded { t, .. } => Some(*t),
            Self::InvalidInput(_) | Self::InvalidTimeGrid(_) => None,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
