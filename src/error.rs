//! Structural failures that end (or prevent) a simulation run
//!
//! Recoverable numerical hiccups are not errors; they are counted in
//! [`crate::simulation::RunCounters`].

use crate::physics::math::Scalar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run was declared numerically divergent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceReason {
    /// Total energy became NaN or infinite.
    NonFiniteEnergy,
    /// Total energy left the configured sanity band around `E₀`.
    EnergyOutOfBounds,
    /// The collision predictor exhausted its iteration budget too often.
    PersistentImprecision,
}

impl fmt::Display for DivergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergenceReason::NonFiniteEnergy => write!(f, "total energy is not finite"),
            DivergenceReason::EnergyOutOfBounds => write!(f, "total energy left the sanity bound"),
            DivergenceReason::PersistentImprecision => {
                write!(f, "collision prediction failed to converge too often")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationError {
    /// The configuration cannot describe a valid run.
    InvalidConfiguration(String),
    /// Rejection sampling could not place every particle without overlap.
    InitializationFailure {
        placed: usize,
        requested: usize,
        attempts: usize,
    },
    /// The run was halted because the numerics can no longer be trusted.
    NumericalDivergence {
        time: Scalar,
        step: u64,
        energy: Scalar,
        reason: DivergenceReason,
    },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {msg}")
            }
            SimulationError::InitializationFailure {
                placed,
                requested,
                attempts,
            } => write!(
                f,
                "Initialization failed: placed {placed} of {requested} particles \
                 before exhausting {attempts} placement attempts"
            ),
            SimulationError::NumericalDivergence {
                time,
                step,
                energy,
                reason,
            } => write!(
                f,
                "Numerical divergence at t = {time} (step {step}, E = {energy}): {reason}"
            ),
        }
    }
}

impl std::error::Error for SimulationError {}
