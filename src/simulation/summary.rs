use crate::error::SimulationError;
use crate::physics::math::Scalar;
use serde::{Deserialize, Serialize};

/// Recoverable events absorbed during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCounters {
    pub collisions: u64,
    /// Pair predictions that stopped at the bisection iteration cap.
    pub imprecise_predictions: u64,
    pub projections_applied: u64,
    /// Projections skipped because the energy was degenerate.
    pub projections_skipped: u64,
    /// Snapshots whose energy deviation exceeded the configured bound.
    pub bound_violations: u64,
    /// Largest `|ΔE/E₀|` seen at the end of any cycle.
    pub max_relative_deviation: Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    TimeLimit,
    StepBudget,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Completed(CompletionReason),
    Failed(SimulationError),
}

impl Termination {
    pub fn is_success(&self) -> bool {
        matches!(self, Termination::Completed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Local wall-clock start, RFC 3339.
    pub started_at: String,
    pub wall_clock_seconds: f64,
    pub steps: u64,
    pub simulated_time: Scalar,
    pub particle_count: usize,
    pub initial_energy: Scalar,
    pub final_energy: Scalar,
    pub final_relative_deviation: Scalar,
    pub termination: Termination,
    pub counters: RunCounters,
}

impl RunSummary {
    /// Summary of a run that never got past initialization.
    pub fn not_started(error: SimulationError) -> Self {
        Self {
            termination: Termination::Failed(error),
            started_at: chrono::Local::now().to_rfc3339(),
            wall_clock_seconds: 0.0,
            steps: 0,
            simulated_time: 0.0,
            particle_count: 0,
            initial_energy: 0.0,
            final_energy: 0.0,
            final_relative_deviation: 0.0,
            counters: RunCounters::default(),
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
