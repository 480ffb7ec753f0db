//! Simulation diagnostics module.
//!
//! Publishes the kernel's conservation and progress metrics through Bevy's
//! diagnostic system:
//!
//! - **Energy**: total energy and `|ΔE/E₀|`
//! - **Collisions**: running count of resolved collisions
//! - **Progress**: simulated time and step count
//!
//! Measurements are taken at a fixed wall-clock interval after the advance
//! system, so `LogDiagnosticsPlugin` (or any other consumer) sees smoothed
//! values with a bounded history.
//!
//! ```rust,ignore
//! app.add_plugins(SimulationDiagnosticsPlugin::default());
//! ```

use crate::plugins::simulation::{ActiveSimulation, SimulationSet};
use bevy::diagnostic::DEFAULT_MAX_HISTORY_LENGTH;
use bevy::diagnostic::Diagnostic;
use bevy::diagnostic::DiagnosticPath;
use bevy::diagnostic::Diagnostics;
use bevy::diagnostic::RegisterDiagnostic;
use bevy::prelude::*;
use core::time::Duration;

#[derive(Resource)]
pub struct SimulationDiagnosticsState {
    update_timer: Timer,
}

pub struct SimulationDiagnosticsPlugin {
    max_history_length: usize,
    smoothing_factor: f64,
    update_interval: Duration,
}

impl Default for SimulationDiagnosticsPlugin {
    fn default() -> Self {
        Self {
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            smoothing_factor: 0.1,
            update_interval: Duration::from_millis(250),
        }
    }
}

impl SimulationDiagnosticsPlugin {
    pub const ENERGY_PATH: DiagnosticPath = DiagnosticPath::const_new("energy/total");
    pub const RELATIVE_DEVIATION_PATH: DiagnosticPath =
        DiagnosticPath::const_new("energy/relative_deviation");
    pub const COLLISIONS_PATH: DiagnosticPath = DiagnosticPath::const_new("collisions/total");
    pub const SIMULATED_TIME_PATH: DiagnosticPath = DiagnosticPath::const_new("time/simulated");
    pub const STEPS_PATH: DiagnosticPath = DiagnosticPath::const_new("time/steps");

    const DIAGNOSTIC_PATHS: &'static [DiagnosticPath] = &[
        Self::ENERGY_PATH,
        Self::RELATIVE_DEVIATION_PATH,
        Self::COLLISIONS_PATH,
        Self::SIMULATED_TIME_PATH,
        Self::STEPS_PATH,
    ];

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    fn register_diagnostics(&self, app: &mut App) {
        for path in Self::DIAGNOSTIC_PATHS {
            app.register_diagnostic(
                Diagnostic::new(path.clone())
                    .with_max_history_length(self.max_history_length)
                    .with_smoothing_factor(self.smoothing_factor),
            );
        }
    }

    fn update_timer_ticks(mut state: ResMut<SimulationDiagnosticsState>, time: Res<Time<Real>>) {
        state.update_timer.tick(time.delta());
    }

    fn update_simulation_diagnostics(
        simulation: Option<Res<ActiveSimulation>>,
        mut diagnostics: Diagnostics,
        state: Res<SimulationDiagnosticsState>,
    ) {
        let Some(simulation) = simulation else {
            return;
        };
        if !state.update_timer.finished() {
            return;
        }

        let simulation = &simulation.0;
        let snapshot_state = simulation.state();
        let energy = simulation.energy();
        let reference = snapshot_state.initial_energy;

        diagnostics.add_measurement(&Self::ENERGY_PATH, || energy);
        diagnostics.add_measurement(&Self::RELATIVE_DEVIATION_PATH, || {
            crate::physics::conservation::relative_deviation(energy, reference)
        });
        diagnostics.add_measurement(&Self::COLLISIONS_PATH, || {
            simulation.counters().collisions as f64
        });
        diagnostics.add_measurement(&Self::SIMULATED_TIME_PATH, || snapshot_state.time);
        diagnostics.add_measurement(&Self::STEPS_PATH, || snapshot_state.step as f64);
    }
}

impl Plugin for SimulationDiagnosticsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SimulationDiagnosticsState {
            update_timer: Timer::new(self.update_interval, TimerMode::Repeating),
        });

        self.register_diagnostics(app);

        app.add_systems(
            Update,
            (
                Self::update_timer_ticks,
                Self::update_simulation_diagnostics,
            )
                .chain()
                .in_set(SimulationSet::Diagnostics),
        );
    }
}
