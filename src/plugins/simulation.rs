//! Headless driver that owns a [`Simulation`] and advances it from the app schedule

use crate::config::SimulationConfig;
use crate::simulation::{RunState, RunSummary, Simulation, Snapshot, SnapshotSink};
use bevy::prelude::*;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Advance,
    Diagnostics,
}

/// The running kernel. Removed once the run terminates.
#[derive(Resource)]
pub struct ActiveSimulation(pub Simulation);

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct DriverSettings {
    /// Simulation cycles per app update.
    pub cycles_per_update: usize,
    /// Print the terminal summary to stdout as TOML.
    pub print_summary: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            cycles_per_update: 1_000,
            print_summary: false,
        }
    }
}

/// Logs each snapshot and keeps the latest one.
#[derive(Resource, Debug, Default)]
pub struct SnapshotLog {
    pub recorded: u64,
    pub latest: Option<Snapshot>,
}

impl SnapshotSink for SnapshotLog {
    fn record(&mut self, snapshot: Snapshot) {
        info!(
            "t = {:.3} (step {}): {} collisions, E = {:.12}, ΔE/E₀ = {:e}",
            snapshot.time,
            snapshot.step,
            snapshot.collisions,
            snapshot.energy,
            snapshot.relative_energy_deviation
        );
        self.recorded += 1;
        self.latest = Some(snapshot);
    }
}

/// Terminal summary, filled in when the run ends.
#[derive(Resource, Debug, Default)]
pub struct FinalSummary(pub Option<RunSummary>);

pub struct SimulationPlugin {
    config: SimulationConfig,
    settings: DriverSettings,
}

impl SimulationPlugin {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            settings: DriverSettings::default(),
        }
    }

    pub fn with_cycles_per_update(mut self, cycles: usize) -> Self {
        self.settings.cycles_per_update = cycles.max(1);
        self
    }

    pub fn with_summary_output(mut self, print_summary: bool) -> Self {
        self.settings.print_summary = print_summary;
        self
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        match toml::to_string_pretty(&self.config) {
            Ok(toml_string) => {
                info!("=== Current Configuration (TOML) ===\n{}", toml_string);
                info!("=== End Configuration ===");
            }
            Err(e) => {
                error!("Failed to serialize configuration to TOML: {}", e);
            }
        }

        app.insert_resource(self.config.clone());
        app.insert_resource(self.settings.clone());
        app.init_resource::<SnapshotLog>();
        app.init_resource::<FinalSummary>();

        app.configure_sets(
            Update,
            (SimulationSet::Advance, SimulationSet::Diagnostics).chain(),
        );
        app.add_systems(Startup, start_simulation);
        app.add_systems(Update, advance_simulation.in_set(SimulationSet::Advance));
    }
}

fn report(summary: &RunSummary, print_summary: bool) {
    if summary.termination.is_success() {
        info!(
            "Run finished: {} steps, t = {}, {} collisions, final ΔE/E₀ = {:e}, {:.2}s wall clock",
            summary.steps,
            summary.simulated_time,
            summary.counters.collisions,
            summary.final_relative_deviation,
            summary.wall_clock_seconds
        );
    } else {
        error!("Run failed: {:?}", summary.termination);
    }

    if print_summary {
        match summary.to_toml() {
            Ok(text) => println!("{text}"),
            Err(e) => error!("Failed to serialize run summary to TOML: {}", e),
        }
    }
}

fn start_simulation(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    settings: Res<DriverSettings>,
    mut summary: ResMut<FinalSummary>,
    mut exit: EventWriter<AppExit>,
) {
    match Simulation::new(config.clone()) {
        Ok(simulation) => {
            info!(
                "Simulation ready with {} worker thread(s)",
                simulation.worker_threads()
            );
            commands.insert_resource(ActiveSimulation(simulation));
        }
        Err(failure) => {
            let result = RunSummary::not_started(failure);
            report(&result, settings.print_summary);
            summary.0 = Some(result);
            exit.write(AppExit::error());
        }
    }
}

fn advance_simulation(
    mut commands: Commands,
    simulation: Option<ResMut<ActiveSimulation>>,
    settings: Res<DriverSettings>,
    mut log: ResMut<SnapshotLog>,
    mut summary: ResMut<FinalSummary>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(mut simulation) = simulation else {
        return;
    };

    for _ in 0..settings.cycles_per_update {
        if let RunState::Terminated(_) = simulation.0.advance(&mut *log) {
            break;
        }
    }

    if let Some(result) = simulation.0.summary() {
        let success = result.termination.is_success();
        report(&result, settings.print_summary);
        summary.0 = Some(result);
        commands.remove_resource::<ActiveSimulation>();
        exit.write(if success {
            AppExit::Success
        } else {
            AppExit::error()
        });
    }
}
