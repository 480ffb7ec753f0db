pub mod diagnostics;
pub mod simulation;

pub use diagnostics::SimulationDiagnosticsPlugin;
pub use simulation::{
    ActiveSimulation, DriverSettings, FinalSummary, SimulationPlugin, SimulationSet, SnapshotLog,
};
