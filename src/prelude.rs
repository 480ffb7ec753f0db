//! Geodrift prelude module
//!
//! This module re-exports the most commonly used types, traits, and functions
//! to reduce import boilerplate in drivers and tests.

// Internal re-exports - Config
pub use crate::config::{ManifoldConfig, ParticleSpec, Placement, SimulationConfig};

// Internal re-exports - Errors
pub use crate::error::{DivergenceReason, SimulationError};

// Internal re-exports - Resources
pub use crate::resources::{SharedRng, WorkerPool};

// Internal re-exports - Physics
pub use crate::physics::collisions::{CollisionEvent, PairSearch, PredictorSettings};
pub use crate::physics::conservation::{relative_deviation, total_energy, total_momentum};
pub use crate::physics::integrators::{ForestRuth, Integrator};
pub use crate::physics::manifold::{Circle, Ellipse, Manifold};
pub use crate::physics::math::{Scalar, Vector};
pub use crate::physics::particle::{Particle, ParticleId};

// Internal re-exports - Simulation
pub use crate::simulation::{
    CompletionReason, RunCounters, RunState, RunSummary, Simulation, SimulationState, Snapshot,
    SnapshotBuffer, SnapshotSink, Termination, run_simulation,
};
