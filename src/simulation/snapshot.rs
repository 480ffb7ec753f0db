//! Time-ordered output of a run

use crate::config::IntegrationConfig;
use crate::physics::math::Scalar;
use crate::physics::particle::{Particle, ParticleId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSample {
    pub id: ParticleId,
    pub coordinate: Scalar,
    pub velocity: Scalar,
}

impl From<&Particle> for ParticleSample {
    fn from(particle: &Particle) -> Self {
        Self {
            id: particle.id,
            coordinate: particle.coordinate(),
            velocity: particle.velocity,
        }
    }
}

/// The system at one instant, with running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: Scalar,
    pub step: u64,
    pub particles: Vec<ParticleSample>,
    pub collisions: u64,
    pub energy: Scalar,
    /// `|E − E₀| / E₀`
    pub relative_energy_deviation: Scalar,
}

/// Consumer of snapshots as a run produces them.
pub trait SnapshotSink {
    fn record(&mut self, snapshot: Snapshot);
}

/// Keeps every snapshot in memory, allocated up front for a full run.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuffer {
    snapshots: Vec<Snapshot>,
}

impl SnapshotBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(capacity),
        }
    }

    /// Sized for the snapshot count a run with these settings emits.
    pub fn for_run(integration: &IntegrationConfig) -> Self {
        Self::with_capacity(integration.expected_snapshots())
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn into_inner(self) -> Vec<Snapshot> {
        self.snapshots
    }
}

impl SnapshotSink for SnapshotBuffer {
    fn record(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }
}

/// Streams snapshots into a closure.
pub struct CallbackSink<F>(pub F);

impl<F: FnMut(Snapshot)> SnapshotSink for CallbackSink<F> {
    fn record(&mut self, snapshot: Snapshot) {
        (self.0)(snapshot);
    }
}
