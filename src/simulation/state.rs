use crate::physics::conservation::{relative_deviation, total_energy};
use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::particle::Particle;
use serde::{Deserialize, Serialize};

/// Everything needed to continue a run: particles in index order, the clock,
/// and the reference energy `E₀` fixed at `t = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub particles: Vec<Particle>,
    pub time: Scalar,
    pub initial_energy: Scalar,
    pub step: u64,
}

impl SimulationState {
    pub fn new(particles: Vec<Particle>, manifold: &dyn Manifold) -> Self {
        let initial_energy = total_energy(&particles, manifold);
        Self {
            particles,
            time: 0.0,
            initial_energy,
            step: 0,
        }
    }

    pub fn energy(&self, manifold: &dyn Manifold) -> Scalar {
        total_energy(&self.particles, manifold)
    }

    /// `|E − E₀| / E₀`
    pub fn relative_energy_deviation(&self, manifold: &dyn Manifold) -> Scalar {
        relative_deviation(self.energy(manifold), self.initial_energy)
    }

    /// Write the state as TOML so a later run can pick it up with
    /// [`crate::simulation::Simulation::resume`].
    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
