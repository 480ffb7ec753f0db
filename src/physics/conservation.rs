//! Energy bookkeeping and drift projection

use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::particle::Particle;
use bevy::log::{debug, warn};

/// `E = Σ ½·mᵢ·g(φᵢ)·φ̇ᵢ²`
pub fn total_energy(particles: &[Particle], manifold: &dyn Manifold) -> Scalar {
    particles
        .iter()
        .map(|particle| particle.kinetic_energy(manifold))
        .sum()
}

/// `Σ mᵢ·√g(φᵢ)·φ̇ᵢ`
pub fn total_momentum(particles: &[Particle], manifold: &dyn Manifold) -> Scalar {
    particles
        .iter()
        .map(|particle| particle.momentum(manifold))
        .sum()
}

/// `|E − E₀| / E₀`, or the absolute deviation when `E₀` is zero.
pub fn relative_deviation(energy: Scalar, reference: Scalar) -> Scalar {
    let deviation = (energy - reference).abs();
    if reference.abs() > 0.0 {
        deviation / reference.abs()
    } else {
        deviation
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionOutcome {
    /// The energy was already close enough to the reference; nothing changed.
    WithinTolerance { deviation: Scalar },
    /// Every velocity was multiplied by `factor`.
    Rescaled { factor: Scalar, deviation: Scalar },
    /// The current energy is too close to zero for a rescale factor to exist.
    Skipped { energy: Scalar },
}

/// Parameters of [`project`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSettings {
    pub tolerance: Scalar,
    /// Energies at or below this are treated as zero.
    pub degenerate_energy: Scalar,
}

/// Pull the total energy back onto `reference` with one global velocity scale.
///
/// If `|E − E₀|/E₀` exceeds the tolerance every `φ̇` is multiplied by
/// `√(E₀/E)`. Positions and velocity ratios are untouched, so this removes
/// accumulated round-off drift without reshaping the dynamics. A second call
/// right after a rescale finds the energy within tolerance and does nothing.
pub fn project(
    particles: &mut [Particle],
    manifold: &dyn Manifold,
    reference: Scalar,
    settings: &ProjectionSettings,
) -> ProjectionOutcome {
    let energy = total_energy(particles, manifold);
    let deviation = relative_deviation(energy, reference);

    if deviation <= settings.tolerance {
        return ProjectionOutcome::WithinTolerance { deviation };
    }

    if energy <= settings.degenerate_energy || reference <= settings.degenerate_energy {
        warn!(
            "Skipping energy projection: E = {:e} is degenerate (E₀ = {:e})",
            energy, reference
        );
        return ProjectionOutcome::Skipped { energy };
    }

    let factor = libm::sqrt(reference / energy);
    for particle in particles.iter_mut() {
        particle.velocity *= factor;
    }

    debug!(
        "Projected energy drift {:e} away with velocity scale {}",
        deviation, factor
    );

    ProjectionOutcome::Rescaled { factor, deviation }
}
