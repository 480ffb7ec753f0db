//! Initial conditions: rejection-sampled, non-overlapping particle placement

use crate::config::{ParticlesConfig, Placement};
use crate::error::SimulationError;
use crate::physics::manifold::Manifold;
use crate::physics::math::{Scalar, TAU};
use crate::physics::particle::{Particle, ParticleId};
use crate::resources::SharedRng;
use rand::Rng;

fn sample_range(rng: &mut SharedRng, [low, high]: [Scalar; 2]) -> Scalar {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}

fn overlaps(manifold: &dyn Manifold, placed: &[Particle], coordinate: Scalar, radius: Scalar) -> bool {
    placed
        .iter()
        .any(|other| manifold.intrinsic_distance(coordinate, other.coordinate()) <= radius + other.radius)
}

/// Build the initial particle set described by `config`.
///
/// Explicit particles are taken as given and only checked for overlap.
/// Otherwise candidates are drawn one at a time and rejected if they touch an
/// already placed particle; the whole placement shares a budget of
/// `max_placement_attempts` draws. Every random value comes from `rng` in a
/// fixed order, so a seeded generator reproduces the same particles.
pub fn place_particles(
    config: &ParticlesConfig,
    manifold: &dyn Manifold,
    rng: &mut SharedRng,
) -> Result<Vec<Particle>, SimulationError> {
    if !config.explicit.is_empty() {
        return place_explicit(config, manifold);
    }

    let requested = config.count;
    let mut particles = Vec::with_capacity(requested);
    let mut attempts = 0;

    while particles.len() < requested {
        if attempts == config.max_placement_attempts {
            return Err(SimulationError::InitializationFailure {
                placed: particles.len(),
                requested,
                attempts,
            });
        }
        attempts += 1;

        let coordinate = match config.placement {
            Placement::Coordinate => rng.random_range(0.0..TAU),
            Placement::ArcLength => {
                let perimeter = manifold.perimeter();
                manifold.coordinate_at_arc_length(rng.random_range(0.0..perimeter))
            }
        };
        if overlaps(manifold, &particles, coordinate, config.radius) {
            continue;
        }

        let mass = match config.mass_range {
            Some(range) => sample_range(rng, range),
            None => config.mass,
        };
        let velocity = sample_range(rng, config.velocity_range);

        particles.push(Particle::new(
            ParticleId(particles.len()),
            mass,
            config.radius,
            coordinate,
            velocity,
        ));
    }

    Ok(particles)
}

fn place_explicit(
    config: &ParticlesConfig,
    manifold: &dyn Manifold,
) -> Result<Vec<Particle>, SimulationError> {
    let mut particles: Vec<Particle> = Vec::with_capacity(config.explicit.len());

    for (index, spec) in config.explicit.iter().enumerate() {
        let radius = spec.radius.unwrap_or(config.radius);
        if overlaps(manifold, &particles, spec.coordinate, radius) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "explicit particle {index} at φ = {} overlaps an earlier particle",
                spec.coordinate
            )));
        }
        particles.push(Particle::new(
            ParticleId(index),
            spec.mass.unwrap_or(config.mass),
            radius,
            spec.coordinate,
            spec.velocity,
        ));
    }

    Ok(particles)
}
