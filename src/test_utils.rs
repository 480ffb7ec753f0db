//! Helpers shared by unit tests, integration tests and benchmarks

use bevy::prelude::*;

use crate::config::{ParticleSpec, SimulationConfig};
use crate::physics::manifold::Manifold;
use crate::physics::math::{PI, Scalar, TAU};
use crate::physics::particle::{Particle, ParticleId};
use crate::simulation::ParticleSample;

/// Creates a minimal headless app with the plugins the driver relies on
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, bevy::diagnostic::DiagnosticsPlugin));
    app
}

/// `count` coordinates spread evenly over `[0, 2π)`.
pub fn evenly_spaced(count: usize) -> impl Iterator<Item = Scalar> {
    (0..count).map(move |i| TAU * i as Scalar / count as Scalar)
}

/// Evenly spaced unit-mass particles with alternating, varied velocities.
pub fn ring_of_particles(count: usize, radius: Scalar, speed: Scalar) -> Vec<Particle> {
    evenly_spaced(count)
        .enumerate()
        .map(|(i, coordinate)| {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let velocity = sign * speed * (0.5 + 0.5 * libm::sin(1.7 * i as Scalar).abs());
            Particle::new(ParticleId(i), 1.0, radius, coordinate, velocity)
        })
        .collect()
}

/// Two equal particles at `φ = 0` and `φ = π` heading towards each other on
/// the `a = 2, b = 1` ellipse, radius 0.05, `φ̇ = ±0.5`.
pub fn head_on_pair_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.seed = Some(0);
    config.particles.radius = 0.05;
    config.particles.explicit = vec![
        ParticleSpec {
            coordinate: 0.0,
            velocity: 0.5,
            mass: None,
            radius: None,
        },
        ParticleSpec {
            coordinate: PI,
            velocity: -0.5,
            mass: None,
            radius: None,
        },
    ];
    config.integration.max_time = 10.0;
    config.integration.snapshot_interval = 1.0;
    config.parallel.worker_threads = 1;
    config
}

/// A seeded random gas of `count` particles.
pub fn random_gas_config(count: usize, seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.seed = Some(seed);
    config.particles.count = count;
    config.particles.radius = 0.01;
    config.particles.velocity_range = [-1.0, 1.0];
    config.integration.max_time = 2.0;
    config.integration.snapshot_interval = 0.25;
    config
}

/// Smallest surface gap over all pairs, periodic-aware.
pub fn min_surface_gap(particles: &[Particle], manifold: &dyn Manifold) -> Scalar {
    let mut smallest = Scalar::INFINITY;
    for (i, first) in particles.iter().enumerate() {
        for second in &particles[i + 1..] {
            let gap = manifold.intrinsic_distance(first.coordinate(), second.coordinate())
                - (first.radius + second.radius);
            smallest = smallest.min(gap);
        }
    }
    smallest
}

/// Same as [`min_surface_gap`] for snapshot samples of equal-radius particles.
pub fn min_sample_gap(samples: &[ParticleSample], radius: Scalar, manifold: &dyn Manifold) -> Scalar {
    let mut smallest = Scalar::INFINITY;
    for (i, first) in samples.iter().enumerate() {
        for second in &samples[i + 1..] {
            let gap =
                manifold.intrinsic_distance(first.coordinate, second.coordinate) - 2.0 * radius;
            smallest = smallest.min(gap);
        }
    }
    smallest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::manifold::Circle;

    #[test]
    fn test_create_test_app() {
        let app = create_test_app();
        assert!(app.world().contains_resource::<Time>());
        assert!(
            app.world()
                .contains_resource::<bevy::diagnostic::DiagnosticsStore>()
        );
    }

    #[test]
    fn test_evenly_spaced_coordinates() {
        let coordinates: Vec<Scalar> = evenly_spaced(4).collect();
        assert_eq!(coordinates, vec![0.0, 0.5 * PI, PI, 1.5 * PI]);
    }

    #[test]
    fn test_min_surface_gap_on_circle() {
        let circle = Circle::new(1.0).unwrap();
        let particles = ring_of_particles(4, 0.1, 1.0);
        let gap = min_surface_gap(&particles, &circle);
        assert!((gap - (0.5 * PI - 0.2)).abs() < 1e-12);
    }
}
