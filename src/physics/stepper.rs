//! Free-flight advance of every particle between collision events

use crate::physics::integrators::Integrator;
use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::particle::Particle;
use crate::resources::WorkerPool;

/// Advance all particles along their geodesics for `dt`.
///
/// Particles do not interact in free flight, so each one is stepped on its own
/// copy of `(φ, φ̇)`; the copies are written back in index order once every
/// worker has finished. Coordinates come back wrapped to `[0, 2π)`.
pub fn advance_particles(
    particles: &mut [Particle],
    integrator: &dyn Integrator,
    manifold: &dyn Manifold,
    dt: Scalar,
    workers: &WorkerPool,
) {
    if dt <= 0.0 || particles.is_empty() {
        return;
    }

    let stepped: Vec<Vec<(Scalar, Scalar)>> = workers.map_chunks(particles, |chunk| {
        chunk
            .iter()
            .map(|particle| {
                let mut coordinate = particle.coordinate();
                let mut velocity = particle.velocity;
                integrator.step(&mut coordinate, &mut velocity, manifold, dt);
                (coordinate, velocity)
            })
            .collect()
    });

    for (particle, (coordinate, velocity)) in particles.iter_mut().zip(stepped.into_iter().flatten())
    {
        particle.set_coordinate(coordinate);
        particle.velocity = velocity;
    }
}
