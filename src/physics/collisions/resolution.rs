//! Instantaneous elastic collisions in tangent-space velocity

use super::closing_speed;
use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::particle::Particle;

/// 1D elastic collision of two point masses with linear velocities `v1`, `v2`.
///
/// Equal masses swap velocities exactly instead of going through the general
/// formula, which would round.
pub fn elastic_exchange(m1: Scalar, v1: Scalar, m2: Scalar, v2: Scalar) -> (Scalar, Scalar) {
    if m1 == m2 {
        return (v2, v1);
    }

    let total = m1 + m2;
    (
        ((m1 - m2) * v1 + 2.0 * m2 * v2) / total,
        ((m2 - m1) * v2 + 2.0 * m1 * v1) / total,
    )
}

/// Post-collision generalized velocities `(φ̇ᵢ', φ̇ⱼ')` for a pair in contact.
///
/// The exchange happens on the tangent speeds `v = √g(φ)·φ̇`, which are the
/// quantities that carry kinetic energy and momentum at each contact point,
/// and is mapped back with `φ̇' = v'/√g(φ)`. Coordinates are not touched.
///
/// Returns `None` if the pair is not approaching: resolving an already
/// separating pair is a no-op.
pub fn resolve(
    first: &Particle,
    second: &Particle,
    manifold: &dyn Manifold,
) -> Option<(Scalar, Scalar)> {
    if closing_speed(first, second, manifold) <= 0.0 {
        return None;
    }

    let first_scale = manifold.speed_factor(first.coordinate());
    let second_scale = manifold.speed_factor(second.coordinate());

    let (first_speed, second_speed) = elastic_exchange(
        first.mass,
        first_scale * first.velocity,
        second.mass,
        second_scale * second.velocity,
    );

    Some((first_speed / first_scale, second_speed / second_scale))
}

/// Resolve the collision between `particles[i]` and `particles[j]` in place.
///
/// Returns whether velocities changed.
pub fn apply_collision(
    particles: &mut [Particle],
    i: usize,
    j: usize,
    manifold: &dyn Manifold,
) -> bool {
    match resolve(&particles[i], &particles[j], manifold) {
        Some((first, second)) => {
            particles[i].velocity = first;
            particles[j].velocity = second;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::manifold::Ellipse;
    use crate::physics::particle::ParticleId;

    #[test]
    fn test_equal_masses_swap_exactly() {
        assert_eq!(elastic_exchange(2.0, 0.7, 2.0, -0.3), (-0.3, 0.7));
    }

    #[test]
    fn test_unequal_masses_conserve_energy_and_momentum() {
        let (m1, v1, m2, v2) = (1.0, 2.0, 3.0, -0.5);
        let (u1, u2) = elastic_exchange(m1, v1, m2, v2);

        let momentum = m1 * v1 + m2 * v2;
        let energy = 0.5 * m1 * v1 * v1 + 0.5 * m2 * v2 * v2;
        assert!((m1 * u1 + m2 * u2 - momentum).abs() < 1e-14);
        assert!((0.5 * m1 * u1 * u1 + 0.5 * m2 * u2 * u2 - energy).abs() < 1e-14);
    }

    #[test]
    fn test_resolve_conserves_pair_invariants_on_ellipse() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let first = Particle::new(ParticleId(0), 1.0, 0.05, 1.0, 0.8);
        let second = Particle::new(ParticleId(1), 2.5, 0.05, 1.1, -0.4);

        let (u1, u2) = resolve(&first, &second, &ellipse).expect("Pair is approaching");
        let mut after = [first, second];
        after[0].velocity = u1;
        after[1].velocity = u2;

        let energy = |pair: &[Particle]| -> Scalar {
            pair.iter().map(|p| p.kinetic_energy(&ellipse)).sum()
        };
        let momentum = |pair: &[Particle]| -> Scalar {
            pair.iter().map(|p| p.momentum(&ellipse)).sum()
        };

        assert!((energy(&after) - energy(&[first, second])).abs() < 1e-14);
        assert!((momentum(&after) - momentum(&[first, second])).abs() < 1e-14);
        assert_eq!(after[0].coordinate(), first.coordinate());
        assert_eq!(after[1].coordinate(), second.coordinate());
    }

    #[test]
    fn test_equal_masses_exchange_tangent_speeds() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let first = Particle::new(ParticleId(0), 1.0, 0.05, 0.3, 0.6);
        let second = Particle::new(ParticleId(1), 1.0, 0.05, 0.4, -0.2);

        let (u1, u2) = resolve(&first, &second, &ellipse).expect("Pair is approaching");
        let v1 = ellipse.speed_factor(first.coordinate()) * u1;
        let v2 = ellipse.speed_factor(second.coordinate()) * u2;

        assert!((v1 - second.tangent_speed(&ellipse)).abs() < 1e-14);
        assert!((v2 - first.tangent_speed(&ellipse)).abs() < 1e-14);
    }

    #[test]
    fn test_second_resolution_is_a_no_op() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let mut particles = [
            Particle::new(ParticleId(0), 1.0, 0.05, 2.0, 0.5),
            Particle::new(ParticleId(1), 1.5, 0.05, 2.1, -0.5),
        ];

        assert!(apply_collision(&mut particles, 0, 1, &ellipse));
        let resolved = particles;
        assert!(
            !apply_collision(&mut particles, 0, 1, &ellipse),
            "A separating pair must not collide again"
        );
        assert_eq!(particles, resolved);
    }
}
