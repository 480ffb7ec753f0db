//! Hard-sphere particles living on the manifold

use crate::physics::manifold::Manifold;
use crate::physics::math::{Scalar, Vector, wrap_coordinate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub usize);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One particle: mass, arc-length half-width, coordinate `φ` and generalized velocity `φ̇`.
///
/// The radius is measured along the curve, so two particles touch when their
/// intrinsic distance equals the sum of their radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    pub mass: Scalar,
    pub radius: Scalar,
    coordinate: Scalar,
    pub velocity: Scalar,
}

impl Particle {
    pub fn new(
        id: ParticleId,
        mass: Scalar,
        radius: Scalar,
        coordinate: Scalar,
        velocity: Scalar,
    ) -> Self {
        Self {
            id,
            mass,
            radius,
            coordinate: wrap_coordinate(coordinate),
            velocity,
        }
    }

    /// Coordinate in `[0, 2π)`.
    #[inline]
    pub fn coordinate(&self) -> Scalar {
        self.coordinate
    }

    #[inline]
    pub fn set_coordinate(&mut self, coordinate: Scalar) {
        self.coordinate = wrap_coordinate(coordinate);
    }

    /// Coordinate after moving for `dt` at the current generalized velocity.
    #[inline]
    pub fn extrapolated_coordinate(&self, dt: Scalar) -> Scalar {
        wrap_coordinate(self.coordinate + self.velocity * dt)
    }

    /// Physical speed along the curve, `√g(φ)·φ̇`.
    pub fn tangent_speed(&self, manifold: &dyn Manifold) -> Scalar {
        manifold.speed_factor(self.coordinate) * self.velocity
    }

    /// `½·m·g(φ)·φ̇²`
    pub fn kinetic_energy(&self, manifold: &dyn Manifold) -> Scalar {
        0.5 * self.mass * manifold.metric(self.coordinate) * self.velocity * self.velocity
    }

    /// Metric-weighted momentum `m·√g(φ)·φ̇`.
    pub fn momentum(&self, manifold: &dyn Manifold) -> Scalar {
        self.mass * self.tangent_speed(manifold)
    }

    /// Cartesian position of the particle centre.
    pub fn position(&self, manifold: &dyn Manifold) -> Vector {
        manifold.embed(self.coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::manifold::{Circle, Ellipse};
    use crate::physics::math::{PI, TAU};

    #[test]
    fn test_new_wraps_coordinate() {
        let particle = Particle::new(ParticleId(0), 1.0, 0.1, -0.5, 1.0);
        assert!((particle.coordinate() - (TAU - 0.5)).abs() < 1e-15);

        let particle = Particle::new(ParticleId(0), 1.0, 0.1, 2.0 * TAU + 1.0, 1.0);
        assert!((particle.coordinate() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolation_wraps() {
        let particle = Particle::new(ParticleId(1), 1.0, 0.1, TAU - 0.1, 1.0);
        assert!((particle.extrapolated_coordinate(0.2) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_energy_and_momentum_on_circle() {
        let circle = Circle::new(2.0).unwrap();
        let particle = Particle::new(ParticleId(0), 3.0, 0.1, 1.0, 0.5);
        // v = R·φ̇ = 1
        assert!((particle.tangent_speed(&circle) - 1.0).abs() < 1e-15);
        assert!((particle.kinetic_energy(&circle) - 1.5).abs() < 1e-15);
        assert!((particle.momentum(&circle) - 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_kinetic_energy_uses_local_metric() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let on_major = Particle::new(ParticleId(0), 1.0, 0.05, 0.0, 1.0);
        let on_minor = Particle::new(ParticleId(1), 1.0, 0.05, 0.5 * PI, 1.0);
        assert!(
            on_major.kinetic_energy(&ellipse) != on_minor.kinetic_energy(&ellipse),
            "Same φ̇ must carry different energy where the metric differs"
        );
        let expected = 0.5 * ellipse.metric(0.0);
        assert!((on_major.kinetic_energy(&ellipse) - expected).abs() < 1e-15);
    }
}
