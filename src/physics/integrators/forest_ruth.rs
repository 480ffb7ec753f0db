//! Forest–Ruth fourth-order composition for geodesic flow
//!
//! The geodesic vector field splits into a drift, `φ' = φ̇` with `φ̇` frozen,
//! and a kick, `φ̇' = −Γ(φ)·φ̇²` with `φ` frozen. Both pieces have closed-form
//! flows, and the Forest–Ruth triple-jump composition of exact sub-flows is
//! time-reversible and fourth-order accurate.

use super::Integrator;
use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;

/// Sub-step weights of a drift–kick composition.
///
/// `drift[k]` scales `dt·φ̇` for the k-th coordinate update, `kick[k]` scales
/// `dt` for the k-th velocity update; kicks sit between consecutive drifts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestRuthCoefficients {
    pub drift: [Scalar; 4],
    pub kick: [Scalar; 3],
}

/// `θ = 1 / (2 − 2^{1/3})`
const THETA: Scalar = 1.351_207_191_959_657_8;

impl ForestRuthCoefficients {
    pub const STANDARD: ForestRuthCoefficients = ForestRuthCoefficients {
        drift: [
            0.5 * THETA,
            0.5 * (1.0 - THETA),
            0.5 * (1.0 - THETA),
            0.5 * THETA,
        ],
        kick: [THETA, 1.0 - 2.0 * THETA, THETA],
    };
}

/// Forest–Ruth integrator - a 4th order composition method
///
/// Seven alternating stages with palindromic weights:
///
/// ```text
/// Stage 1: φ += θ/2 · φ̇ · dt
/// Stage 2: φ̇ ← kick(φ, φ̇, θ · dt)
/// Stage 3: φ += (1−θ)/2 · φ̇ · dt
/// Stage 4: φ̇ ← kick(φ, φ̇, (1−2θ) · dt)      (the negative back-step)
/// Stage 5: φ += (1−θ)/2 · φ̇ · dt
/// Stage 6: φ̇ ← kick(φ, φ̇, θ · dt)
/// Stage 7: φ += θ/2 · φ̇ · dt
/// ```
///
/// Each kick evaluates the Christoffel symbol at the freshly drifted
/// coordinate and applies the exact solution of `φ̇' = −Γ·φ̇²` at fixed `φ`:
///
/// ```text
/// φ̇ ← φ̇ / (1 + Γ(φ)·φ̇·τ)
/// ```
///
/// # Mathematical Properties
///
/// - **Order of accuracy**: O(dt⁴) global error
/// - **Christoffel evaluations**: 3 per timestep
/// - **Time-reversible**: Yes - the weights read identically in both directions
/// - **Energy behavior**: bounded oscillation for the closed geodesic orbits
///   of a loop, no secular drift
///
/// On a manifold with `Γ ≡ 0` every kick is the identity and the drifts sum to
/// a single `φ̇·dt`, so constant-velocity motion is reproduced exactly.
///
/// # Reference
///
/// Forest, Ruth (1990) "Fourth-order symplectic integration", Physica D 43(1),
/// 105-117. DOI: 10.1016/0167-2789(90)90019-L
#[derive(Debug, Clone, Copy)]
pub struct ForestRuth {
    coefficients: ForestRuthCoefficients,
}

impl ForestRuth {
    pub fn new() -> Self {
        Self {
            coefficients: ForestRuthCoefficients::STANDARD,
        }
    }

    pub fn coefficients(&self) -> &ForestRuthCoefficients {
        &self.coefficients
    }

    #[inline]
    fn kick(christoffel: Scalar, velocity: Scalar, tau: Scalar) -> Scalar {
        let denominator = 1.0 + christoffel * velocity * tau;
        if denominator > 0.0 {
            velocity / denominator
        } else {
            // The exact flow blows up within tau; take the first-order step instead.
            velocity - christoffel * velocity * velocity * tau
        }
    }
}

impl Default for ForestRuth {
    fn default() -> Self {
        Self::new()
    }
}

impl Integrator for ForestRuth {
    fn step(
        &self,
        coordinate: &mut Scalar,
        velocity: &mut Scalar,
        manifold: &dyn Manifold,
        dt: Scalar,
    ) {
        let ForestRuthCoefficients { drift, kick } = self.coefficients;

        *coordinate += drift[0] * *velocity * dt;

        for stage in 0..kick.len() {
            let christoffel = manifold.christoffel(*coordinate);
            *velocity = Self::kick(christoffel, *velocity, kick[stage] * dt);
            *coordinate += drift[stage + 1] * *velocity * dt;
        }
    }

    fn name(&self) -> &'static str {
        "forest_ruth"
    }

    fn convergence_order(&self) -> usize {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::manifold::{Circle, Ellipse};
    use crate::physics::math::{angular_difference, wrap_coordinate};

    #[test]
    fn test_coefficients_are_consistent() {
        let ForestRuthCoefficients { drift, kick } = ForestRuthCoefficients::STANDARD;
        assert!((drift.iter().sum::<Scalar>() - 1.0).abs() < 1e-15);
        assert!((kick.iter().sum::<Scalar>() - 1.0).abs() < 1e-15);
        assert!(kick[1] < 0.0, "The middle kick is the backward sub-step");
        assert!(drift[1] < 0.0);
        assert!(((2.0 - libm::cbrt(2.0)) * THETA - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_circle_motion_is_uniform() {
        let circle = Circle::new(1.0).unwrap();
        let integrator = ForestRuth::new();
        let (mut phi, mut phi_dot) = (0.3, 0.7);

        for _ in 0..1000 {
            integrator.step(&mut phi, &mut phi_dot, &circle, 0.01);
        }

        assert_eq!(phi_dot, 0.7, "φ̇ must be untouched where Γ ≡ 0");
        assert!((phi - (0.3 + 7.0)).abs() < 1e-10);
    }

    #[test]
    fn test_ellipse_energy_is_bounded() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let integrator = ForestRuth::new();
        let (mut phi, mut phi_dot) = (0.1, 1.0);
        let energy = |phi: Scalar, phi_dot: Scalar| 0.5 * ellipse.metric(phi) * phi_dot * phi_dot;
        let initial = energy(phi, phi_dot);

        let mut worst: Scalar = 0.0;
        for _ in 0..20_000 {
            integrator.step(&mut phi, &mut phi_dot, &ellipse, 0.01);
            phi = wrap_coordinate(phi);
            worst = worst.max(((energy(phi, phi_dot) - initial) / initial).abs());
        }

        assert!(worst < 1e-5, "Energy error too large: {worst:e}");
    }

    #[test]
    fn test_arc_length_advances_at_constant_speed() {
        // Geodesics on a curve are unit-speed reparametrizations: s(t) = s₀ + v·t.
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let integrator = ForestRuth::new();
        let (mut phi, mut phi_dot) = (0.4, 0.8);
        let speed = ellipse.speed_factor(phi) * phi_dot;
        let start = ellipse.arc_length_to(phi);

        let dt = 0.005;
        let steps = 1000;
        for _ in 0..steps {
            integrator.step(&mut phi, &mut phi_dot, &ellipse, dt);
        }

        let expected = ellipse.coordinate_at_arc_length(start + speed * dt * steps as Scalar);
        let error = angular_difference(expected, wrap_coordinate(phi)).abs();
        assert!(error < 1e-5, "Geodesic position error {error:e}");
    }

    #[test]
    fn test_fourth_order_convergence() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let integrator = ForestRuth::new();
        let (phi0, phi_dot0) = (0.2, 1.0);
        let final_time = 4.0;

        let speed = ellipse.speed_factor(phi0) * phi_dot0;
        let exact = ellipse.coordinate_at_arc_length(ellipse.arc_length_to(phi0) + speed * final_time);

        let error_for = |dt: Scalar| {
            let (mut phi, mut phi_dot) = (phi0, phi_dot0);
            let steps = (final_time / dt).round() as usize;
            for _ in 0..steps {
                integrator.step(&mut phi, &mut phi_dot, &ellipse, dt);
            }
            angular_difference(exact, wrap_coordinate(phi)).abs()
        };

        let coarse = error_for(0.05);
        let fine = error_for(0.025);
        assert!(
            coarse / fine > 8.0,
            "Halving dt should shrink the error ~16x, got {coarse:e} -> {fine:e}"
        );
    }
}
