//! Ellipse with semi-axes `a` (along x) and `b` (along y)

use super::{ArcLengthTable, Manifold, RadialProfile};
use crate::error::SimulationError;
use crate::physics::math::Scalar;

/// Ellipse `x²/a² + y²/b² = 1` in polar parametrization.
///
/// With `D(φ) = b²cos²φ + a²sin²φ` the radius is `r = ab/√D`. `D` is bounded
/// below by `min(a², b²)`, so the profile stays finite at the axis extrema
/// where `dr/dφ` vanishes.
#[derive(Debug, Clone)]
pub struct Ellipse {
    a: Scalar,
    b: Scalar,
    arc_lengths: ArcLengthTable,
}

impl Ellipse {
    pub fn new(a: Scalar, b: Scalar) -> Result<Self, SimulationError> {
        if !(a.is_finite() && a > 0.0 && b.is_finite() && b > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "ellipse semi-axes must be positive and finite (a = {a}, b = {b})"
            )));
        }

        let arc_lengths = ArcLengthTable::build(|phi| libm::sqrt(Self::profile(a, b, phi).metric()));

        Ok(Self { a, b, arc_lengths })
    }

    pub fn semi_axes(&self) -> (Scalar, Scalar) {
        (self.a, self.b)
    }

    /// `√(1 − (minor/major)²)`, zero for a circle.
    pub fn eccentricity(&self) -> Scalar {
        let (major, minor) = if self.a >= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        };
        libm::sqrt(1.0 - (minor * minor) / (major * major))
    }

    fn profile(a: Scalar, b: Scalar, phi: Scalar) -> RadialProfile {
        let (sin, cos) = (libm::sin(phi), libm::cos(phi));
        let spread = a * a - b * b;

        let d = b * b * cos * cos + a * a * sin * sin;
        let d_prime = spread * 2.0 * sin * cos;
        let d_second = 2.0 * spread * (cos * cos - sin * sin);

        let radius = a * b / libm::sqrt(d);
        let ratio = d_prime / d;

        RadialProfile {
            radius,
            radius_derivative: -0.5 * radius * ratio,
            radius_second_derivative: radius * (0.75 * ratio * ratio - 0.5 * d_second / d),
        }
    }
}

impl Manifold for Ellipse {
    fn name(&self) -> &'static str {
        "ellipse"
    }

    fn radial_profile(&self, phi: Scalar) -> RadialProfile {
        Self::profile(self.a, self.b, phi)
    }

    fn perimeter(&self) -> Scalar {
        self.arc_lengths.perimeter()
    }

    fn arc_length_to(&self, phi: Scalar) -> Scalar {
        self.arc_lengths
            .arc_length_to(phi, |x| libm::sqrt(Self::profile(self.a, self.b, x).metric()))
    }

    fn max_speed_factor(&self) -> Scalar {
        self.arc_lengths.max_speed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::math::{PI, TAU};

    const EXTREMA: [Scalar; 4] = [0.0, 0.5 * PI, PI, 1.5 * PI];

    fn numeric_derivative(f: impl Fn(Scalar) -> Scalar, x: Scalar) -> Scalar {
        let h = 1e-5;
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    #[test]
    fn test_rejects_degenerate_axes() {
        assert!(Ellipse::new(0.0, 1.0).is_err());
        assert!(Ellipse::new(1.0, -1.0).is_err());
        assert!(Ellipse::new(Scalar::NAN, 1.0).is_err());
    }

    #[test]
    fn test_radius_at_axes() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        assert!((ellipse.radius(0.0) - 2.0).abs() < 1e-14);
        assert!((ellipse.radius(0.5 * PI) - 1.0).abs() < 1e-14);
        assert!((ellipse.radius(PI) - 2.0).abs() < 1e-14);
        assert!((ellipse.radius(1.5 * PI) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_radius_derivatives_match_finite_differences() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        for phi in [0.2, 0.9, 2.0, 3.7, 5.5] {
            let profile = ellipse.radial_profile(phi);
            let dr = numeric_derivative(|x| ellipse.radius(x), phi);
            let d2r = numeric_derivative(|x| ellipse.radial_profile(x).radius_derivative, phi);
            assert!(
                (profile.radius_derivative - dr).abs() < 1e-8,
                "dr/dφ mismatch at {phi}: {} vs {dr}",
                profile.radius_derivative
            );
            assert!(
                (profile.radius_second_derivative - d2r).abs() < 1e-7,
                "d²r/dφ² mismatch at {phi}: {} vs {d2r}",
                profile.radius_second_derivative
            );
        }
    }

    #[test]
    fn test_christoffel_is_half_log_metric_derivative() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        for phi in [0.3, 1.1, 2.5, 4.4] {
            let dg = numeric_derivative(|x| ellipse.metric(x), phi);
            let expected = 0.5 * dg / ellipse.metric(phi);
            assert!((ellipse.christoffel(phi) - expected).abs() < 1e-8);
        }
    }

    #[test]
    fn test_extrema_are_stable() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        for phi in EXTREMA {
            let profile = ellipse.radial_profile(phi);
            assert!(profile.radius_derivative.abs() < 1e-14);
            assert!(ellipse.christoffel(phi).abs() < 1e-14);
            assert!(ellipse.curvature(phi).is_finite());
        }
        // Vertex curvature: a/b² at φ = 0, b/a² at φ = π/2
        assert!((ellipse.curvature(0.0) - 2.0).abs() < 1e-12);
        assert!((ellipse.curvature(0.5 * PI) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_embedding_satisfies_constraint() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        for step in 0..100 {
            let phi = TAU * step as Scalar / 100.0;
            let point = ellipse.embed(phi);
            let constraint = point.x * point.x / 4.0 + point.y * point.y;
            assert!(
                (constraint - 1.0).abs() < 1e-14,
                "Constraint violated at φ = {phi}: {constraint}"
            );
        }
    }

    #[test]
    fn test_tangent_is_unit_and_orthogonal_to_gradient() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        for phi in [0.0, 0.7, 2.1, 4.0] {
            let tangent = ellipse.tangent(phi);
            let point = ellipse.embed(phi);
            let gradient = bevy::math::DVec2::new(point.x / 4.0, point.y);
            assert!((tangent.length() - 1.0).abs() < 1e-14);
            assert!(tangent.dot(gradient).abs() < 1e-12);
        }
    }

    #[test]
    fn test_perimeter_matches_ramanujan() {
        let (a, b) = (2.0, 1.0);
        let ellipse = Ellipse::new(a, b).unwrap();
        let h = ((a - b) / (a + b)) * ((a - b) / (a + b));
        let ramanujan = PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
        assert!(
            (ellipse.perimeter() - ramanujan).abs() < 1e-6,
            "perimeter {} vs Ramanujan {ramanujan}",
            ellipse.perimeter()
        );
    }

    #[test]
    fn test_quarter_arcs_are_equal() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let quarter = ellipse.arc_length_to(0.5 * PI);
        assert!((4.0 * quarter - ellipse.perimeter()).abs() < 1e-12);
        assert!((ellipse.arc_length_to(PI) - 2.0 * quarter).abs() < 1e-12);
    }

    #[test]
    fn test_eccentricity() {
        assert_eq!(Ellipse::new(1.0, 1.0).unwrap().eccentricity(), 0.0);
        let e = Ellipse::new(2.0, 1.0).unwrap().eccentricity();
        assert!((e - (0.75_f64).sqrt()).abs() < 1e-15);
    }
}
