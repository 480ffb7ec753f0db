//! Geometry of closed one-dimensional manifolds embedded in the plane
//!
//! A manifold is described in polar form, `x(φ) = r(φ)·(cos φ, sin φ)`, so
//! everything the dynamics needs (metric, Christoffel symbol, curvature, arc
//! length) follows from the radial profile `r, dr/dφ, d²r/dφ²`. Concrete
//! shapes only implement [`Manifold::radial_profile`] and the arc-length
//! queries; the stepper, predictor and resolver see nothing but this trait.

use crate::physics::math::{Scalar, TAU, Vector, gauss_legendre, wrap_coordinate, wrap_periodic};
use std::fmt;

pub mod circle;
pub mod ellipse;

pub use circle::Circle;
pub use ellipse::Ellipse;

/// Radius and its first two derivatives at one coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialProfile {
    pub radius: Scalar,
    pub radius_derivative: Scalar,
    pub radius_second_derivative: Scalar,
}

impl RadialProfile {
    /// Metric coefficient `g = (dr/dφ)² + r²`.
    #[inline]
    pub fn metric(&self) -> Scalar {
        self.radius_derivative * self.radius_derivative + self.radius * self.radius
    }

    /// `dg/dφ = 2·r'·(r + r'')`.
    #[inline]
    pub fn metric_derivative(&self) -> Scalar {
        2.0 * self.radius_derivative * (self.radius + self.radius_second_derivative)
    }

    /// Christoffel coefficient `Γ = r'·(r + r'') / g`, i.e. `g' / 2g`.
    #[inline]
    pub fn christoffel(&self) -> Scalar {
        self.radius_derivative * (self.radius + self.radius_second_derivative) / self.metric()
    }

    /// Extrinsic curvature of the embedded curve, `(r² + 2r'² − r·r'') / g^{3/2}`.
    #[inline]
    pub fn curvature(&self) -> Scalar {
        let g = self.metric();
        let numerator = self.radius * self.radius
            + 2.0 * self.radius_derivative * self.radius_derivative
            - self.radius * self.radius_second_derivative;
        numerator / (g * libm::sqrt(g))
    }
}

/// A closed curve parametrized by the periodic coordinate `φ ∈ [0, 2π)`.
///
/// Every method takes an already-wrapped coordinate unless noted; callers
/// wrap with [`wrap_coordinate`].
pub trait Manifold: Send + Sync + fmt::Debug {
    /// Short human-readable name of the shape.
    fn name(&self) -> &'static str;

    /// `r`, `dr/dφ` and `d²r/dφ²` at `phi`.
    fn radial_profile(&self, phi: Scalar) -> RadialProfile;

    /// Total arc length of the closed curve.
    fn perimeter(&self) -> Scalar;

    /// Arc length from `φ = 0` to `phi`, measured in the direction of increasing `φ`.
    fn arc_length_to(&self, phi: Scalar) -> Scalar;

    /// Upper bound on `√g` over the whole curve.
    fn max_speed_factor(&self) -> Scalar;

    fn radius(&self, phi: Scalar) -> Scalar {
        self.radial_profile(phi).radius
    }

    fn metric(&self, phi: Scalar) -> Scalar {
        self.radial_profile(phi).metric()
    }

    fn metric_derivative(&self, phi: Scalar) -> Scalar {
        self.radial_profile(phi).metric_derivative()
    }

    fn christoffel(&self, phi: Scalar) -> Scalar {
        self.radial_profile(phi).christoffel()
    }

    fn curvature(&self, phi: Scalar) -> Scalar {
        self.radial_profile(phi).curvature()
    }

    /// `√g`: converts a generalized velocity into a tangent speed.
    fn speed_factor(&self, phi: Scalar) -> Scalar {
        libm::sqrt(self.metric(phi))
    }

    /// Cartesian position of the coordinate in the embedding plane.
    fn embed(&self, phi: Scalar) -> Vector {
        let r = self.radius(phi);
        Vector::new(r * libm::cos(phi), r * libm::sin(phi))
    }

    /// Unit tangent in the direction of increasing `φ`.
    fn tangent(&self, phi: Scalar) -> Vector {
        let profile = self.radial_profile(phi);
        let (sin, cos) = (libm::sin(phi), libm::cos(phi));
        let derivative = Vector::new(
            profile.radius_derivative * cos - profile.radius * sin,
            profile.radius_derivative * sin + profile.radius * cos,
        );
        derivative / libm::sqrt(profile.metric())
    }

    /// Arc length travelled going from `from` to `to` with increasing `φ`.
    fn forward_arc(&self, from: Scalar, to: Scalar) -> Scalar {
        wrap_periodic(
            self.arc_length_to(wrap_coordinate(to)) - self.arc_length_to(wrap_coordinate(from)),
            self.perimeter(),
        )
    }

    /// Geodesic distance between two coordinates: the shorter of the two arcs.
    fn intrinsic_distance(&self, first: Scalar, second: Scalar) -> Scalar {
        let forward = self.forward_arc(first, second);
        forward.min(self.perimeter() - forward)
    }

    /// Inverse of [`Manifold::arc_length_to`]: the coordinate lying `arc_length`
    /// along the curve from `φ = 0`.
    fn coordinate_at_arc_length(&self, arc_length: Scalar) -> Scalar {
        const MAX_ITERATIONS: usize = 50;

        let perimeter = self.perimeter();
        let target = wrap_periodic(arc_length, perimeter);
        let mut phi = TAU * target / perimeter;

        for _ in 0..MAX_ITERATIONS {
            let mut residual = self.arc_length_to(phi) - target;
            if residual > 0.5 * perimeter {
                residual -= perimeter;
            } else if residual < -0.5 * perimeter {
                residual += perimeter;
            }
            if residual.abs() <= 1e-14 * perimeter {
                break;
            }
            phi = wrap_coordinate(phi - residual / self.speed_factor(phi));
        }

        phi
    }
}

/// Cumulative arc length sampled on a uniform grid in `φ`.
///
/// Queries add a single Gauss–Legendre panel from the nearest grid point
/// below, so lookups cost five metric evaluations and are smooth in `φ`.
#[derive(Debug, Clone)]
pub struct ArcLengthTable {
    panel_width: Scalar,
    cumulative: Vec<Scalar>,
    max_speed: Scalar,
}

impl ArcLengthTable {
    pub const PANELS: usize = 64;
    /// Grid points per panel when searching for the largest speed.
    const SPEED_SAMPLES_PER_PANEL: usize = 64;
    /// Covers the speed between grid points, where the sampled maximum can fall short.
    const SPEED_MARGIN: Scalar = 1.001;

    /// Build the table for the speed function `√g(φ)`.
    pub fn build<F>(speed: F) -> Self
    where
        F: Fn(Scalar) -> Scalar,
    {
        let panel_width = TAU / Self::PANELS as Scalar;
        let mut cumulative = Vec::with_capacity(Self::PANELS + 1);
        cumulative.push(0.0);

        let mut total = 0.0;
        for panel in 0..Self::PANELS {
            let start = panel as Scalar * panel_width;
            total += gauss_legendre(&speed, start, start + panel_width);
            cumulative.push(total);
        }

        let grid = Self::PANELS * Self::SPEED_SAMPLES_PER_PANEL;
        let max_speed = (0..grid)
            .map(|k| speed(TAU * k as Scalar / grid as Scalar))
            .fold(0.0, Scalar::max)
            * Self::SPEED_MARGIN;

        Self {
            panel_width,
            cumulative,
            max_speed,
        }
    }

    pub fn perimeter(&self) -> Scalar {
        self.cumulative[Self::PANELS]
    }

    /// Largest `√g` on the curve, rounded up slightly.
    pub fn max_speed(&self) -> Scalar {
        self.max_speed
    }

    /// Arc length from zero to the wrapped coordinate `phi`.
    pub fn arc_length_to<F>(&self, phi: Scalar, speed: F) -> Scalar
    where
        F: Fn(Scalar) -> Scalar,
    {
        let phi = wrap_coordinate(phi);
        let panel = ((phi / self.panel_width) as usize).min(Self::PANELS - 1);
        let start = panel as Scalar * self.panel_width;
        self.cumulative[panel] + gauss_legendre(speed, start, phi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::math::PI;

    #[test]
    fn test_profile_of_circle_has_no_christoffel() {
        let profile = RadialProfile {
            radius: 2.0,
            radius_derivative: 0.0,
            radius_second_derivative: 0.0,
        };
        assert_eq!(profile.metric(), 4.0);
        assert_eq!(profile.christoffel(), 0.0);
        assert_eq!(profile.metric_derivative(), 0.0);
        assert!((profile.curvature() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_arc_length_table_for_constant_speed() {
        let table = ArcLengthTable::build(|_| 3.0);
        assert!((table.perimeter() - 3.0 * TAU).abs() < 1e-12);
        assert!((table.arc_length_to(PI, |_| 3.0) - 3.0 * PI).abs() < 1e-12);
        assert!((table.arc_length_to(TAU - 1e-9, |_| 3.0) - 3.0 * (TAU - 1e-9)).abs() < 1e-9);
    }

    #[test]
    fn test_max_speed_bounds_every_speed() {
        let ellipse = Ellipse::new(10.0, 1.0).unwrap();
        let bound = ellipse.max_speed_factor();
        for k in 0..100_000 {
            let phi = TAU * k as Scalar / 100_000.0;
            assert!(
                ellipse.speed_factor(phi) <= bound,
                "√g = {} exceeds the bound {bound} at φ = {phi}",
                ellipse.speed_factor(phi)
            );
        }
        assert!(bound >= 10.0, "√g is at least r = a on the major axis");
    }

    #[test]
    fn test_intrinsic_distance_is_symmetric_and_short() {
        let ellipse = Ellipse::new(2.0, 1.0).unwrap();
        let d_forward = ellipse.intrinsic_distance(0.1, 6.0);
        let d_backward = ellipse.intrinsic_distance(6.0, 0.1);
        assert!((d_forward - d_backward).abs() < 1e-12);
        assert!(d_forward <= 0.5 * ellipse.perimeter() + 1e-12);
        // 0.1 → 6.0 the short way crosses φ = 0
        let direct = ellipse.arc_length_to(0.1) + ellipse.perimeter() - ellipse.arc_length_to(6.0);
        assert!((d_forward - direct).abs() < 1e-12);
    }

    #[test]
    fn test_coordinate_at_arc_length_inverts_arc_length() {
        let ellipse = Ellipse::new(3.0, 1.0).unwrap();
        for phi in [0.0, 0.3, 1.2, PI, 4.0, 6.2] {
            let s = ellipse.arc_length_to(phi);
            let recovered = ellipse.coordinate_at_arc_length(s);
            assert!(
                crate::physics::math::angular_difference(phi, recovered).abs() < 1e-10,
                "φ = {phi} recovered as {recovered}"
            );
        }
    }
}
