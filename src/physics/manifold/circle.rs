//! Circle of fixed radius, the zero-eccentricity manifold

use super::{Manifold, RadialProfile};
use crate::error::SimulationError;
use crate::physics::math::{Scalar, TAU, wrap_coordinate};

/// Circle of radius `R`: constant metric `R²`, vanishing Christoffel symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    radius: Scalar,
}

impl Circle {
    pub fn new(radius: Scalar) -> Result<Self, SimulationError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "circle radius must be positive and finite (radius = {radius})"
            )));
        }
        Ok(Self { radius })
    }
}

impl Manifold for Circle {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn radial_profile(&self, _phi: Scalar) -> RadialProfile {
        RadialProfile {
            radius: self.radius,
            radius_derivative: 0.0,
            radius_second_derivative: 0.0,
        }
    }

    fn perimeter(&self) -> Scalar {
        TAU * self.radius
    }

    fn arc_length_to(&self, phi: Scalar) -> Scalar {
        self.radius * wrap_coordinate(phi)
    }

    fn max_speed_factor(&self) -> Scalar {
        self.radius
    }

    fn coordinate_at_arc_length(&self, arc_length: Scalar) -> Scalar {
        wrap_coordinate(arc_length / self.radius)
    }
}
