//! Event-driven hard-sphere collisions on the manifold
//!
//! A cycle asks [`search::find_next_collision`] for the earliest contact among
//! candidate pairs, advances free flight up to it, then applies
//! [`resolution::resolve`] to that single pair.

use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::particle::Particle;
use std::cmp::Ordering;

pub mod prediction;
pub mod resolution;
pub mod search;

pub use prediction::{ContactTime, PredictorSettings, predict};
pub use resolution::{elastic_exchange, resolve};
pub use search::{PairSearch, SearchOutcome, candidate_pairs, find_next_collision};

/// A predicted contact between particles `first < second`, `time` from now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub first: usize,
    pub second: usize,
    pub time: Scalar,
    /// The predictor ran out of bisection iterations for this pair.
    pub imprecise: bool,
}

impl CollisionEvent {
    pub fn new(i: usize, j: usize, contact: ContactTime) -> Self {
        Self {
            first: i.min(j),
            second: i.max(j),
            time: contact.time,
            imprecise: contact.imprecise,
        }
    }

    /// Scheduling order: earliest time first, ties broken by the lowest `(i, j)`.
    pub fn schedule_order(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.first.cmp(&other.first))
            .then(self.second.cmp(&other.second))
    }
}

/// Intrinsic gap between the surfaces of two particles at the given coordinates.
#[inline]
pub fn gap_between(
    first: &Particle,
    first_coordinate: Scalar,
    second: &Particle,
    second_coordinate: Scalar,
    manifold: &dyn Manifold,
) -> Scalar {
    manifold.intrinsic_distance(first_coordinate, second_coordinate) - (first.radius + second.radius)
}

/// Rate at which the shorter arc between two particles is shrinking.
///
/// Positive means approaching. Measured with tangent speeds so the answer is
/// in arc-length units per unit time.
pub fn closing_speed(first: &Particle, second: &Particle, manifold: &dyn Manifold) -> Scalar {
    let forward = manifold.forward_arc(first.coordinate(), second.coordinate());
    let first_speed = first.tangent_speed(manifold);
    let second_speed = second.tangent_speed(manifold);

    if forward <= 0.5 * manifold.perimeter() {
        // `second` is ahead of `first` along increasing φ.
        first_speed - second_speed
    } else {
        second_speed - first_speed
    }
}
