//! Time-to-contact for a single pair by bisection on the intrinsic gap

use super::{closing_speed, gap_between};
use crate::config::CollisionConfig;
use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::particle::Particle;

/// Root-finding parameters for [`predict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorSettings {
    /// Bracket width, as a fraction of the horizon, at which bisection stops.
    pub tolerance: Scalar,
    pub max_iterations: usize,
    /// Minimum number of samples across the horizon when bracketing the first
    /// sign change. Fast pairs get more, see [`predict`].
    pub scan_samples: usize,
    /// Gaps at or below this count as touching.
    pub contact_tolerance: Scalar,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 50,
            scan_samples: 8,
            contact_tolerance: 1e-12,
        }
    }
}

impl From<&CollisionConfig> for PredictorSettings {
    fn from(config: &CollisionConfig) -> Self {
        Self {
            tolerance: config.bisection_tolerance,
            max_iterations: config.max_bisection_iterations,
            scan_samples: config.scan_samples,
            contact_tolerance: config.contact_tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactTime {
    pub time: Scalar,
    /// Bisection hit `max_iterations` before the bracket met the tolerance.
    pub imprecise: bool,
}

/// Earliest time in `[0, horizon]` at which the two particles touch.
///
/// Both coordinates are extrapolated linearly, `φ(t) = φ₀ + φ̇·t`, and the gap
/// is the shorter geodesic arc minus both radii. A pair that already touches
/// is in contact at `t = 0` only while it is still approaching; a touching pair
/// that is separating has no upcoming contact. When the gap dips below zero
/// more than once inside the horizon the first crossing wins.
///
/// The gap changes no faster than `reach = max√g·(|φ̇ᵢ| + |φ̇ⱼ|)`, so from a
/// sample with gap `g` the next `g / reach` is contact-free and can be skipped.
/// Other samples are never further apart than the time the pair needs to close its
/// contact distance `rᵢ + rⱼ`, so a pair cannot pass through the other between
/// two samples. Only grazing dips shallower than that can go unseen; they leave
/// the pair touching and are picked up at `t = 0` on the next call.
pub fn predict(
    first: &Particle,
    second: &Particle,
    manifold: &dyn Manifold,
    horizon: Scalar,
    settings: &PredictorSettings,
) -> Option<ContactTime> {
    let gap = |t: Scalar| {
        gap_between(
            first,
            first.extrapolated_coordinate(t),
            second,
            second.extrapolated_coordinate(t),
            manifold,
        )
    };

    let initial_gap = gap(0.0);
    if initial_gap <= settings.contact_tolerance {
        return (closing_speed(first, second, manifold) > 0.0).then_some(ContactTime {
            time: 0.0,
            imprecise: false,
        });
    }

    if horizon.is_nan() || horizon <= 0.0 {
        return None;
    }

    let reach = manifold.max_speed_factor() * (first.velocity.abs() + second.velocity.abs());
    if reach.is_nan() || reach <= 0.0 {
        return None;
    }

    let samples = settings.scan_samples.max(1) as Scalar;
    let sample_spacing = (horizon / samples).min((first.radius + second.radius) / reach);

    let (mut lo, mut hi) = bracket_first_contact(&gap, initial_gap, reach, sample_spacing, horizon)?;

    let width = settings.tolerance * horizon;
    let mut iterations = 0;
    while hi - lo > width {
        if iterations == settings.max_iterations {
            return Some(ContactTime {
                time: 0.5 * (lo + hi),
                imprecise: true,
            });
        }
        let mid = 0.5 * (lo + hi);
        if gap(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        iterations += 1;
    }

    // `hi` is on the touching side of the bracket, so stepping to it never
    // leaves the pair separated by more than the tolerance.
    Some(ContactTime {
        time: hi,
        imprecise: false,
    })
}

/// Walk forward from `t = 0` until the gap is no longer positive and return the
/// last positive sample together with the first non-positive one.
fn bracket_first_contact(
    gap: &impl Fn(Scalar) -> Scalar,
    initial_gap: Scalar,
    reach: Scalar,
    sample_spacing: Scalar,
    horizon: Scalar,
) -> Option<(Scalar, Scalar)> {
    let (mut t, mut current) = (0.0, initial_gap);
    while t < horizon {
        let next = (t + (current / reach).max(sample_spacing)).min(horizon);
        let value = gap(next);
        if value <= 0.0 {
            return Some((t, next));
        }
        t = next;
        current = value;
    }
    None
}
