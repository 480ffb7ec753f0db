//! Earliest collision across all candidate pairs

use super::{CollisionEvent, PredictorSettings, predict};
use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::particle::Particle;
use crate::resources::WorkerPool;
use bevy::log::warn;
use serde::{Deserialize, Serialize};

/// Which pairs are handed to the predictor each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSearch {
    /// Only particles adjacent along the loop. Hard spheres on a 1-manifold
    /// cannot pass through each other, so the next contact is always between
    /// neighbours.
    #[default]
    Neighbors,
    /// Every unordered pair, `N(N−1)/2` predictions.
    AllPairs,
}

/// Result of one search over the candidate pairs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchOutcome {
    pub next: Option<CollisionEvent>,
    pub candidates: usize,
    /// Predictions that returned an imprecise contact time.
    pub imprecise_predictions: usize,
}

/// Unordered index pairs `(i, j)` with `i < j` that may collide next.
pub fn candidate_pairs(
    particles: &[Particle],
    strategy: PairSearch,
) -> Vec<(usize, usize)> {
    let count = particles.len();
    if count < 2 {
        return Vec::new();
    }

    match strategy {
        PairSearch::AllPairs => (0..count)
            .flat_map(|i| ((i + 1)..count).map(move |j| (i, j)))
            .collect(),
        PairSearch::Neighbors => {
            let mut order: Vec<usize> = (0..count).collect();
            order.sort_by(|&a, &b| {
                particles[a]
                    .coordinate()
                    .total_cmp(&particles[b].coordinate())
                    .then(a.cmp(&b))
            });

            let ordered = |a: usize, b: usize| (a.min(b), a.max(b));
            let mut pairs: Vec<(usize, usize)> = order
                .windows(2)
                .map(|window| ordered(window[0], window[1]))
                .collect();
            if count > 2 {
                pairs.push(ordered(order[count - 1], order[0]));
            }
            pairs
        }
    }
}

/// Predict every candidate pair over `horizon` and keep the earliest contact.
///
/// Chunks of pairs are predicted on the worker pool; the per-chunk minima are
/// then reduced with [`CollisionEvent::schedule_order`], which is a total
/// order, so the winner does not depend on how the pairs were split.
pub fn find_next_collision(
    particles: &[Particle],
    manifold: &dyn Manifold,
    horizon: Scalar,
    settings: &PredictorSettings,
    strategy: PairSearch,
    workers: &WorkerPool,
) -> SearchOutcome {
    let pairs = candidate_pairs(particles, strategy);

    let partials = workers.map_chunks(&pairs, |chunk| {
        let mut earliest: Option<CollisionEvent> = None;
        let mut imprecise = 0;
        for &(i, j) in chunk {
            let Some(contact) = predict(&particles[i], &particles[j], manifold, horizon, settings)
            else {
                continue;
            };
            if contact.imprecise {
                imprecise += 1;
            }
            let event = CollisionEvent::new(i, j, contact);
            if earliest.is_none_or(|current| event.schedule_order(&current).is_lt()) {
                earliest = Some(event);
            }
        }
        (earliest, imprecise)
    });

    let imprecise_predictions = partials.iter().map(|(_, imprecise)| imprecise).sum();
    let next = partials
        .into_iter()
        .filter_map(|(event, _)| event)
        .min_by(|a, b| a.schedule_order(b));

    if imprecise_predictions > 0 {
        warn!(
            "Collision prediction hit the bisection cap for {} pair(s)",
            imprecise_predictions
        );
    }

    SearchOutcome {
        next,
        candidates: pairs.len(),
        imprecise_predictions,
    }
}
