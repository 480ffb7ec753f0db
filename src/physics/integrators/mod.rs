//! Numerical integration of free geodesic motion on the manifold
//!
//! Between collisions each particle obeys the geodesic equation
//! `φ̈ = −Γ(φ)·φ̇²` independently of every other particle, so an integrator
//! only ever sees one coordinate/velocity pair at a time.

use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;

pub mod forest_ruth;

pub use forest_ruth::{ForestRuth, ForestRuthCoefficients};

/// Base trait for geodesic integrators
pub trait Integrator: Send + Sync {
    /// Advance a single particle's coordinate and generalized velocity by `dt`
    ///
    /// The coordinate is left unwrapped; callers fold it back into `[0, 2π)`.
    ///
    /// # Arguments
    /// * `coordinate` - Mutable reference to the manifold coordinate `φ`
    /// * `velocity` - Mutable reference to the generalized velocity `φ̇`
    /// * `manifold` - Geometry supplying the Christoffel symbol
    /// * `dt` - Time step
    fn step(
        &self,
        coordinate: &mut Scalar,
        velocity: &mut Scalar,
        manifold: &dyn Manifold,
        dt: Scalar,
    );

    /// Get the name of this integrator
    fn name(&self) -> &'static str;

    /// Get the order of this integrator
    fn convergence_order(&self) -> usize;
}
