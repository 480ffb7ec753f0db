pub mod collisions;
pub mod conservation;
pub mod initialization;
pub mod integrators;
pub mod manifold;
pub mod math;
pub mod particle;
pub mod stepper;
