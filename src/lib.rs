//! Geodrift library
//!
//! Hard-sphere particles on a closed curve: symplectic geodesic stepping,
//! event-driven elastic collisions and energy-drift projection. The library
//! is the simulation kernel; the `geodrift` binary drives it headlessly.

pub mod cli;
pub mod config;
pub mod error;
pub mod physics;
pub mod plugins;
pub mod prelude;
pub mod resources;
pub mod simulation;

// Test utilities are public for integration tests
pub mod test_utils;
