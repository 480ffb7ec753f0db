//! The event-driven simulation loop
//!
//! Each cycle finds the earliest upcoming contact, advances free flight to it
//! (or by `dt_max` when nothing is close), resolves that one collision, checks
//! the energy, and every K steps projects accumulated drift away.

pub mod snapshot;
pub mod state;
pub mod summary;

pub use snapshot::{CallbackSink, ParticleSample, Snapshot, SnapshotBuffer, SnapshotSink};
pub use state::SimulationState;
pub use summary::{CompletionReason, RunCounters, RunSummary, Termination};

use crate::config::SimulationConfig;
use crate::error::{DivergenceReason, SimulationError};
use crate::physics::collisions::resolution::apply_collision;
use crate::physics::collisions::{CollisionEvent, PredictorSettings, find_next_collision};
use crate::physics::conservation::{
    ProjectionOutcome, ProjectionSettings, project, relative_deviation, total_energy,
};
use crate::physics::initialization::place_particles;
use crate::physics::integrators::{ForestRuth, Integrator};
use crate::physics::manifold::Manifold;
use crate::physics::math::Scalar;
use crate::physics::stepper::advance_particles;
use crate::resources::{SharedRng, WorkerPool};
use bevy::log::{debug, error, info, warn};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// Built but the initial snapshot has not been emitted yet.
    Initializing,
    Running,
    Terminated(Termination),
}

pub struct Simulation {
    config: SimulationConfig,
    manifold: Arc<dyn Manifold>,
    integrator: Box<dyn Integrator>,
    workers: WorkerPool,
    predictor: PredictorSettings,
    projection: ProjectionSettings,
    state: SimulationState,
    counters: RunCounters,
    run_state: RunState,
    next_snapshot_time: Scalar,
    last_snapshot_step: Option<u64>,
    imprecise_streak: usize,
    started_at: DateTime<Local>,
    started: Instant,
}

impl Simulation {
    /// Validate `config`, build the manifold and place the particles.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let manifold = config.manifold.build()?;

        let mut rng = SharedRng::from_optional_seed(config.seed);
        let particles = place_particles(&config.particles, manifold.as_ref(), &mut rng)?;
        let state = SimulationState::new(particles, manifold.as_ref());

        info!(
            "Initialized {} particles on {} (E₀ = {:e}, seed = {:?})",
            state.particles.len(),
            manifold.name(),
            state.initial_energy,
            config.seed
        );

        Ok(Self::assemble(config, manifold, state))
    }

    /// Continue from a saved state. `E₀`, the clock and the step counter carry over.
    pub fn resume(
        config: SimulationConfig,
        mut state: SimulationState,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let manifold = config.manifold.build()?;

        if !state.time.is_finite() || state.time < 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "saved state has invalid time {}",
                state.time
            )));
        }
        if !state.initial_energy.is_finite() || state.initial_energy < 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "saved state has invalid reference energy {}",
                state.initial_energy
            )));
        }
        for particle in state.particles.iter_mut() {
            let physical = particle.mass > 0.0
                && particle.radius > 0.0
                && particle.velocity.is_finite()
                && particle.coordinate().is_finite();
            if !physical {
                return Err(SimulationError::InvalidConfiguration(format!(
                    "saved particle {} is not physical",
                    particle.id
                )));
            }
            particle.set_coordinate(particle.coordinate());
        }

        info!(
            "Resuming {} particles on {} at t = {} (step {})",
            state.particles.len(),
            manifold.name(),
            state.time,
            state.step
        );

        Ok(Self::assemble(config, manifold, state))
    }

    fn assemble(config: SimulationConfig, manifold: Arc<dyn Manifold>, state: SimulationState) -> Self {
        let workers = WorkerPool::new(
            config.parallel.worker_threads,
            config.parallel.parallel_threshold,
        );
        let interval = config.integration.snapshot_interval;
        let next_snapshot_time = ((state.time / interval).floor() + 1.0) * interval;

        Self {
            predictor: PredictorSettings::from(&config.collisions),
            projection: ProjectionSettings {
                tolerance: config.conservation.projection_tolerance,
                degenerate_energy: config.conservation.degenerate_energy,
            },
            integrator: Box::new(ForestRuth::new()),
            workers,
            manifold,
            state,
            config,
            counters: RunCounters::default(),
            run_state: RunState::Initializing,
            next_snapshot_time,
            last_snapshot_step: None,
            imprecise_streak: 0,
            started_at: Local::now(),
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn manifold(&self) -> &dyn Manifold {
        self.manifold.as_ref()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    pub fn worker_threads(&self) -> usize {
        self.workers.threads()
    }

    pub fn energy(&self) -> Scalar {
        self.state.energy(self.manifold.as_ref())
    }

    pub fn snapshot(&self) -> Snapshot {
        let energy = self.energy();
        Snapshot {
            time: self.state.time,
            step: self.state.step,
            particles: self.state.particles.iter().map(ParticleSample::from).collect(),
            collisions: self.counters.collisions,
            energy,
            relative_energy_deviation: relative_deviation(energy, self.state.initial_energy),
        }
    }

    /// Run one cycle and emit whatever snapshots it produces.
    ///
    /// The first call emits the initial snapshot. Once the run has terminated
    /// further calls do nothing.
    pub fn advance(&mut self, sink: &mut dyn SnapshotSink) -> &RunState {
        match self.run_state {
            RunState::Terminated(_) => return &self.run_state,
            RunState::Initializing => {
                self.emit_snapshot(sink);
                self.run_state = RunState::Running;
            }
            RunState::Running => {}
        }

        if let Some(reason) = self.completion() {
            self.finish(Termination::Completed(reason), sink);
            return &self.run_state;
        }

        if let Err(failure) = self.cycle() {
            error!("Simulation halted: {}", failure);
            self.run_state = RunState::Terminated(Termination::Failed(failure));
            return &self.run_state;
        }

        if self.state.time >= self.next_snapshot_time {
            let interval = self.config.integration.snapshot_interval;
            while self.state.time >= self.next_snapshot_time {
                self.next_snapshot_time += interval;
            }
            self.emit_snapshot(sink);
        }

        if let Some(reason) = self.completion() {
            self.finish(Termination::Completed(reason), sink);
        }

        &self.run_state
    }

    /// Cycle until the run terminates.
    pub fn run(mut self, sink: &mut dyn SnapshotSink) -> RunSummary {
        loop {
            if let RunState::Terminated(termination) = self.advance(sink) {
                let termination = termination.clone();
                return self.build_summary(termination);
            }
        }
    }

    /// Terminal summary, once the run has ended.
    pub fn summary(&self) -> Option<RunSummary> {
        match &self.run_state {
            RunState::Terminated(termination) => Some(self.build_summary(termination.clone())),
            _ => None,
        }
    }

    fn build_summary(&self, termination: Termination) -> RunSummary {
        let final_energy = self.energy();
        RunSummary {
            started_at: self.started_at.to_rfc3339(),
            wall_clock_seconds: self.started.elapsed().as_secs_f64(),
            steps: self.state.step,
            simulated_time: self.state.time,
            particle_count: self.state.particles.len(),
            initial_energy: self.state.initial_energy,
            final_energy,
            final_relative_deviation: relative_deviation(final_energy, self.state.initial_energy),
            termination,
            counters: self.counters,
        }
    }

    fn completion(&self) -> Option<CompletionReason> {
        let integration = &self.config.integration;
        if self.state.time >= integration.max_time {
            Some(CompletionReason::TimeLimit)
        } else if self.state.step >= integration.max_steps {
            Some(CompletionReason::StepBudget)
        } else {
            None
        }
    }

    fn finish(&mut self, termination: Termination, sink: &mut dyn SnapshotSink) {
        if self.last_snapshot_step != Some(self.state.step) {
            self.emit_snapshot(sink);
        }
        info!(
            "Simulation finished at t = {} after {} steps and {} collisions ({:?})",
            self.state.time, self.state.step, self.counters.collisions, termination
        );
        self.run_state = RunState::Terminated(termination);
    }

    fn emit_snapshot(&mut self, sink: &mut dyn SnapshotSink) {
        let snapshot = self.snapshot();
        if snapshot.relative_energy_deviation > self.config.conservation.energy_bound {
            warn!(
                "Energy deviation {:e} at t = {} exceeds the bound {:e}",
                snapshot.relative_energy_deviation,
                snapshot.time,
                self.config.conservation.energy_bound
            );
            self.counters.bound_violations += 1;
        }
        self.last_snapshot_step = Some(snapshot.step);
        sink.record(snapshot);
    }

    fn cycle(&mut self) -> Result<(), SimulationError> {
        let integration = &self.config.integration;
        let (dt_max, dt_min, max_time) = (integration.dt_max, integration.dt_min, integration.max_time);
        let remaining = max_time - self.state.time;
        let horizon = dt_max.min(remaining);

        let search = find_next_collision(
            &self.state.particles,
            self.manifold.as_ref(),
            horizon,
            &self.predictor,
            self.config.collisions.pair_search,
            &self.workers,
        );
        self.track_imprecision(search.imprecise_predictions)?;

        let mut due = None;
        let dt = match search.next {
            Some(event) if event.time < dt_min => {
                // Too close to step up to; collide now and move on.
                self.collide(event);
                dt_min.min(remaining)
            }
            Some(event) => {
                due = Some(event);
                event.time
            }
            None => horizon,
        };

        advance_particles(
            &mut self.state.particles,
            self.integrator.as_ref(),
            self.manifold.as_ref(),
            dt,
            &self.workers,
        );
        self.state.time = if dt >= remaining {
            max_time
        } else {
            self.state.time + dt
        };
        self.state.step += 1;

        if let Some(event) = due {
            self.collide(event);
        }

        self.check_energy()?;

        let conservation = &self.config.conservation;
        if conservation.projection_enabled && self.state.step % conservation.projection_interval == 0 {
            self.apply_projection();
        }

        Ok(())
    }

    fn collide(&mut self, event: CollisionEvent) {
        let (i, j) = (event.first, event.second);
        if apply_collision(&mut self.state.particles, i, j, self.manifold.as_ref()) {
            self.counters.collisions += 1;
            debug!(
                "Collision {} between {} and {} at t = {}",
                self.counters.collisions,
                self.state.particles[i].id,
                self.state.particles[j].id,
                self.state.time
            );
        }
    }

    fn track_imprecision(&mut self, imprecise: usize) -> Result<(), SimulationError> {
        if imprecise == 0 {
            self.imprecise_streak = 0;
            return Ok(());
        }

        self.counters.imprecise_predictions += imprecise as u64;
        self.imprecise_streak += 1;
        if self.imprecise_streak > self.config.collisions.imprecision_limit {
            return Err(self.divergence(self.energy(), DivergenceReason::PersistentImprecision));
        }
        Ok(())
    }

    fn check_energy(&mut self) -> Result<(), SimulationError> {
        let energy = total_energy(&self.state.particles, self.manifold.as_ref());
        if !energy.is_finite() {
            return Err(self.divergence(energy, DivergenceReason::NonFiniteEnergy));
        }

        let conservation = &self.config.conservation;
        let reference = self.state.initial_energy;
        if energy > conservation.divergence_factor * reference
            && energy > conservation.degenerate_energy
        {
            return Err(self.divergence(energy, DivergenceReason::EnergyOutOfBounds));
        }

        let deviation = relative_deviation(energy, reference);
        self.counters.max_relative_deviation = self.counters.max_relative_deviation.max(deviation);
        Ok(())
    }

    fn apply_projection(&mut self) {
        let outcome = project(
            &mut self.state.particles,
            self.manifold.as_ref(),
            self.state.initial_energy,
            &self.projection,
        );
        match outcome {
            ProjectionOutcome::Rescaled { .. } => self.counters.projections_applied += 1,
            ProjectionOutcome::Skipped { .. } => self.counters.projections_skipped += 1,
            ProjectionOutcome::WithinTolerance { .. } => {}
        }
    }

    fn divergence(&self, energy: Scalar, reason: DivergenceReason) -> SimulationError {
        SimulationError::NumericalDivergence {
            time: self.state.time,
            step: self.state.step,
            energy,
            reason,
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("manifold", &self.manifold)
            .field("integrator", &self.integrator.name())
            .field("workers", &self.workers)
            .field("time", &self.state.time)
            .field("step", &self.state.step)
            .field("run_state", &self.run_state)
            .finish()
    }
}

/// Build and run a simulation, reporting initialization failures as a
/// terminated summary rather than an `Err`.
pub fn run_simulation(config: SimulationConfig, sink: &mut dyn SnapshotSink) -> RunSummary {
    match Simulation::new(config) {
        Ok(simulation) => simulation.run(sink),
        Err(failure) => {
            error!("Simulation could not start: {}", failure);
            RunSummary::not_started(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifoldConfig;
    use crate::test_utils::head_on_pair_config as head_on_config;

    #[test]
    fn test_run_state_progression() {
        let mut simulation = Simulation::new(head_on_config()).unwrap();
        let mut buffer = SnapshotBuffer::default();

        assert_eq!(simulation.run_state(), &RunState::Initializing);
        simulation.advance(&mut buffer);
        assert_eq!(simulation.run_state(), &RunState::Running);
        assert_eq!(buffer.len(), 1, "First advance emits the initial snapshot");
        assert_eq!(buffer.snapshots()[0].step, 0);
    }

    #[test]
    fn test_head_on_pair_collides_and_finishes() {
        let mut buffer = SnapshotBuffer::default();
        let summary = Simulation::new(head_on_config()).unwrap().run(&mut buffer);

        assert_eq!(
            summary.termination,
            Termination::Completed(CompletionReason::TimeLimit)
        );
        assert_eq!(summary.simulated_time, 10.0);
        assert!(summary.counters.collisions >= 1);
        assert!(summary.final_relative_deviation < 1e-6);

        let times: Vec<Scalar> = buffer.snapshots().iter().map(|s| s.time).collect();
        assert_eq!(times.len(), 11, "Initial snapshot plus one per unit time: {times:?}");
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_step_budget_terminates() {
        let mut config = head_on_config();
        config.integration.max_steps = 5;
        let summary = Simulation::new(config).unwrap().run(&mut SnapshotBuffer::default());

        assert_eq!(summary.steps, 5);
        assert_eq!(
            summary.termination,
            Termination::Completed(CompletionReason::StepBudget)
        );
    }

    #[test]
    fn test_initialization_failure_is_reported() {
        let mut config = SimulationConfig::default();
        config.particles.count = 1_000;
        config.particles.radius = 0.1;
        config.particles.max_placement_attempts = 2_000;
        config.seed = Some(1);

        let mut buffer = SnapshotBuffer::default();
        let summary = run_simulation(config, &mut buffer);

        assert!(matches!(
            summary.termination,
            Termination::Failed(SimulationError::InitializationFailure { .. })
        ));
        assert!(buffer.is_empty(), "No partial run may start");
    }

    #[test]
    fn test_resume_continues_the_clock() {
        let config = head_on_config();
        let mut first = Simulation::new(config.clone()).unwrap();
        let mut buffer = SnapshotBuffer::default();
        for _ in 0..50 {
            first.advance(&mut buffer);
        }
        let saved = first.state().clone();

        let mut resumed = Simulation::resume(config, saved.clone()).unwrap();
        resumed.advance(&mut buffer);

        assert_eq!(resumed.state().initial_energy, saved.initial_energy);
        assert!(resumed.state().time > saved.time);
        assert_eq!(resumed.state().step, saved.step + 1);
    }

    #[test]
    fn test_divergence_halts_the_run() {
        let mut config = head_on_config();
        config.manifold = ManifoldConfig::Circle { radius: 1.0 };
        let mut simulation = Simulation::new(config).unwrap();
        let mut buffer = SnapshotBuffer::default();
        simulation.advance(&mut buffer);

        simulation.state.particles[0].velocity = Scalar::NAN;
        let state = simulation.advance(&mut buffer).clone();

        match state {
            RunState::Terminated(Termination::Failed(SimulationError::NumericalDivergence {
                reason,
                ..
            })) => assert_eq!(reason, DivergenceReason::NonFiniteEnergy),
            other => panic!("Expected divergence, got {other:?}"),
        }
        assert!(simulation.summary().is_some());
    }
}
