use crate::error::SimulationError;
use crate::physics::collisions::PairSearch;
use crate::physics::manifold::{Circle, Ellipse, Manifold};
use crate::physics::math::Scalar;
use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Resource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for initial conditions; `None` draws one from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub manifold: ManifoldConfig,
    pub particles: ParticlesConfig,
    pub integration: IntegrationConfig,
    pub collisions: CollisionConfig,
    pub conservation: ConservationConfig,
    pub parallel: ParallelConfig,
}

/// Shape of the closed curve the particles live on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ManifoldConfig {
    /// `x²/a² + y²/b² = 1`
    Ellipse { a: Scalar, b: Scalar },
    Circle { radius: Scalar },
}

impl Default for ManifoldConfig {
    fn default() -> Self {
        Self::Ellipse { a: 2.0, b: 1.0 }
    }
}

impl ManifoldConfig {
    pub fn build(&self) -> Result<Arc<dyn Manifold>, SimulationError> {
        let manifold: Arc<dyn Manifold> = match *self {
            ManifoldConfig::Ellipse { a, b } => Arc::new(Ellipse::new(a, b)?),
            ManifoldConfig::Circle { radius } => Arc::new(Circle::new(radius)?),
        };
        Ok(manifold)
    }

    /// Semi-axes along x and y.
    pub fn semi_axes(&self) -> (Scalar, Scalar) {
        match *self {
            ManifoldConfig::Ellipse { a, b } => (a, b),
            ManifoldConfig::Circle { radius } => (radius, radius),
        }
    }
}

/// How initial coordinates are drawn.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Uniform in `φ`; crowds particles where the curve is short per radian.
    #[default]
    Coordinate,
    /// Uniform in arc length.
    ArcLength,
}

/// A hand-placed particle. Unset mass and radius fall back to the section defaults.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ParticleSpec {
    pub coordinate: Scalar,
    pub velocity: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<Scalar>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ParticlesConfig {
    pub count: usize,
    /// Half-width of every particle, measured in arc length.
    pub radius: Scalar,
    pub mass: Scalar,
    /// When set, masses are drawn uniformly from `[min, max]` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass_range: Option<[Scalar; 2]>,
    /// Generalized velocities `φ̇` are drawn uniformly from `[min, max]`.
    pub velocity_range: [Scalar; 2],
    pub placement: Placement,
    pub max_placement_attempts: usize,
    /// Explicit initial conditions; when non-empty, `count` and the random
    /// draws are ignored.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit: Vec<ParticleSpec>,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            count: 64,
            radius: 0.01,
            mass: 1.0,
            mass_range: None,
            velocity_range: [-1.0, 1.0],
            placement: Placement::default(),
            max_placement_attempts: 100_000,
            explicit: Vec::new(),
        }
    }
}

impl ParticlesConfig {
    pub fn requested(&self) -> usize {
        if self.explicit.is_empty() {
            self.count
        } else {
            self.explicit.len()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct IntegrationConfig {
    pub dt_max: Scalar,
    /// Collisions due sooner than this are resolved before advancing, and the
    /// step that follows is never shorter than this. The resolved pair may
    /// still be up to its closing speed times `dt_min` apart, and no second
    /// contact is searched for inside that step, so overlaps of roughly
    /// `speed·dt_min` in arc length can appear.
    pub dt_min: Scalar,
    pub max_time: Scalar,
    pub max_steps: u64,
    pub snapshot_interval: Scalar,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            dt_max: 1e-2,
            dt_min: 1e-9,
            max_time: 100.0,
            max_steps: 100_000_000,
            snapshot_interval: 1.0,
        }
    }
}

impl IntegrationConfig {
    /// Snapshot count of a complete run, including the first and last.
    pub fn expected_snapshots(&self) -> usize {
        if self.snapshot_interval > 0.0 && self.max_time.is_finite() {
            (self.max_time / self.snapshot_interval).ceil() as usize + 2
        } else {
            2
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CollisionConfig {
    pub pair_search: PairSearch,
    /// Bisection stops once the bracket is this fraction of the horizon.
    pub bisection_tolerance: Scalar,
    pub max_bisection_iterations: usize,
    /// Minimum samples per horizon when bracketing a contact. Fast pairs are
    /// sampled more densely so they cannot pass through each other unseen.
    pub scan_samples: usize,
    pub contact_tolerance: Scalar,
    /// Consecutive cycles with imprecise predictions tolerated before the run
    /// is declared divergent.
    pub imprecision_limit: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            pair_search: PairSearch::default(),
            bisection_tolerance: 1e-12,
            max_bisection_iterations: 50,
            scan_samples: 8,
            contact_tolerance: 1e-12,
            imprecision_limit: 1_000,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ConservationConfig {
    pub projection_enabled: bool,
    /// Steps between projections (K).
    pub projection_interval: u64,
    /// `|ΔE/E₀|` above which velocities are rescaled. Keep it above the
    /// stepper's bounded energy oscillation (around 1e-10 at `dt_max = 1e-2`)
    /// so that only accumulated drift triggers a rescale.
    pub projection_tolerance: Scalar,
    /// Largest `|ΔE/E₀|` a snapshot may show without a warning.
    pub energy_bound: Scalar,
    /// `E > divergence_factor·E₀` halts the run.
    pub divergence_factor: Scalar,
    pub degenerate_energy: Scalar,
}

impl Default for ConservationConfig {
    fn default() -> Self {
        Self {
            projection_enabled: true,
            projection_interval: 100,
            projection_tolerance: 1e-8,
            energy_bound: 1e-4,
            divergence_factor: 10.0,
            degenerate_energy: 1e-300,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ParallelConfig {
    /// 0 uses every available core.
    pub worker_threads: usize,
    /// Below this many items per cycle the work stays on the loop thread.
    pub parallel_threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            parallel_threshold: 512,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a file, falling back to defaults if the file doesn't exist
    pub fn load_or_default(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse config file {}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("Config file {} not found. Using defaults.", path);
                Self::default()
            }
        }
    }

    /// Platform config location, e.g. `~/.config/geodrift/config.toml` on Linux.
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "geodrift").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Layer the user config file (if any) and `GEODRIFT__SECTION__KEY`
    /// environment variables over the defaults.
    pub fn load_from_user_config() -> Self {
        let mut builder = ::config::Config::builder();
        if let Some(path) = Self::user_config_path() {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix("GEODRIFT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        match builder
            .build()
            .and_then(|layered| layered.try_deserialize::<SimulationConfig>())
        {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load user configuration: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations that cannot describe a run.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidConfiguration(msg));
        let positive = |value: Scalar| value.is_finite() && value > 0.0;

        self.manifold.build()?;

        let particles = &self.particles;
        if !positive(particles.radius) {
            return invalid(format!("particle radius must be positive, got {}", particles.radius));
        }
        if !positive(particles.mass) {
            return invalid(format!("particle mass must be positive, got {}", particles.mass));
        }
        if let Some([low, high]) = particles.mass_range {
            if !positive(low) || !positive(high) || low > high {
                return invalid(format!("mass range [{low}, {high}] is not a positive interval"));
            }
        }
        let [low, high] = particles.velocity_range;
        if !low.is_finite() || !high.is_finite() || low > high {
            return invalid(format!("velocity range [{low}, {high}] is empty"));
        }
        for (index, spec) in particles.explicit.iter().enumerate() {
            let mass_ok = spec.mass.is_none_or(positive);
            let radius_ok = spec.radius.is_none_or(positive);
            if !spec.coordinate.is_finite() || !spec.velocity.is_finite() || !mass_ok || !radius_ok
            {
                return invalid(format!("explicit particle {index} is not physical: {spec:?}"));
            }
        }

        let integration = &self.integration;
        if !positive(integration.dt_max) {
            return invalid(format!("dt_max must be positive, got {}", integration.dt_max));
        }
        if !positive(integration.dt_min) || integration.dt_min > integration.dt_max {
            return invalid(format!(
                "dt_min must lie in (0, dt_max], got {} with dt_max {}",
                integration.dt_min, integration.dt_max
            ));
        }
        if integration.max_time.is_nan() || integration.max_time < 0.0 {
            return invalid(format!("max_time must be non-negative, got {}", integration.max_time));
        }
        if !positive(integration.snapshot_interval) {
            return invalid(format!(
                "snapshot_interval must be positive, got {}",
                integration.snapshot_interval
            ));
        }

        let collisions = &self.collisions;
        if !positive(collisions.bisection_tolerance) {
            return invalid("bisection_tolerance must be positive".to_string());
        }
        if collisions.scan_samples == 0 {
            return invalid("scan_samples must be at least 1".to_string());
        }
        if collisions.contact_tolerance.is_nan() || collisions.contact_tolerance < 0.0 {
            return invalid("contact_tolerance must be non-negative".to_string());
        }

        let conservation = &self.conservation;
        if conservation.projection_enabled && conservation.projection_interval == 0 {
            return invalid("projection_interval must be at least 1".to_string());
        }
        if !positive(conservation.energy_bound) {
            return invalid(format!(
                "energy_bound must be positive, got {}",
                conservation.energy_bound
            ));
        }
        let tolerance = conservation.projection_tolerance;
        if tolerance.is_nan() || tolerance < 0.0 || tolerance >= conservation.energy_bound {
            return invalid(format!(
                "projection_tolerance must lie in [0, energy_bound), got {} with energy_bound {}",
                tolerance, conservation.energy_bound
            ));
        }
        if conservation.divergence_factor.is_nan() || conservation.divergence_factor <= 1.0 {
            return invalid(format!(
                "divergence_factor must exceed 1, got {}",
                conservation.divergence_factor
            ));
        }

        Ok(())
    }
}
