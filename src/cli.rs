//! Command line interface for Geodrift

use clap::Parser;
use std::fmt;

use crate::config::{ManifoldConfig, SimulationConfig};
use crate::physics::collisions::PairSearch;

/// CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be loaded or written
    ConfigLoad(String),
    /// The effective configuration is not runnable
    InvalidArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::ConfigLoad(msg) => write!(f, "Failed to load configuration: {msg}"),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Geodrift - hard-sphere gas on an ellipse
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Number of particles to simulate (overrides config file)
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub particles: Option<usize>,

    /// Random seed for initial conditions
    #[arg(short = 's', long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Semi-axis along x (switches the manifold to an ellipse)
    #[arg(short = 'a', long, value_name = "LENGTH")]
    pub semi_axis_a: Option<f64>,

    /// Semi-axis along y (switches the manifold to an ellipse)
    #[arg(short = 'b', long, value_name = "LENGTH")]
    pub semi_axis_b: Option<f64>,

    /// Simulated time to run for
    #[arg(short = 't', long, value_name = "TIME")]
    pub max_time: Option<f64>,

    /// Largest free-flight step
    #[arg(long, value_name = "DT")]
    pub dt_max: Option<f64>,

    /// Worker threads for the parallel helpers (0 = all cores)
    #[arg(short = 'j', long, value_name = "THREADS")]
    pub threads: Option<usize>,

    /// Predict every pair instead of loop neighbours only
    #[arg(long)]
    pub all_pairs: bool,

    /// Disable the periodic energy projection
    #[arg(long)]
    pub no_projection: bool,

    /// Simulation cycles per app update
    #[arg(long, value_name = "CYCLES", default_value = "1000")]
    pub cycles_per_update: usize,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<String>,

    /// Print the run summary as TOML when the run ends
    #[arg(long)]
    pub print_summary: bool,
}

/// Loads configuration from file or defaults, then applies command-line overrides
pub fn load_and_apply_config(args: &Args) -> Result<SimulationConfig, CliError> {
    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        if !std::path::Path::new(config_path).exists() {
            return Err(CliError::ConfigLoad(format!("{config_path} does not exist")));
        }
        println!("Loading configuration from: {config_path}");
        SimulationConfig::load_or_default(config_path)
    } else {
        SimulationConfig::load_from_user_config()
    };

    // Apply command-line overrides
    if let Some(count) = args.particles {
        println!("Overriding particle count to: {count}");
        config.particles.count = count;
        config.particles.explicit.clear();
    }

    if let Some(seed) = args.seed {
        println!("Using random seed: {seed}");
        config.seed = Some(seed);
    }

    if args.semi_axis_a.is_some() || args.semi_axis_b.is_some() {
        let (a, b) = config.manifold.semi_axes();
        config.manifold = ManifoldConfig::Ellipse {
            a: args.semi_axis_a.unwrap_or(a),
            b: args.semi_axis_b.unwrap_or(b),
        };
        println!("Using manifold: {:?}", config.manifold);
    }

    if let Some(max_time) = args.max_time {
        println!("Overriding max time to: {max_time}");
        config.integration.max_time = max_time;
    }

    if let Some(dt_max) = args.dt_max {
        println!("Overriding dt_max to: {dt_max}");
        config.integration.dt_max = dt_max;
    }

    if let Some(threads) = args.threads {
        config.parallel.worker_threads = threads;
    }

    if args.all_pairs {
        config.collisions.pair_search = PairSearch::AllPairs;
    }

    if args.no_projection {
        println!("Energy projection disabled");
        config.conservation.projection_enabled = false;
    }

    config
        .validate()
        .map_err(|err| CliError::InvalidArgument(err.to_string()))?;

    Ok(config)
}
