use bevy::app::ScheduleRunnerPlugin;
use bevy::diagnostic::{DiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::Parser;
use core::time::Duration;
use geodrift::cli::{Args, load_and_apply_config};
use geodrift::plugins::{SimulationDiagnosticsPlugin, SimulationPlugin};

fn main() -> AppExit {
    let args = Args::parse();

    let config = match load_and_apply_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return AppExit::error();
        }
    };

    if args.print_config {
        return match toml::to_string_pretty(&config) {
            Ok(text) => {
                println!("{text}");
                AppExit::Success
            }
            Err(e) => {
                eprintln!("Error: failed to serialize configuration: {e}");
                AppExit::error()
            }
        };
    }

    if let Some(path) = &args.save_config {
        return match config.save(path) {
            Ok(()) => {
                println!("Configuration written to: {path}");
                AppExit::Success
            }
            Err(e) => {
                eprintln!("Error: failed to write {path}: {e}");
                AppExit::error()
            }
        };
    }

    println!(
        "geodrift {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_DATE")
    );

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
            LogPlugin {
                level,
                ..default()
            },
            DiagnosticsPlugin,
            LogDiagnosticsPlugin::default(),
        ))
        .add_plugins((
            SimulationPlugin::new(config)
                .with_cycles_per_update(args.cycles_per_update)
                .with_summary_output(args.print_summary),
            SimulationDiagnosticsPlugin::default(),
        ))
        .run()
}
