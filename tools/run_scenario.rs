// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runs the reference two-node network and prints its spike train.
//!
//! Configuration comes from `neurograph.toml` (or `--config <path>`), then
//! `NEUROGRAPH_*` environment variables, then `--set key=value` arguments.
//! Output is a JSON document with the spike train of every node and the
//! graph topology.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use neurograph::config::{load_config, load_config_or_default, NeurographConfig};
use neurograph::engine::{CompileOptions, StepSettings};
use neurograph::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingOptions};
use neurograph::scenario::two_node;
use serde_json::json;
use tracing::info;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: run_scenario [--config <path>] [--set <key>=<value>]... [--debug-<crate>]\n\n\
         Override keys: dt, steps, exec_order, use_graph_optimization, max_threads,\n\
         potential_bound, log_level, log_dir, file_logging\n\n{}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> (Option<PathBuf>, HashMap<String, String>) {
    let mut config_path = None;
    let mut overrides = HashMap::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                config_path = Some(PathBuf::from(v));
            }
            "--set" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                match v.split_once('=') {
                    Some((key, value)) => {
                        overrides.insert(key.trim().to_string(), value.trim().to_string());
                    }
                    None => {
                        eprintln!("Expected key=value after --set, got: {v}");
                        usage_and_exit();
                    }
                }
            }
            "-h" | "--help" => usage_and_exit(),
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    (config_path, overrides)
}

fn load(
    config_path: Option<PathBuf>,
    overrides: &HashMap<String, String>,
) -> Result<NeurographConfig> {
    let config = match config_path {
        Some(path) => load_config(Some(&path), Some(overrides))
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => load_config_or_default(Some(overrides))?,
    };
    Ok(config)
}

fn main() -> Result<()> {
    let (config_path, overrides) = parse_args();
    let config = load(config_path, &overrides)?;

    let mut debug_flags = parse_debug_flags();
    for crate_name in &config.logging.debug_crates {
        debug_flags.enable(crate_name);
    }
    let _logging = init_logging(
        &debug_flags,
        &LoggingOptions {
            default_level: config.logging.level.clone(),
            log_dir: config
                .logging
                .file_logging
                .then(|| config.logging.log_dir.clone()),
            retention_days: Some(config.logging.retention_days),
            retention_runs: Some(config.logging.retention_runs),
        },
    )?;

    let sim_config = &config.simulation;
    if sim_config.max_threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(sim_config.max_threads)
            .build_global()
            .context("Failed to size the rayon thread pool")?;
    }
    info!(
        dt = sim_config.dt,
        steps = sim_config.steps,
        exec_order = %sim_config.exec_order,
        optimize = sim_config.use_graph_optimization,
        "Running two-node scenario"
    );

    let mut scenario = two_node(
        CompileOptions::from_config(sim_config),
        StepSettings::from_config(sim_config),
    )?;
    let report = scenario.sim.run(sim_config.steps, sim_config.dt)?;
    info!(
        total_spikes = report.total_spikes(),
        warnings = report.warnings().count(),
        "Scenario finished"
    );

    let topology = scenario.sim.topology();
    let trains: serde_json::Map<String, serde_json::Value> = topology
        .nodes
        .iter()
        .map(|node| (node.name.clone(), json!(report.spike_train(node.id))))
        .collect();
    let output = json!({
        "steps": sim_config.steps,
        "dt": sim_config.dt,
        "time": scenario.sim.time(),
        "spike_trains": trains,
        "topology": topology,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
