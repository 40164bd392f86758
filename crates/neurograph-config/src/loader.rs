// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{validate_config, ConfigError, ConfigResult, NeurographConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "NEUROGRAPH_CONFIG_PATH";

/// File name searched for in the working directory and its parents
pub const CONFIG_FILE_NAME: &str = "neurograph.toml";

/// Find the neurograph configuration file
///
/// Search order:
/// 1. `NEUROGRAPH_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurograph.toml`
/// 3. Up to five parent directories
///
/// # Errors
///
/// `ConfigError::FileNotFound` if the env var points at a missing file or no
/// candidate exists.
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file, then apply env and CLI overrides
///
/// With `config_path = None` the file is located by [`find_config_file`].
/// The merged result is validated before it is returned.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurographConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeurographConfig = toml::from_str(&content)?;

    apply_overrides(&mut config, cli_args)
}

/// Like [`load_config`], but falls back to built-in defaults when no file is
/// found by discovery. Overrides and validation still apply.
pub fn load_config_or_default(
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurographConfig> {
    match find_config_file() {
        Ok(path) => load_config(Some(&path), cli_args),
        Err(ConfigError::FileNotFound(_)) if env::var(CONFIG_PATH_ENV).is_err() => {
            apply_overrides(&mut NeurographConfig::default(), cli_args)
        }
        Err(e) => Err(e),
    }
}

fn apply_overrides(
    config: &mut NeurographConfig,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurographConfig> {
    apply_environment_overrides(config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(config, cli);
    }
    validate_config(config)?;
    Ok(config.clone())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROGRAPH_DT` -> `simulation.dt`
/// - `NEUROGRAPH_STEPS` -> `simulation.steps`
/// - `NEUROGRAPH_EXEC_ORDER` -> `simulation.exec_order`
/// - `NEUROGRAPH_GRAPH_OPTIMIZATION` -> `simulation.use_graph_optimization`
/// - `NEUROGRAPH_MAX_THREADS` -> `simulation.max_threads`
/// - `NEUROGRAPH_POTENTIAL_BOUND` -> `simulation.potential_bound`
/// - `NEUROGRAPH_LOG_LEVEL` -> `logging.level`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut NeurographConfig) {
    let vars: HashMap<String, String> = [
        ("NEUROGRAPH_DT", "dt"),
        ("NEUROGRAPH_STEPS", "steps"),
        ("NEUROGRAPH_EXEC_ORDER", "exec_order"),
        ("NEUROGRAPH_GRAPH_OPTIMIZATION", "use_graph_optimization"),
        ("NEUROGRAPH_MAX_THREADS", "max_threads"),
        ("NEUROGRAPH_POTENTIAL_BOUND", "potential_bound"),
        ("NEUROGRAPH_LOG_LEVEL", "log_level"),
    ]
    .into_iter()
    .filter_map(|(var, key)| env::var(var).ok().map(|value| (key.to_string(), value)))
    .collect();

    apply_cli_overrides(config, &vars);
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `dt`, `steps`, `exec_order`, `use_graph_optimization`,
/// `max_threads`, `potential_bound`, `seed`, `log_level`, `log_dir`,
/// `file_logging`. Unknown keys and unparsable values are ignored.
pub fn apply_cli_overrides(config: &mut NeurographConfig, cli_args: &HashMap<String, String>) {
    let sim = &mut config.simulation;
    if let Some(value) = cli_args.get("dt") {
        if let Ok(dt) = value.parse() {
            sim.dt = dt;
        }
    }
    if let Some(value) = cli_args.get("steps") {
        if let Ok(steps) = value.parse() {
            sim.steps = steps;
        }
    }
    if let Some(value) = cli_args.get("exec_order") {
        if let Ok(order) = value.parse() {
            sim.exec_order = order;
        }
    }
    if let Some(value) = cli_args.get("use_graph_optimization") {
        sim.use_graph_optimization = parse_bool(value);
    }
    if let Some(value) = cli_args.get("max_threads") {
        if let Ok(threads) = value.parse() {
            sim.max_threads = threads;
        }
    }
    if let Some(value) = cli_args.get("potential_bound") {
        if let Ok(bound) = value.parse() {
            sim.potential_bound = bound;
        }
    }
    if let Some(value) = cli_args.get("seed") {
        if let Ok(seed) = value.parse() {
            sim.seed = seed;
        }
    }

    let log = &mut config.logging;
    if let Some(value) = cli_args.get("log_level") {
        log.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        log.log_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("file_logging") {
        log.file_logging = parse_bool(value);
    }
}
