// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `neurograph.toml`. Missing keys fall back
//! to the `Default` impls below.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurographConfig {
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

/// How the compiler groups node updates into phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecOrderSetting {
    #[default]
    Sequential,
    Wavefront,
}

impl fmt::Display for ExecOrderSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecOrderSetting::Sequential => write!(f, "sequential"),
            ExecOrderSetting::Wavefront => write!(f, "wavefront"),
        }
    }
}

impl FromStr for ExecOrderSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecOrderSetting::Sequential),
            "wavefront" => Ok(ExecOrderSetting::Wavefront),
            other => Err(format!(
                "unknown exec order '{}' (expected sequential or wavefront)",
                other
            )),
        }
    }
}

/// `[simulation]` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Integration time step
    pub dt: f32,
    /// Steps executed by `run_scenario`
    pub steps: usize,
    pub exec_order: ExecOrderSetting,
    /// Fuse propagations into the same destination compartment
    pub use_graph_optimization: bool,
    /// Potentials are saturated to +/- this value
    pub potential_bound: f32,
    /// Rayon worker threads (0 = one per core)
    pub max_threads: usize,
    /// Base seed for cables without their own (`GraphBuilder::with_seed`)
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            steps: 100,
            exec_order: ExecOrderSetting::Sequential,
            use_graph_optimization: true,
            potential_bound: 1.0e4,
            max_threads: 0,
            seed: 0,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error)
    pub level: String,
    pub log_dir: PathBuf,
    /// Write per-run log folders under `log_dir`
    pub file_logging: bool,
    /// Crates logged at debug level regardless of `level`
    pub debug_crates: Vec<String>,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            debug_crates: Vec::new(),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}
