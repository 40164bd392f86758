// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph-observability
//!
//! Logging setup shared by neurograph binaries, with per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: JSON log files in timestamped run folders

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;
pub mod retention;

pub use cli::*;
pub use init::*;

/// Known neurograph crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurograph",
    "neurograph-config",
    "neurograph-npu-neural",
    "neurograph-npu-plasticity",
    "neurograph-npu-engine",
];

/// Tracing target for a crate name (`neurograph-npu-engine` -> `neurograph_npu_engine`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
