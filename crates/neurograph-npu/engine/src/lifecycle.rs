// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation lifecycle states

use core::fmt;
use serde::{Deserialize, Serialize};

/// Where a graph is in its life
///
/// ```text
/// Uninitialized --compile--> Compiled --step--> Running --halt--> Halted
///                               ^                  |
///                               +------reset-------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Still being declared (a `GraphBuilder`)
    Uninitialized,
    /// Structure fixed, no step taken since compile or reset
    Compiled,
    /// At least one step taken
    Running,
    /// Terminal; no further steps or resets
    Halted,
}

impl Lifecycle {
    pub fn can_step(self) -> bool {
        matches!(self, Lifecycle::Compiled | Lifecycle::Running)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Compiled => "compiled",
            Lifecycle::Running => "running",
            Lifecycle::Halted => "halted",
        };
        f.write_str(name)
    }
}
