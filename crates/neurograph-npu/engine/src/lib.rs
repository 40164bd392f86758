// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # Neurograph Engine
//!
//! Graph construction, compilation and fixed-step simulation.
//!
//! ## Flow
//! ```text
//! GraphBuilder --compile--> CompiledGraph --Simulator::new--> Simulator
//!   add_node                  ExecutionPlan                     set_clamp / step / run
//!   add_cable                 ClampTable                        reset / halt
//!   add_clamp_site                                              snapshot / topology
//! ```
//!
//! ## Architecture
//! - Nodes and cables live in arenas addressed by `NodeId` / `CableId`
//! - Only same-step cables order the graph; delayed cables read the previous step
//! - Rayon parallelizes wavefront phases and per-cable plasticity
//! - A step either fully commits or leaves the graph untouched

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod builder;
pub mod cable;
pub mod clamp;
pub mod compiler;
pub mod error;
pub mod lifecycle;
pub mod node;
pub mod plan;
pub mod report;
pub mod snapshot;
pub mod stepper;
pub mod topology;

pub use builder::GraphBuilder;
pub use cable::{Cable, CableSpec, Coupling, Endpoint};
pub use clamp::{ClampEntry, ClampKey, ClampTable, ClampValue};
pub use compiler::CompiledGraph;
pub use error::{SimError, SimResult};
pub use lifecycle::Lifecycle;
pub use node::Node;
pub use plan::{CompileOptions, ExecOrder, ExecutionPlan, Phase, PlanOp};
pub use report::{RunReport, StepReport, StepWarning};
pub use snapshot::{
    CableSnapshot, CableWeights, ClampSiteSnapshot, ModelSnapshot, NodeSnapshot, SNAPSHOT_VERSION,
};
pub use stepper::{ResetOptions, Simulator, StepSettings};
pub use topology::{CableTopology, NodeTopology, TopologyExport};
