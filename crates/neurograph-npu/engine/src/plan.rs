// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compiled execution plan and compile options

use crate::cable::Endpoint;
use neurograph_config::{ExecOrderSetting, SimulationConfig};
use neurograph_npu_neural::{CableId, NodeId};
use serde::{Deserialize, Serialize};

/// How node updates are grouped into phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecOrder {
    /// One node per phase, in topological order
    #[default]
    Sequential,
    /// One topological level per phase; updates inside a phase run in parallel
    Wavefront,
}

impl From<ExecOrderSetting> for ExecOrder {
    fn from(setting: ExecOrderSetting) -> Self {
        match setting {
            ExecOrderSetting::Sequential => ExecOrder::Sequential,
            ExecOrderSetting::Wavefront => ExecOrder::Wavefront,
        }
    }
}

/// Options fixed at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    pub exec_order: ExecOrder,
    /// Fuse propagations into the same destination (never changes results)
    pub use_graph_optimization: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            exec_order: ExecOrder::Sequential,
            use_graph_optimization: true,
        }
    }
}

impl CompileOptions {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            exec_order: config.exec_order.into(),
            use_graph_optimization: config.use_graph_optimization,
        }
    }

    pub fn with_exec_order(mut self, exec_order: ExecOrder) -> Self {
        self.exec_order = exec_order;
        self
    }

    pub fn with_optimization(mut self, enabled: bool) -> Self {
        self.use_graph_optimization = enabled;
        self
    }
}

/// One operation inside a phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOp {
    /// Add one cable's contribution to its destination buffer
    Propagate(CableId),
    /// Sum several cables (ascending id) into one destination buffer
    PropagateFused { dest: Endpoint, cables: Vec<CableId> },
}

/// Propagations followed by node updates
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Phase {
    pub ops: Vec<PlanOp>,
    pub updates: Vec<NodeId>,
}

/// Ordered phases covering every node exactly once
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionPlan {
    pub(crate) phases: Vec<Phase>,
    pub(crate) topo_order: Vec<NodeId>,
    pub(crate) options: CompileOptions,
}

impl ExecutionPlan {
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Node order the plan was derived from
    pub fn topological_order(&self) -> &[NodeId] {
        &self.topo_order
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Number of propagation operations (fused ops count once)
    pub fn op_count(&self) -> usize {
        self.phases.iter().map(|phase| phase.ops.len()).sum()
    }
}
