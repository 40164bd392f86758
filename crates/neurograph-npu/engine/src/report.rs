// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-step and per-run summaries returned by the simulator

use neurograph_npu_neural::{CableId, NodeId};

/// Non-fatal condition raised during a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepWarning {
    /// A compartment left `±potential_bound` (or went NaN) and was saturated
    NumericInstability {
        node: NodeId,
        compartment: &'static str,
        units: usize,
    },
    /// Plasticity traces hit their bound
    TraceSaturation { cable: CableId, units: usize },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepReport {
    /// Step number (1-based, equal to the step count after this step)
    pub step: u64,
    /// Simulation time at the end of the step
    pub time: f64,
    /// Spiking nodes and how many of their units fired
    pub spikes: Vec<(NodeId, usize)>,
    pub warnings: Vec<StepWarning>,
    /// Cables whose weights were touched by plasticity
    pub plasticity_updates: usize,
}

impl StepReport {
    /// Spike count for `node` (0 when it did not fire)
    pub fn spikes_of(&self, node: NodeId) -> usize {
        self.spikes
            .iter()
            .find(|(id, _)| *id == node)
            .map_or(0, |&(_, count)| count)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Spike count of `node` at every step of the run
    pub fn spike_train(&self, node: NodeId) -> Vec<usize> {
        self.steps.iter().map(|report| report.spikes_of(node)).collect()
    }

    pub fn total_spikes(&self) -> usize {
        self.steps
            .iter()
            .flat_map(|report| report.spikes.iter())
            .map(|&(_, count)| count)
            .sum()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StepWarning> {
        self.steps.iter().flat_map(|report| report.warnings.iter())
    }
}
