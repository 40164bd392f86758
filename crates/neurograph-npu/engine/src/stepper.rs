// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Simulation Stepper
//!
//! Advances a compiled graph by fixed time steps.
//!
//! ## Step Pipeline
//! 1. **Validate**: lifecycle, `dt` and every active clamp are checked before
//!    any state changes. A failing step leaves the graph exactly as it was.
//! 2. **Snapshot**: delayed cables copy their source compartment as it was at
//!    the start of the step.
//! 3. **Phases**: for each plan phase, cables feeding the phase accumulate into
//!    per-node input buffers (ascending cable id), then the phase's nodes
//!    write their input compartments and advance with the clamp overrides.
//!    Wavefront phases update their nodes in parallel.
//! 4. **Plasticity**: every plastic cable learns from the signal it
//!    transmitted and its destination's spikes, in parallel across cables.
//! 5. **Commit**: time and step count advance; warnings are reported.

use crate::cable::{Cable, Coupling};
use crate::clamp::{ClampKey, ClampValue};
use crate::compiler::CompiledGraph;
use crate::error::{SimError, SimResult};
use crate::lifecycle::Lifecycle;
use crate::node::Node;
use crate::plan::{ExecOrder, ExecutionPlan, PlanOp};
use crate::report::{RunReport, StepReport, StepWarning};
use ndarray::{Array1, ArrayView1, ArrayView2};
use neurograph_config::SimulationConfig;
use neurograph_npu_neural::{CableId, NodeId, Overrides, StepContext, UpdateOutcome};
use neurograph_npu_plasticity::{PlasticityContext, PlasticityOutcome};
use rayon::prelude::*;
use std::sync::OnceLock;
use tracing::{info, trace, warn};

/// Runtime-gated step tracing.
/// Enable with:
/// - NEUROGRAPH_TRACE_STEP=1
/// Optional filter:
/// - NEUROGRAPH_TRACE_NODE=<u32 node id>
struct StepTraceCfg {
    enabled: bool,
    node_filter: Option<u32>,
}

fn step_trace_cfg() -> &'static StepTraceCfg {
    static CFG: OnceLock<StepTraceCfg> = OnceLock::new();
    CFG.get_or_init(|| {
        let enabled = std::env::var("NEUROGRAPH_TRACE_STEP")
            .ok()
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let node_filter = std::env::var("NEUROGRAPH_TRACE_NODE")
            .ok()
            .and_then(|v| v.parse().ok());

        StepTraceCfg {
            enabled,
            node_filter,
        }
    })
}

/// Settings read on every step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSettings {
    /// Potentials beyond `±potential_bound` are saturated
    pub potential_bound: f32,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            potential_bound: 1.0e4,
        }
    }
}

impl StepSettings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            potential_bound: config.potential_bound,
        }
    }
}

/// What `reset_with` restores besides node state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetOptions {
    /// Restore every cable's weights to their compiled values
    pub reinitialize_weights: bool,
}

/// Input buffers for one step: `[node][compartment] -> accumulated input`
type PendingInputs = Vec<Vec<Option<Array1<f32>>>>;

/// Runs a compiled graph
#[derive(Debug, Clone)]
pub struct Simulator {
    pub(crate) graph: CompiledGraph,
    lifecycle: Lifecycle,
    time: f64,
    step: u64,
    settings: StepSettings,
}

impl Simulator {
    pub fn new(graph: CompiledGraph) -> Self {
        Self::with_settings(graph, StepSettings::default())
    }

    pub fn with_settings(graph: CompiledGraph, settings: StepSettings) -> Self {
        Self {
            graph,
            lifecycle: Lifecycle::Compiled,
            time: 0.0,
            step: 0,
            settings,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Simulation time at the end of the last step
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn settings(&self) -> StepSettings {
        self.settings
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.graph.plan
    }

    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.graph
            .nodes
            .iter()
            .find(|node| node.name == name)
            .map(|node| node.id)
    }

    pub fn cable_id(&self, name: &str) -> Option<CableId> {
        self.graph
            .cables
            .iter()
            .find(|cable| cable.name == name)
            .map(|cable| cable.id)
    }

    pub(crate) fn node(&self, id: NodeId) -> SimResult<&Node> {
        self.graph
            .nodes
            .get(id.index())
            .ok_or_else(|| SimError::UnknownNode(id.to_string()))
    }

    pub(crate) fn cable(&self, id: CableId) -> SimResult<&Cable> {
        self.graph
            .cables
            .get(id.index())
            .ok_or_else(|| SimError::UnknownCable(id.to_string()))
    }

    fn cable_mut(&mut self, id: CableId) -> SimResult<&mut Cable> {
        self.graph
            .cables
            .get_mut(id.index())
            .ok_or_else(|| SimError::UnknownCable(id.to_string()))
    }

    fn clamp_key(&self, node: NodeId, compartment: &str) -> SimResult<ClampKey> {
        let target = self.node(node)?;
        let key = ClampKey {
            node,
            compartment: target.compartment(compartment)?,
        };
        if !self.graph.clamps.is_site(key) {
            return Err(SimError::UnknownCompartment {
                node: target.name.clone(),
                compartment: format!("{} (not a clamp site)", compartment),
            });
        }
        Ok(key)
    }

    /// Force `node.compartment` to `value` from the next step on
    ///
    /// The value is checked against the compartment when the next step runs.
    /// Setting the same clamp twice is the same as setting it once.
    pub fn set_clamp(
        &mut self,
        node: NodeId,
        compartment: &str,
        value: impl Into<ClampValue>,
    ) -> SimResult<()> {
        let key = self.clamp_key(node, compartment)?;
        self.graph.clamps.set(key, value.into());
        Ok(())
    }

    /// Release a clamp; clearing a free site is a no-op
    pub fn clear_clamp(&mut self, node: NodeId, compartment: &str) -> SimResult<()> {
        let key = self.clamp_key(node, compartment)?;
        self.graph.clamps.clear(key);
        Ok(())
    }

    /// Current values of `node.compartment`
    pub fn get_compartment(&self, node: NodeId, compartment: &str) -> SimResult<ArrayView1<'_, f32>> {
        let target = self.node(node)?;
        let index = target.compartment(compartment)?;
        target
            .state
            .view(index)
            .ok_or_else(|| SimError::UnknownCompartment {
                node: target.name.clone(),
                compartment: compartment.to_string(),
            })
    }

    /// Current `(n_src, n_dst)` weights of a cable
    pub fn cable_weights(&self, cable: CableId) -> SimResult<ArrayView2<'_, f32>> {
        Ok(self.cable(cable)?.weights.view())
    }

    /// Set the third factor `r` of a modulated plastic cable
    pub fn set_modulator(&mut self, cable: CableId, value: f32) -> SimResult<()> {
        let target = self.cable_mut(cable)?;
        match target.plasticity.as_mut() {
            Some(state) => Ok(state.set_modulator(value)?),
            None => Err(SimError::InvalidParameters(format!(
                "cable '{}' is not plastic",
                target.name
            ))),
        }
    }

    /// Advance the whole graph by `dt`
    pub fn step(&mut self, dt: f32) -> SimResult<StepReport> {
        if !self.lifecycle.can_step() {
            return Err(SimError::InvalidTransition {
                action: "step",
                state: self.lifecycle,
            });
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidParameters(format!(
                "dt must be positive and finite, got {}",
                dt
            )));
        }
        let resolved = self.graph.clamps.resolve(self.step, &self.graph.nodes)?;

        // Nothing below can fail
        let end_time = self.time + f64::from(dt);
        let ctx = StepContext::new(dt, end_time as f32, self.settings.potential_bound);
        let next_step = self.step + 1;

        let mut signals = self.snapshot_delayed_signals();
        let mut pending: PendingInputs = self
            .graph
            .nodes
            .iter()
            .map(|node| vec![None; node.state.compartment_count()])
            .collect();

        let mut report = StepReport {
            step: next_step,
            time: end_time,
            ..StepReport::default()
        };

        let exec_order = self.graph.plan.options.exec_order;
        let nodes = &mut self.graph.nodes;
        let cables = &mut self.graph.cables;
        let plan = &self.graph.plan;

        for phase in &plan.phases {
            for op in &phase.ops {
                match op {
                    PlanOp::Propagate(id) => {
                        propagate(&cables[id.index()], nodes.as_slice(), &mut signals, &mut pending)
                    }
                    PlanOp::PropagateFused { cables: ids, .. } => {
                        for id in ids {
                            propagate(
                                &cables[id.index()],
                                nodes.as_slice(),
                                &mut signals,
                                &mut pending,
                            );
                        }
                    }
                }
            }

            let outcomes: Vec<(NodeId, UpdateOutcome)> = match exec_order {
                ExecOrder::Sequential => phase
                    .updates
                    .iter()
                    .map(|&id| {
                        let node = &mut nodes[id.index()];
                        let outcome =
                            update_node(node, &pending[id.index()], &resolved[id.index()], &ctx);
                        (id, outcome)
                    })
                    .collect(),
                ExecOrder::Wavefront => {
                    let mut in_phase = vec![false; nodes.len()];
                    for id in &phase.updates {
                        in_phase[id.index()] = true;
                    }
                    nodes
                        .par_iter_mut()
                        .filter(|node| in_phase[node.id.index()])
                        .map(|node| {
                            let index = node.id.index();
                            let outcome =
                                update_node(node, &pending[index], &resolved[index], &ctx);
                            (node.id, outcome)
                        })
                        .collect()
                }
            };

            for (id, outcome) in outcomes {
                record_outcome(&mut report, &nodes[id.index()], outcome);
            }
        }

        let plasticity_ctx = PlasticityContext {
            dt,
            time: ctx.time,
        };
        let nodes_ref: &[Node] = nodes.as_slice();
        let learned: Vec<(CableId, PlasticityOutcome)> = cables
            .par_iter_mut()
            .filter(|cable| cable.plasticity.is_some())
            .filter_map(|cable| {
                let pre = signals[cable.id.index()].as_ref()?;
                let dest = &nodes_ref[cable.dest.node.index()];
                let Cable {
                    id,
                    weights,
                    mask,
                    plasticity,
                    ..
                } = cable;
                let plasticity = plasticity.as_mut()?;
                let post_name = if plasticity.rule().needs_spikes() {
                    dest.model.spike_compartment()?
                } else {
                    dest.model.output_compartment()
                };
                let post = dest.state.view(dest.model.compartment_index(post_name)?)?;
                let outcome = plasticity.apply(weights, pre.view(), post, plasticity_ctx);
                if let Some(mask) = mask.as_ref() {
                    *weights *= mask;
                }
                Some((*id, outcome))
            })
            .collect();

        for (cable, outcome) in learned {
            if outcome.updated {
                report.plasticity_updates += 1;
            }
            if outcome.trace_saturations > 0 {
                warn!(
                    target: "neurograph_npu_engine",
                    "[STEP {}] trace saturation on {} ({} entries)",
                    next_step, cable, outcome.trace_saturations
                );
                report.warnings.push(StepWarning::TraceSaturation {
                    cable,
                    units: outcome.trace_saturations,
                });
            }
        }

        self.time = end_time;
        self.step = next_step;
        self.lifecycle = Lifecycle::Running;

        let trace_cfg = step_trace_cfg();
        if trace_cfg.enabled {
            trace!(
                target: "neurograph_npu_engine",
                "[STEP {}] t={:.4} spikes={:?} plastic_updates={}",
                report.step, report.time, report.spikes, report.plasticity_updates
            );
            for node in &self.graph.nodes {
                if trace_cfg.node_filter.is_some_and(|id| id != node.id.0) {
                    continue;
                }
                for (index, spec) in node.model.compartments().iter().enumerate() {
                    trace!(
                        target: "neurograph_npu_engine",
                        "[STEP {}] {}.{} = {:?}",
                        report.step, node.name, spec.name, node.state.view(index)
                    );
                }
            }
        }

        Ok(report)
    }

    /// Take `n_steps` steps of `dt`
    ///
    /// Stops at the first failing step; steps before it stay committed.
    pub fn run(&mut self, n_steps: usize, dt: f32) -> SimResult<RunReport> {
        let mut run = RunReport {
            steps: Vec::with_capacity(n_steps),
        };
        for _ in 0..n_steps {
            run.steps.push(self.step(dt)?);
        }
        Ok(run)
    }

    /// Restore initial node states and traces, keeping learned weights
    pub fn reset(&mut self) -> SimResult<()> {
        self.reset_with(ResetOptions::default())
    }

    pub fn reset_with(&mut self, options: ResetOptions) -> SimResult<()> {
        if self.lifecycle == Lifecycle::Halted {
            return Err(SimError::InvalidTransition {
                action: "reset",
                state: self.lifecycle,
            });
        }
        for node in &mut self.graph.nodes {
            node.restore_initial();
        }
        for cable in &mut self.graph.cables {
            if let Some(plasticity) = cable.plasticity.as_mut() {
                plasticity.reset();
            }
            if options.reinitialize_weights {
                cable.restore_initial_weights();
            }
        }
        info!(
            target: "neurograph_npu_engine",
            "reset after {} steps (weights {})",
            self.step,
            if options.reinitialize_weights { "reinitialized" } else { "kept" }
        );
        self.time = 0.0;
        self.step = 0;
        self.lifecycle = Lifecycle::Compiled;
        Ok(())
    }

    /// Stop for good; further steps and resets are rejected
    pub fn halt(&mut self) {
        if self.lifecycle != Lifecycle::Halted {
            info!(target: "neurograph_npu_engine", "halted at step {}", self.step);
            self.lifecycle = Lifecycle::Halted;
        }
    }

    fn snapshot_delayed_signals(&self) -> Vec<Option<Array1<f32>>> {
        self.graph
            .cables
            .iter()
            .map(|cable| match cable.coupling {
                Coupling::Delayed => source_signal(cable, &self.graph.nodes),
                Coupling::SameStep => None,
            })
            .collect()
    }
}

fn source_signal(cable: &Cable, nodes: &[Node]) -> Option<Array1<f32>> {
    nodes[cable.source.node.index()]
        .state
        .view(cable.source.compartment)
        .map(|view| view.to_owned())
}

/// Add one cable's contribution to its destination buffer
///
/// Same-step cables read their (already updated) source here and record the
/// signal for plasticity.
fn propagate(
    cable: &Cable,
    nodes: &[Node],
    signals: &mut [Option<Array1<f32>>],
    pending: &mut PendingInputs,
) {
    let slot = &mut signals[cable.id.index()];
    if slot.is_none() {
        *slot = source_signal(cable, nodes);
    }
    let Some(signal) = slot.as_ref() else {
        return;
    };
    let n_dest = nodes[cable.dest.node.index()].n_units();
    let acc = pending[cable.dest.node.index()][cable.dest.compartment]
        .get_or_insert_with(|| Array1::zeros(n_dest));
    cable.transmit(signal.view(), acc);
}

fn update_node(
    node: &mut Node,
    pending: &[Option<Array1<f32>>],
    overrides: &[Option<Array1<f32>>],
    ctx: &StepContext,
) -> UpdateOutcome {
    let inputs: Vec<usize> = node.input_compartments().collect();
    for index in inputs {
        match pending.get(index).and_then(|slot| slot.as_ref()) {
            Some(values) => node.state.assign(index, values),
            None => node.state.fill(index, 0.0),
        }
    }
    node.model
        .advance(&mut node.state, ctx, &Overrides::new(overrides))
}

fn record_outcome(report: &mut StepReport, node: &Node, outcome: UpdateOutcome) {
    if outcome.spikes > 0 {
        report.spikes.push((node.id, outcome.spikes));
    }
    for saturation in outcome.saturations {
        warn!(
            target: "neurograph_npu_engine",
            "[STEP {}] numeric instability in {}.{}: {} units saturated",
            report.step, node.name, saturation.compartment, saturation.units
        );
        report.warnings.push(StepWarning::NumericInstability {
            node: node.id,
            compartment: saturation.compartment,
            units: saturation.units,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::cable::CableSpec;
    use crate::plan::CompileOptions;
    use neurograph_npu_neural::{GradedParameters, LifParameters, NodeModel, WeightInit};

    fn scenario() -> (Simulator, NodeId, NodeId) {
        let mut builder = GraphBuilder::new();
        let a = builder
            .add_node("A", NodeModel::Graded(GradedParameters::default()), 1)
            .unwrap();
        let b = builder
            .add_node(
                "B",
                NodeModel::Lif(
                    LifParameters::default()
                        .with_tau_m(2.0)
                        .with_refractory(2.0)
                        .with_threshold(1.0),
                ),
                1,
            )
            .unwrap();
        builder
            .add_cable(CableSpec::new("ab", a, "z", b, "j").with_weights(WeightInit::constant(1.5)))
            .unwrap();
        builder.add_clamp_site(a, "z").unwrap();
        let graph = builder.compile(CompileOptions::default()).unwrap();
        (Simulator::new(graph), a, b)
    }

    #[test]
    fn test_step_requires_positive_dt() {
        let (mut sim, _, _) = scenario();
        assert!(matches!(sim.step(0.0), Err(SimError::InvalidParameters(_))));
        assert!(matches!(sim.step(f32::NAN), Err(SimError::InvalidParameters(_))));
        assert_eq!(sim.lifecycle(), Lifecycle::Compiled);
        assert_eq!(sim.step_count(), 0);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let (mut sim, _, _) = scenario();
        assert_eq!(sim.lifecycle(), Lifecycle::Compiled);
        sim.step(1.0).unwrap();
        assert_eq!(sim.lifecycle(), Lifecycle::Running);
        sim.reset().unwrap();
        assert_eq!(sim.lifecycle(), Lifecycle::Compiled);
        sim.halt();
        assert_eq!(
            sim.step(1.0),
            Err(SimError::InvalidTransition {
                action: "step",
                state: Lifecycle::Halted
            })
        );
        assert!(sim.reset().is_err());
    }

    #[test]
    fn test_delayed_cable_reads_previous_step() {
        let (mut sim, a, b) = scenario();
        sim.set_clamp(a, "z", 1.0_f32).unwrap();
        sim.step(1.0).unwrap();
        assert_eq!(sim.get_compartment(a, "z").unwrap()[0], 1.0);
        assert_eq!(sim.get_compartment(b, "j").unwrap()[0], 0.0);
        sim.step(1.0).unwrap();
        assert_eq!(sim.get_compartment(b, "j").unwrap()[0], 1.5);
        assert_eq!(sim.get_compartment(b, "v").unwrap()[0], 0.75);
    }

    #[test]
    fn test_bad_clamp_fails_atomically() {
        let (mut sim, a, b) = scenario();
        sim.set_clamp(a, "z", 1.0_f32).unwrap();
        sim.step(1.0).unwrap();
        let before = sim.clone();
        sim.set_clamp(a, "z", vec![1.0_f32, 2.0]).unwrap();
        assert!(matches!(
            sim.step(1.0),
            Err(SimError::ClampTypeMismatch { .. })
        ));
        assert_eq!(sim.step_count(), before.step_count());
        assert_eq!(sim.time(), before.time());
        assert_eq!(
            sim.get_compartment(b, "v").unwrap(),
            before.get_compartment(b, "v").unwrap()
        );
    }

    #[test]
    fn test_clamp_requires_declared_site() {
        let (mut sim, _, b) = scenario();
        assert!(matches!(
            sim.set_clamp(b, "v", 0.5_f32),
            Err(SimError::UnknownCompartment { .. })
        ));
        assert!(matches!(
            sim.set_clamp(NodeId(7), "v", 0.5_f32),
            Err(SimError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_modulator_needs_plastic_cable() {
        let (mut sim, _, _) = scenario();
        let cable = sim.cable_id("ab").unwrap();
        assert!(matches!(
            sim.set_modulator(cable, 1.0),
            Err(SimError::InvalidParameters(_))
        ));
        assert!(matches!(
            sim.set_modulator(CableId(3), 1.0),
            Err(SimError::UnknownCable(_))
        ));
    }
}
