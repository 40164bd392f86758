// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reference two-node network
//!
//! A graded node `a` with its state `z` clamped to 1.0 drives a LIF node `b`
//! (tau_m 2, threshold 1, refractory 2) through a 1.5-weight cable from
//! `a.z` into `b.j`. With `dt = 1` the cable is delayed by one step, so `b`
//! charges to 0.75 and 1.125 and then fires every third step.

use neurograph_npu_engine::{
    CableSpec, CompileOptions, GraphBuilder, SimResult, Simulator, StepSettings,
};
use neurograph_npu_neural::{
    CableId, GradedParameters, LifParameters, NodeId, NodeModel, WeightInit,
};

pub const SOURCE_CLAMP: f32 = 1.0;
pub const CABLE_WEIGHT: f32 = 1.5;

pub struct TwoNodeScenario {
    pub sim: Simulator,
    pub source: NodeId,
    pub target: NodeId,
    pub cable: CableId,
}

/// Build, compile and clamp the two-node network
pub fn two_node(options: CompileOptions, settings: StepSettings) -> SimResult<TwoNodeScenario> {
    let mut builder = GraphBuilder::new();
    let source = builder.add_node("a", NodeModel::Graded(GradedParameters::default()), 1)?;
    let target = builder.add_node(
        "b",
        NodeModel::Lif(
            LifParameters::default()
                .with_tau_m(2.0)
                .with_threshold(1.0)
                .with_refractory(2.0),
        ),
        1,
    )?;
    let cable = builder.add_cable(
        CableSpec::new("a_to_b", source, "z", target, "j")
            .with_weights(WeightInit::constant(CABLE_WEIGHT)),
    )?;
    builder.add_clamp_site(source, "z")?;

    let mut sim = Simulator::with_settings(builder.compile(options)?, settings);
    sim.set_clamp(source, "z", SOURCE_CLAMP)?;

    Ok(TwoNodeScenario {
        sim,
        source,
        target,
        cable,
    })
}
