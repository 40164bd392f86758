// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0
//! Execution strategy equivalence, reproducibility and reset behavior.
//!
//! The same network is run under every combination of execution order and
//! graph optimization; node state and weights must match bit for bit.

use neurograph_npu_engine::{
    CableSpec, ClampValue, CompileOptions, ExecOrder, GraphBuilder, Simulator,
};
use neurograph_npu_neural::{
    Activation, AdExParameters, DenseTransform, GradedParameters, LifParameters, NodeModel,
    WeightInit,
};
use neurograph_npu_plasticity::PlasticityRule;

const STEPS: usize = 60;
const DT: f32 = 0.5;

/// Input layer fanning out to three spiking layers with same-step,
/// delayed, recurrent and plastic cables
fn build_network(options: CompileOptions) -> Simulator {
    let mut builder = GraphBuilder::new();
    let sensor = builder
        .add_node(
            "sensor",
            NodeModel::Graded(GradedParameters {
                activation: Activation::Relu,
                ..GradedParameters::default()
            }),
            4,
        )
        .unwrap();
    let hidden_a = builder
        .add_node(
            "hidden_a",
            NodeModel::Lif(LifParameters::default().with_tau_m(4.0).with_threshold(0.6)),
            6,
        )
        .unwrap();
    let hidden_b = builder
        .add_node("hidden_b", NodeModel::AdEx(AdExParameters::default()), 5)
        .unwrap();
    let output = builder
        .add_node(
            "output",
            NodeModel::Lif(LifParameters::default().with_tau_m(3.0).with_threshold(0.8)),
            3,
        )
        .unwrap();

    builder
        .add_cable(
            CableSpec::new("sensor_a", sensor, "r", hidden_a, "j")
                .with_weights(WeightInit::uniform(0.2, 1.2))
                .with_seed(11)
                .same_step(),
        )
        .unwrap();
    builder
        .add_cable(
            CableSpec::new("sensor_b", sensor, "r", hidden_b, "j")
                .with_weights(WeightInit::uniform(0.5, 2.5))
                .with_connection_probability(0.7)
                .with_seed(12)
                .same_step(),
        )
        .unwrap();
    builder
        .add_cable(
            CableSpec::new("a_out", hidden_a, "s", output, "j")
                .with_weights(WeightInit::uniform(0.1, 0.9))
                .with_seed(13)
                .same_step()
                .with_plasticity(PlasticityRule::exponential().with_amplitudes(0.05, 0.04)),
        )
        .unwrap();
    builder
        .add_cable(
            CableSpec::new("b_out", hidden_b, "s", output, "j")
                .with_weights(WeightInit::uniform(0.1, 0.9))
                .with_seed(14)
                .with_transform(DenseTransform::default().with_resist_scale(1.5)),
        )
        .unwrap();
    builder
        .add_cable(
            CableSpec::new("out_inhibits_a", output, "s", hidden_a, "j")
                .with_weights(WeightInit::constant(0.3))
                .inhibitory(),
        )
        .unwrap();
    builder
        .add_cable(
            CableSpec::new("a_recurrent", hidden_a, "s", hidden_a, "j")
                .with_weights(WeightInit::uniform(0.0, 0.2))
                .with_seed(15),
        )
        .unwrap();
    builder.add_clamp_site(sensor, "j").unwrap();

    let mut sim = Simulator::new(builder.compile(options).unwrap());
    let frames: Vec<Vec<f32>> = (0..STEPS)
        .map(|step| {
            (0..4)
                .map(|unit| ((step * 7 + unit * 3) % 5) as f32 * 0.6)
                .collect()
        })
        .collect();
    sim.set_clamp(sensor, "j", ClampValue::Schedule(frames)).unwrap();
    sim
}

/// Every compartment of every node plus every weight, as raw bits
fn fingerprint(sim: &Simulator) -> Vec<u32> {
    let mut bits = Vec::new();
    for node in sim.graph().nodes() {
        for spec in node.model().compartments() {
            let values = sim.get_compartment(node.id(), spec.name).unwrap();
            bits.extend(values.iter().map(|v| v.to_bits()));
        }
    }
    for cable in sim.graph().cables() {
        bits.extend(cable.weights().iter().map(|w| w.to_bits()));
    }
    bits
}

fn run(options: CompileOptions) -> (Vec<u32>, Vec<usize>) {
    let mut sim = build_network(options);
    let report = sim.run(STEPS, DT).unwrap();
    let output = sim.node_id("output").unwrap();
    (fingerprint(&sim), report.spike_train(output))
}

#[test]
fn test_strategies_are_bitwise_identical() {
    let reference = run(CompileOptions::default().with_optimization(false));
    assert!(
        reference.1.iter().sum::<usize>() > 0,
        "network should be active enough to exercise plasticity"
    );

    for exec_order in [ExecOrder::Sequential, ExecOrder::Wavefront] {
        for optimize in [false, true] {
            let options = CompileOptions::default()
                .with_exec_order(exec_order)
                .with_optimization(optimize);
            assert_eq!(run(options), reference, "{:?}", options);
        }
    }
}

#[test]
fn test_runs_are_reproducible() {
    let options = CompileOptions::default().with_exec_order(ExecOrder::Wavefront);
    assert_eq!(run(options), run(options));
}

#[test]
fn test_reset_restores_initial_state_and_keeps_weights() {
    let fresh = build_network(CompileOptions::default());
    let mut sim = build_network(CompileOptions::default());
    let first = sim.run(STEPS, DT).unwrap();
    let learned: Vec<_> = sim
        .graph()
        .cables()
        .iter()
        .map(|cable| cable.weights().clone())
        .collect();

    sim.reset().unwrap();
    assert_eq!(sim.step_count(), 0);
    assert_eq!(sim.time(), 0.0);
    assert_eq!(sim.topology(), fresh.topology());
    for node in sim.graph().nodes() {
        for spec in node.model().compartments() {
            assert_eq!(
                sim.get_compartment(node.id(), spec.name).unwrap(),
                fresh.get_compartment(node.id(), spec.name).unwrap(),
                "{}.{}",
                node.name(),
                spec.name
            );
        }
    }
    for (cable, weights) in sim.graph().cables().iter().zip(&learned) {
        assert_eq!(cable.weights(), weights);
    }

    // Replaying with learned weights still follows the clamp schedule from step 0
    let second = sim.run(STEPS, DT).unwrap();
    assert_eq!(first.steps.len(), second.steps.len());
    let sensor = sim.node_id("sensor").unwrap();
    assert_eq!(first.spike_train(sensor), second.spike_train(sensor));
}
