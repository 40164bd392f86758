// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0
//! End-to-end: the reference two-node network through the umbrella crate.

use neurograph::config::{ExecOrderSetting, SimulationConfig};
use neurograph::prelude::*;
use neurograph::scenario::{two_node, TwoNodeScenario, CABLE_WEIGHT, SOURCE_CLAMP};

const EXPECTED_TRAIN: [usize; 12] = [0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1];

fn scenario() -> TwoNodeScenario {
    two_node(CompileOptions::default(), StepSettings::default()).unwrap()
}

#[test]
fn test_spike_train_matches_hand_computed_values() {
    let mut s = scenario();

    // Step 1: the delayed cable still sees the initial a.z = 0
    s.sim.step(1.0).unwrap();
    assert_eq!(s.sim.get_compartment(s.source, "z").unwrap()[0], SOURCE_CLAMP);
    assert_eq!(s.sim.get_compartment(s.target, "j").unwrap()[0], 0.0);
    assert_eq!(s.sim.get_compartment(s.target, "v").unwrap()[0], 0.0);

    // Step 2: j = 1.5, v = 0 + 1/2 * (0 + 1.5)
    s.sim.step(1.0).unwrap();
    assert_eq!(s.sim.get_compartment(s.target, "j").unwrap()[0], CABLE_WEIGHT);
    assert_eq!(s.sim.get_compartment(s.target, "v").unwrap()[0], 0.75);

    // Step 3: v = 0.75 + 1/2 * (-0.75 + 1.5) = 1.125 >= 1 -> spike and reset
    let report = s.sim.step(1.0).unwrap();
    assert_eq!(report.spikes_of(s.target), 1);
    assert_eq!(s.sim.get_compartment(s.target, "v").unwrap()[0], 0.0);
    assert_eq!(s.sim.get_compartment(s.target, "rfr").unwrap()[0], 2.0);
    assert_eq!(s.sim.get_compartment(s.target, "tols").unwrap()[0], 3.0);
}

#[test]
fn test_spike_train_is_exactly_reproducible() {
    let first = scenario().sim.run(EXPECTED_TRAIN.len(), 1.0).unwrap();
    let second = scenario().sim.run(EXPECTED_TRAIN.len(), 1.0).unwrap();
    assert_eq!(first.spike_train(NodeId(1)), EXPECTED_TRAIN.to_vec());
    assert_eq!(first, second);
}

#[test]
fn test_reset_replays_the_same_train() {
    let mut s = scenario();
    let first = s.sim.run(EXPECTED_TRAIN.len(), 1.0).unwrap();
    s.sim.reset().unwrap();
    let second = s.sim.run(EXPECTED_TRAIN.len(), 1.0).unwrap();
    assert_eq!(first.spike_train(s.target), second.spike_train(s.target));
    assert_eq!(s.sim.cable_weights(s.cable).unwrap()[[0, 0]], CABLE_WEIGHT);
}

#[test]
fn test_every_strategy_from_config_agrees() {
    for exec_order in [ExecOrderSetting::Sequential, ExecOrderSetting::Wavefront] {
        for use_graph_optimization in [false, true] {
            let config = SimulationConfig {
                exec_order,
                use_graph_optimization,
                ..SimulationConfig::default()
            };
            let mut s = two_node(
                CompileOptions::from_config(&config),
                StepSettings::from_config(&config),
            )
            .unwrap();
            let run = s.sim.run(EXPECTED_TRAIN.len(), config.dt).unwrap();
            assert_eq!(run.spike_train(s.target), EXPECTED_TRAIN.to_vec());
        }
    }
}

#[test]
fn test_snapshot_restores_a_running_network() {
    let mut s = scenario();
    s.sim.run(4, 1.0).unwrap();

    let json = s.sim.snapshot().to_json().unwrap();
    let mut restored = ModelSnapshot::from_json(&json)
        .unwrap()
        .restore(StepSettings::default())
        .unwrap();
    assert_eq!(restored.topology(), s.sim.topology());

    // The restored copy starts from initial state with the clamp still active
    let run = restored.run(EXPECTED_TRAIN.len(), 1.0).unwrap();
    assert_eq!(run.spike_train(s.target), EXPECTED_TRAIN.to_vec());
}

#[test]
fn test_topology_export_lists_both_nodes() {
    let topology = scenario().sim.topology();
    assert_eq!(topology.nodes.len(), 2);
    assert_eq!(topology.cables.len(), 1);
    assert_eq!(topology.cables[0].weight_shape, (1, 1));
    assert!(!topology.cables[0].plastic);

    let json: serde_json::Value = serde_json::from_str(&topology.to_json().unwrap()).unwrap();
    assert_eq!(json["nodes"][1]["name"], "b");
}
