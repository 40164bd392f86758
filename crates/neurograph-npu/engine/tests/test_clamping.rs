// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0
//! Clamp table behavior observed through the simulator.

use neurograph_npu_engine::{
    CableSpec, ClampValue, CompileOptions, GraphBuilder, SimError, Simulator,
};
use neurograph_npu_neural::{GradedParameters, LifParameters, NodeId, NodeModel, WeightInit};

struct Net {
    sim: Simulator,
    input: NodeId,
    cell: NodeId,
}

fn network() -> Net {
    let mut builder = GraphBuilder::new();
    let input = builder
        .add_node("input", NodeModel::Graded(GradedParameters::default()), 3)
        .unwrap();
    let cell = builder
        .add_node("cell", NodeModel::Lif(LifParameters::default()), 3)
        .unwrap();
    builder
        .add_cable(
            CableSpec::new("drive", input, "z", cell, "j").with_weights(WeightInit::constant(0.4)),
        )
        .unwrap();
    for compartment in ["z", "j"] {
        builder.add_clamp_site(input, compartment).unwrap();
    }
    for compartment in ["v", "s", "rfr"] {
        builder.add_clamp_site(cell, compartment).unwrap();
    }
    let sim = Simulator::new(builder.compile(CompileOptions::default()).unwrap());
    Net { sim, input, cell }
}

#[test]
fn test_clamped_value_is_read_back_exactly() {
    let mut net = network();
    net.sim.set_clamp(net.input, "z", 0.123_456_7_f32).unwrap();
    net.sim.set_clamp(net.cell, "v", vec![-0.5_f32, 0.25, 0.75]).unwrap();

    for _ in 0..5 {
        net.sim.step(0.5).unwrap();
        assert_eq!(
            net.sim.get_compartment(net.input, "z").unwrap().to_vec(),
            vec![0.123_456_7; 3]
        );
        assert_eq!(
            net.sim.get_compartment(net.cell, "v").unwrap().to_vec(),
            vec![-0.5, 0.25, 0.75]
        );
    }
}

#[test]
fn test_set_clamp_is_idempotent() {
    let mut once = network();
    let mut twice = network();
    once.sim.set_clamp(once.input, "z", 1.0_f32).unwrap();
    twice.sim.set_clamp(twice.input, "z", 1.0_f32).unwrap();
    twice.sim.set_clamp(twice.input, "z", 1.0_f32).unwrap();

    let a = once.sim.run(10, 1.0).unwrap();
    let b = twice.sim.run(10, 1.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        once.sim.get_compartment(once.cell, "v").unwrap(),
        twice.sim.get_compartment(twice.cell, "v").unwrap()
    );
}

#[test]
fn test_clear_clamp_releases_compartment() {
    let mut net = network();
    net.sim.set_clamp(net.cell, "v", 0.5_f32).unwrap();
    net.sim.step(1.0).unwrap();
    net.sim.clear_clamp(net.cell, "v").unwrap();
    net.sim.step(1.0).unwrap();
    let v = net.sim.get_compartment(net.cell, "v").unwrap()[0];
    assert!(v < 0.5, "v should leak toward rest once released, got {}", v);

    // Clearing again is a no-op
    net.sim.clear_clamp(net.cell, "v").unwrap();
    assert_eq!(net.sim.graph().clamps().active_count(), 0);
}

#[test]
fn test_clamps_persist_across_reset() {
    let mut net = network();
    net.sim.set_clamp(net.input, "z", 2.0_f32).unwrap();
    net.sim.run(3, 1.0).unwrap();
    net.sim.reset().unwrap();
    assert_eq!(net.sim.graph().clamps().active_count(), 1);
    net.sim.step(1.0).unwrap();
    assert_eq!(net.sim.get_compartment(net.input, "z").unwrap()[0], 2.0);
}

#[test]
fn test_spike_clamp_forces_spikes_only() {
    let mut net = network();
    net.sim.set_clamp(net.cell, "s", 1.0_f32).unwrap();
    let report = net.sim.step(1.0).unwrap();
    assert_eq!(report.spikes_of(net.cell), 3);
    assert_eq!(net.sim.get_compartment(net.cell, "s").unwrap().to_vec(), vec![1.0; 3]);
    // A forced spike does not reset or start a refractory period
    assert_eq!(net.sim.get_compartment(net.cell, "rfr").unwrap().to_vec(), vec![0.0; 3]);
    assert_eq!(net.sim.get_compartment(net.cell, "tols").unwrap().to_vec(), vec![1.0; 3]);
}

#[test]
fn test_non_binary_spike_clamp_fails_step_atomically() {
    let mut net = network();
    net.sim.set_clamp(net.input, "z", 1.0_f32).unwrap();
    net.sim.run(2, 1.0).unwrap();
    let v_before = net.sim.get_compartment(net.cell, "v").unwrap().to_owned();
    let z_before = net.sim.get_compartment(net.input, "z").unwrap().to_owned();

    net.sim.set_clamp(net.cell, "s", 0.5_f32).unwrap();
    let err = net.sim.step(1.0).unwrap_err();
    assert!(matches!(err, SimError::ClampTypeMismatch { ref compartment, .. } if compartment == "s"));

    assert_eq!(net.sim.step_count(), 2);
    assert_eq!(net.sim.time(), 2.0);
    assert_eq!(net.sim.get_compartment(net.cell, "v").unwrap(), v_before);
    assert_eq!(net.sim.get_compartment(net.input, "z").unwrap(), z_before);

    // Fixing the clamp lets stepping continue
    net.sim.set_clamp(net.cell, "s", 0.0_f32).unwrap();
    assert!(net.sim.step(1.0).is_ok());
}

#[test]
fn test_schedule_clamp_follows_step_count() {
    let mut net = network();
    let schedule = ClampValue::Schedule(vec![vec![1.0], vec![0.0, 1.0, 0.0], vec![0.0]]);
    net.sim.set_clamp(net.cell, "s", schedule).unwrap();
    let run = net.sim.run(4, 1.0).unwrap();
    assert_eq!(run.spike_train(net.cell), vec![3, 1, 0, 0]);
}

#[test]
fn test_unknown_compartment_and_non_sites() {
    let mut net = network();
    assert!(matches!(
        net.sim.set_clamp(net.cell, "nope", 1.0_f32),
        Err(SimError::UnknownCompartment { .. })
    ));
    assert!(matches!(
        net.sim.set_clamp(net.cell, "tols", 1.0_f32),
        Err(SimError::UnknownCompartment { .. })
    ));
    assert!(matches!(
        net.sim.get_compartment(net.cell, "nope"),
        Err(SimError::UnknownCompartment { .. })
    ));
    assert!(matches!(
        net.sim.clear_clamp(NodeId(42), "v"),
        Err(SimError::UnknownNode(_))
    ));
}
