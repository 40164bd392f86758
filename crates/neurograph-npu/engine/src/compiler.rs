// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Graph Compiler
//!
//! Turns declared nodes and cables into a fixed execution plan.
//!
//! ## Algorithm
//! 1. Only `SameStep` cables create intra-step dependencies (source before
//!    destination). `Delayed` cables read the start-of-step snapshot and add
//!    no edge, which is what makes recurrent graphs legal.
//! 2. Kahn's algorithm with a min-heap on node id gives a stable,
//!    declaration-ordered topological order. Nodes left over are on a
//!    same-step cycle and compilation fails.
//! 3. Phases are built per [`ExecOrder`]: one node per phase, or one
//!    topological level per phase.
//! 4. Within a phase, cables feeding the phase's nodes propagate in ascending
//!    cable id before any node updates. Every strategy therefore sums a
//!    destination's inputs in the same order.
//! 5. Optional optimization fuses cables sharing a destination compartment
//!    into a single op with one accumulation buffer.

use crate::cable::{Cable, Endpoint};
use crate::clamp::{ClampKey, ClampTable};
use crate::error::{SimError, SimResult};
use crate::node::Node;
use crate::plan::{CompileOptions, ExecOrder, ExecutionPlan, Phase, PlanOp};
use neurograph_npu_neural::{CableId, NodeId};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, info};

/// Nodes, cables, plan and clamp table after compilation
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) cables: Vec<Cable>,
    pub(crate) plan: ExecutionPlan,
    pub(crate) clamps: ClampTable,
}

impl CompiledGraph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn cables(&self) -> &[Cable] {
        &self.cables
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn clamps(&self) -> &ClampTable {
        &self.clamps
    }
}

pub(crate) fn compile_graph(
    nodes: Vec<Node>,
    cables: Vec<Cable>,
    clamp_sites: Vec<ClampKey>,
    options: CompileOptions,
) -> SimResult<CompiledGraph> {
    let levels = topological_levels(&nodes, &cables)?;
    let topo_order: Vec<NodeId> = {
        let mut order: Vec<(usize, NodeId)> = levels
            .iter()
            .enumerate()
            .map(|(index, &(rank, _))| (rank, NodeId::new(index)))
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, id)| id).collect()
    };

    let groups: Vec<Vec<NodeId>> = match options.exec_order {
        ExecOrder::Sequential => topo_order.iter().map(|&id| vec![id]).collect(),
        ExecOrder::Wavefront => {
            let depth = levels.iter().map(|&(_, level)| level + 1).max().unwrap_or(0);
            let mut by_level = vec![Vec::new(); depth];
            for (index, &(_, level)) in levels.iter().enumerate() {
                by_level[level].push(NodeId::new(index));
            }
            by_level
        }
    };

    let phases: Vec<Phase> = groups
        .into_iter()
        .map(|updates| build_phase(updates, &cables, options.use_graph_optimization))
        .collect();

    let plan = ExecutionPlan {
        phases,
        topo_order,
        options,
    };

    info!(
        target: "neurograph_npu_engine",
        "compiled graph: {} nodes, {} cables, {} phases, {} ops ({:?}, optimization={})",
        nodes.len(),
        cables.len(),
        plan.phases.len(),
        plan.op_count(),
        options.exec_order,
        options.use_graph_optimization
    );

    Ok(CompiledGraph {
        nodes,
        cables,
        plan,
        clamps: ClampTable::with_sites(clamp_sites),
    })
}

/// `(topological rank, level)` per node, or the cycle error
fn topological_levels(nodes: &[Node], cables: &[Cable]) -> SimResult<Vec<(usize, usize)>> {
    let n = nodes.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for cable in cables.iter().filter(|c| c.coupling == crate::cable::Coupling::SameStep) {
        successors[cable.source.node.index()].push(cable.dest.node.index());
        indegree[cable.dest.node.index()] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(index, _)| Reverse(index))
        .collect();
    let mut level = vec![0usize; n];
    let mut rank = vec![usize::MAX; n];
    let mut next_rank = 0;

    while let Some(Reverse(index)) = ready.pop() {
        rank[index] = next_rank;
        next_rank += 1;
        for &succ in &successors[index] {
            level[succ] = level[succ].max(level[index] + 1);
            indegree[succ] -= 1;
            if indegree[succ] == 0 {
                ready.push(Reverse(succ));
            }
        }
    }

    if next_rank < n {
        // Nodes left over are on a cycle or downstream of one; report only the former
        let residual: Vec<bool> = rank.iter().map(|&r| r == usize::MAX).collect();
        let nodes_on_cycle: Vec<String> = (0..n)
            .filter(|&index| residual[index] && reaches_itself(index, &successors, &residual))
            .map(|index| nodes[index].name.clone())
            .collect();
        debug!(target: "neurograph_npu_engine", "same-step cycle through {:?}", nodes_on_cycle);
        return Err(SimError::CyclicGraph {
            nodes: nodes_on_cycle,
        });
    }

    Ok(rank.into_iter().zip(level).collect())
}

/// Whether `start` lies on a cycle of same-step edges between residual nodes
fn reaches_itself(start: usize, successors: &[Vec<usize>], residual: &[bool]) -> bool {
    let mut visited = vec![false; successors.len()];
    let mut stack = vec![start];
    while let Some(index) = stack.pop() {
        for &succ in &successors[index] {
            if succ == start {
                return true;
            }
            if residual[succ] && !visited[succ] {
                visited[succ] = true;
                stack.push(succ);
            }
        }
    }
    false
}

fn build_phase(updates: Vec<NodeId>, cables: &[Cable], optimize: bool) -> Phase {
    // Cables are stored in id order, so this visits them ascending
    let incoming: Vec<&Cable> = cables
        .iter()
        .filter(|cable| updates.contains(&cable.dest.node))
        .collect();

    let ops = if optimize {
        let mut fused: Vec<(Endpoint, Vec<CableId>)> = Vec::new();
        for cable in incoming {
            match fused.iter_mut().find(|(dest, _)| *dest == cable.dest) {
                Some((_, ids)) => ids.push(cable.id),
                None => fused.push((cable.dest, vec![cable.id])),
            }
        }
        fused
            .into_iter()
            .map(|(dest, cables)| match cables.as_slice() {
                [single] => PlanOp::Propagate(*single),
                _ => PlanOp::PropagateFused { dest, cables },
            })
            .collect()
    } else {
        incoming
            .into_iter()
            .map(|cable| PlanOp::Propagate(cable.id))
            .collect()
    };

    Phase { ops, updates }
}

#[cfg(test)]
mod tests {
    use crate::builder::GraphBuilder;
    use crate::cable::CableSpec;
    use crate::error::SimError;
    use crate::plan::{CompileOptions, ExecOrder, PlanOp};
    use neurograph_npu_neural::{GradedParameters, NodeId, NodeModel};

    fn graded() -> NodeModel {
        NodeModel::Graded(GradedParameters::default())
    }

    fn chain(same_step: bool) -> GraphBuilder {
        // c <- b <- a, declared out of order
        let mut builder = GraphBuilder::new();
        let c = builder.add_node("c", graded(), 1).unwrap();
        let a = builder.add_node("a", graded(), 1).unwrap();
        let b = builder.add_node("b", graded(), 1).unwrap();
        let ab = CableSpec::new("ab", a, "r", b, "j");
        let bc = CableSpec::new("bc", b, "r", c, "j");
        let (ab, bc) = if same_step {
            (ab.same_step(), bc.same_step())
        } else {
            (ab, bc)
        };
        builder.add_cable(ab).unwrap();
        builder.add_cable(bc).unwrap();
        builder
    }

    #[test]
    fn test_same_step_chain_is_ordered() {
        let graph = chain(true).compile(CompileOptions::default()).unwrap();
        assert_eq!(
            graph.plan().topological_order(),
            &[NodeId(1), NodeId(2), NodeId(0)]
        );
    }

    #[test]
    fn test_delayed_chain_keeps_declaration_order() {
        let graph = chain(false).compile(CompileOptions::default()).unwrap();
        assert_eq!(
            graph.plan().topological_order(),
            &[NodeId(0), NodeId(1), NodeId(2)]
        );
    }

    #[test]
    fn test_same_step_cycle_rejected() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node("a", graded(), 1).unwrap();
        let b = builder.add_node("b", graded(), 1).unwrap();
        let c = builder.add_node("c", graded(), 1).unwrap();
        builder
            .add_cable(CableSpec::new("ab", a, "r", b, "j").same_step())
            .unwrap();
        builder
            .add_cable(CableSpec::new("ba", b, "r", a, "j").same_step())
            .unwrap();
        builder
            .add_cable(CableSpec::new("bc", b, "r", c, "j").same_step())
            .unwrap();
        let err = builder.compile(CompileOptions::default()).unwrap_err();
        // c only hangs off the cycle
        assert_eq!(
            err,
            SimError::CyclicGraph {
                nodes: vec!["a".to_string(), "b".to_string()]
            }
        );
    }

    #[test]
    fn test_node_bridging_two_cycles_is_not_reported() {
        let mut builder = GraphBuilder::new();
        let names = ["a", "b", "bridge", "c", "d"];
        let ids: Vec<NodeId> = names
            .iter()
            .map(|name| builder.add_node(*name, graded(), 1).unwrap())
            .collect();
        for (name, from, to) in [
            ("ab", 0, 1),
            ("ba", 1, 0),
            ("b_bridge", 1, 2),
            ("bridge_c", 2, 3),
            ("cd", 3, 4),
            ("dc", 4, 3),
        ] {
            builder
                .add_cable(CableSpec::new(name, ids[from], "r", ids[to], "j").same_step())
                .unwrap();
        }
        let err = builder.compile(CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            SimError::CyclicGraph {
                nodes: vec!["a".into(), "b".into(), "c".into(), "d".into()]
            }
        );
    }

    #[test]
    fn test_self_loop_same_step_is_cycle() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node("a", graded(), 1).unwrap();
        builder
            .add_cable(CableSpec::new("aa", a, "r", a, "j").same_step())
            .unwrap();
        assert!(matches!(
            builder.compile(CompileOptions::default()),
            Err(SimError::CyclicGraph { .. })
        ));
    }

    #[test]
    fn test_delayed_recurrence_compiles() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node("a", graded(), 1).unwrap();
        let b = builder.add_node("b", graded(), 1).unwrap();
        builder.add_cable(CableSpec::new("ab", a, "r", b, "j")).unwrap();
        builder.add_cable(CableSpec::new("ba", b, "r", a, "j")).unwrap();
        builder.add_cable(CableSpec::new("aa", a, "r", a, "j")).unwrap();
        assert!(builder.compile(CompileOptions::default()).is_ok());
    }

    #[test]
    fn test_wavefront_groups_levels() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node("a", graded(), 1).unwrap();
        let b = builder.add_node("b", graded(), 1).unwrap();
        let c = builder.add_node("c", graded(), 1).unwrap();
        builder
            .add_cable(CableSpec::new("ac", a, "r", c, "j").same_step())
            .unwrap();
        builder
            .add_cable(CableSpec::new("bc", b, "r", c, "j").same_step())
            .unwrap();
        let graph = builder
            .compile(CompileOptions::default().with_exec_order(ExecOrder::Wavefront))
            .unwrap();
        let phases = graph.plan().phases();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].updates, vec![a, b]);
        assert_eq!(phases[1].updates, vec![c]);
    }

    #[test]
    fn test_optimization_fuses_shared_destination() {
        let build = || {
            let mut builder = GraphBuilder::new();
            let a = builder.add_node("a", graded(), 1).unwrap();
            let b = builder.add_node("b", graded(), 1).unwrap();
            let c = builder.add_node("c", graded(), 1).unwrap();
            builder.add_cable(CableSpec::new("ac", a, "r", c, "j")).unwrap();
            builder.add_cable(CableSpec::new("bc", b, "r", c, "j")).unwrap();
            builder
        };
        let plain = build()
            .compile(CompileOptions::default().with_optimization(false))
            .unwrap();
        let fused = build().compile(CompileOptions::default()).unwrap();
        assert_eq!(plain.plan().op_count(), 2);
        assert_eq!(fused.plan().op_count(), 1);
        assert!(matches!(
            fused.plan().phases()[2].ops[0],
            PlanOp::PropagateFused { .. }
        ));
    }
}
