// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only description of a compiled graph for external tooling

use crate::cable::Coupling;
use crate::compiler::CompiledGraph;
use crate::error::SimResult;
use crate::stepper::Simulator;
use neurograph_npu_neural::{CableId, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTopology {
    pub id: NodeId,
    pub name: String,
    /// Model tag, e.g. `"lif"`
    pub model: String,
    pub compartments: Vec<String>,
    pub n_units: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableTopology {
    pub id: CableId,
    pub name: String,
    pub source: NodeId,
    pub source_compartment: String,
    pub dest: NodeId,
    pub dest_compartment: String,
    /// `(n_src, n_dst)`
    pub weight_shape: (usize, usize),
    pub plastic: bool,
    pub coupling: Coupling,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopologyExport {
    pub nodes: Vec<NodeTopology>,
    pub cables: Vec<CableTopology>,
    /// Node update order of the compiled plan
    pub execution_order: Vec<NodeId>,
}

impl TopologyExport {
    pub fn from_graph(graph: &CompiledGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeTopology {
                id: node.id,
                name: node.name.clone(),
                model: node.model.tag().to_string(),
                compartments: node
                    .model
                    .compartments()
                    .iter()
                    .map(|spec| spec.name.to_string())
                    .collect(),
                n_units: node.n_units(),
            })
            .collect();

        let cables = graph
            .cables
            .iter()
            .map(|cable| {
                let source = &graph.nodes[cable.source.node.index()];
                let dest = &graph.nodes[cable.dest.node.index()];
                CableTopology {
                    id: cable.id,
                    name: cable.name.clone(),
                    source: cable.source.node,
                    source_compartment: source.compartment_name(cable.source.compartment).to_string(),
                    dest: cable.dest.node,
                    dest_compartment: dest.compartment_name(cable.dest.compartment).to_string(),
                    weight_shape: cable.weights.dim(),
                    plastic: cable.plasticity.is_some(),
                    coupling: cable.coupling,
                }
            })
            .collect();

        Self {
            nodes,
            cables,
            execution_order: graph.plan.topo_order.clone(),
        }
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Simulator {
    pub fn topology(&self) -> TopologyExport {
        TopologyExport::from_graph(&self.graph)
    }
}
