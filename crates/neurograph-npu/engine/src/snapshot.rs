// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Model persistence
//!
//! [`ModelSnapshot`] captures everything needed to rebuild a graph: node
//! declarations with their parameters, cables with current weights and
//! rules, clamp sites (with any active clamp) and compile options. Runtime
//! state such as membrane potentials and traces is not included; a restored
//! graph starts from its initial state.
//!
//! [`CableWeights`] is the lighter weights-only form used by
//! `export_weights` / `import_weights`.

use crate::builder::GraphBuilder;
use crate::cable::{Cable, CableSpec, Coupling};
use crate::clamp::{ClampEntry, ClampValue};
use crate::error::{SimError, SimResult};
use crate::plan::CompileOptions;
use crate::stepper::{Simulator, StepSettings};
use ndarray::Array2;
use neurograph_npu_neural::{DenseTransform, NodeModel, PatchLayout, SynapseType, WeightInit};
use neurograph_npu_plasticity::PlasticityRule;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub model: NodeModel,
    pub n_units: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableSnapshot {
    pub name: String,
    pub source: String,
    pub source_compartment: String,
    pub dest: String,
    pub dest_compartment: String,
    pub shape: (usize, usize),
    /// Row-major, one row per source unit
    pub weights: Vec<f32>,
    #[serde(default)]
    pub transform: DenseTransform,
    #[serde(default)]
    pub synapse_type: SynapseType,
    #[serde(default)]
    pub coupling: Coupling,
    #[serde(default)]
    pub plasticity: Option<PlasticityRule>,
    #[serde(default)]
    pub patches: Option<PatchLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampSiteSnapshot {
    pub node: String,
    pub compartment: String,
    /// Active clamp, if any
    #[serde(default)]
    pub value: Option<ClampValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub version: u32,
    pub nodes: Vec<NodeSnapshot>,
    pub cables: Vec<CableSnapshot>,
    #[serde(default)]
    pub clamp_sites: Vec<ClampSiteSnapshot>,
    #[serde(default)]
    pub options: CompileOptions,
}

impl ModelSnapshot {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let snapshot: ModelSnapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SimError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Rebuild, compile and re-apply active clamps
    pub fn restore(&self, settings: StepSettings) -> SimResult<Simulator> {
        let builder = GraphBuilder::from_snapshot(self)?;
        let mut sim = Simulator::with_settings(builder.compile(self.options)?, settings);
        for site in &self.clamp_sites {
            if let Some(value) = &site.value {
                let node = lookup_node(&sim, &site.node)?;
                sim.set_clamp(node, &site.compartment, value.clone())?;
            }
        }
        Ok(sim)
    }
}

fn lookup_node(sim: &Simulator, name: &str) -> SimResult<neurograph_npu_neural::NodeId> {
    sim.node_id(name)
        .ok_or_else(|| SimError::UnknownNode(name.to_string()))
}

impl GraphBuilder {
    /// Re-declare every node, cable and clamp site from a snapshot
    ///
    /// The snapshot's weights become the new graph's initial weights.
    pub fn from_snapshot(snapshot: &ModelSnapshot) -> SimResult<Self> {
        let mut builder = GraphBuilder::new();
        for node in &snapshot.nodes {
            builder.add_node(node.name.clone(), node.model.clone(), node.n_units)?;
        }

        let find = |builder: &GraphBuilder, name: &str| {
            builder
                .node_id(name)
                .ok_or_else(|| SimError::UnknownNode(name.to_string()))
        };

        for cable in &snapshot.cables {
            let source = find(&builder, &cable.source)?;
            let dest = find(&builder, &cable.dest)?;
            if cable.weights.len() != cable.shape.0 * cable.shape.1 {
                return Err(SimError::Snapshot(format!(
                    "cable '{}' declares shape {:?} but stores {} weights",
                    cable.name,
                    cable.shape,
                    cable.weights.len()
                )));
            }
            let mut spec = CableSpec::new(
                cable.name.clone(),
                source,
                cable.source_compartment.clone(),
                dest,
                cable.dest_compartment.clone(),
            )
            .with_weights(WeightInit::Explicit {
                values: cable.weights.clone(),
            })
            .with_transform(cable.transform.clone());
            spec.synapse_type = cable.synapse_type;
            spec.coupling = cable.coupling;
            spec.plasticity = cable.plasticity.clone();
            spec.patches = cable.patches;
            builder.add_cable(spec)?;
        }

        for site in &snapshot.clamp_sites {
            let node = find(&builder, &site.node)?;
            builder.add_clamp_site(node, &site.compartment)?;
        }

        Ok(builder)
    }
}

/// Weights of one cable, addressed by cable name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableWeights {
    pub cable: String,
    pub shape: (usize, usize),
    /// Row-major
    pub values: Vec<f32>,
}

impl Simulator {
    /// Capture the graph declaration with current weights
    pub fn snapshot(&self) -> ModelSnapshot {
        let graph = &self.graph;
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeSnapshot {
                name: node.name.clone(),
                model: node.model.clone(),
                n_units: node.n_units(),
            })
            .collect();

        let cables = graph
            .cables
            .iter()
            .map(|cable| {
                let source = &graph.nodes[cable.source.node.index()];
                let dest = &graph.nodes[cable.dest.node.index()];
                CableSnapshot {
                    name: cable.name.clone(),
                    source: source.name.clone(),
                    source_compartment: source.compartment_name(cable.source.compartment).to_string(),
                    dest: dest.name.clone(),
                    dest_compartment: dest.compartment_name(cable.dest.compartment).to_string(),
                    shape: cable.weights.dim(),
                    weights: cable.weights.iter().copied().collect(),
                    transform: cable.transform.clone(),
                    synapse_type: cable.synapse_type,
                    coupling: cable.coupling,
                    plasticity: cable.plasticity.as_ref().map(|state| state.rule().clone()),
                    patches: cable.patches,
                }
            })
            .collect();

        let clamp_sites = graph
            .clamps
            .sites()
            .into_iter()
            .map(|key| {
                let node = &graph.nodes[key.node.index()];
                let value = match graph.clamps.entry(key) {
                    Some(ClampEntry::Clamped(value)) => Some(value.clone()),
                    _ => None,
                };
                ClampSiteSnapshot {
                    node: node.name.clone(),
                    compartment: node.compartment_name(key.compartment).to_string(),
                    value,
                }
            })
            .collect();

        ModelSnapshot {
            version: SNAPSHOT_VERSION,
            nodes,
            cables,
            clamp_sites,
            options: graph.plan.options,
        }
    }

    pub fn export_weights(&self) -> Vec<CableWeights> {
        self.graph
            .cables
            .iter()
            .map(|cable| CableWeights {
                cable: cable.name.clone(),
                shape: cable.weights.dim(),
                values: cable.weights.iter().copied().collect(),
            })
            .collect()
    }

    /// Replace weights of the named cables
    ///
    /// Every entry is validated before any weight changes. Plastic cables
    /// clip imported values into their rule's bounds and patched cables keep
    /// their mask.
    pub fn import_weights(&mut self, weights: &[CableWeights]) -> SimResult<()> {
        let mut staged = Vec::with_capacity(weights.len());
        for entry in weights {
            let id = self
                .cable_id(&entry.cable)
                .ok_or_else(|| SimError::UnknownCable(entry.cable.clone()))?;
            let expected = self.cable(id)?.weights.dim();
            if entry.shape != expected {
                return Err(SimError::ShapeMismatch {
                    cable: entry.cable.clone(),
                    expected,
                    actual: entry.shape,
                });
            }
            if entry.values.iter().any(|w| !w.is_finite()) {
                return Err(SimError::InvalidParameters(format!(
                    "cable '{}' has non-finite weights",
                    entry.cable
                )));
            }
            let matrix = Array2::from_shape_vec(expected, entry.values.clone()).map_err(|_| {
                SimError::ShapeMismatch {
                    cable: entry.cable.clone(),
                    expected,
                    actual: (entry.values.len() / expected.1.max(1), expected.1),
                }
            })?;
            staged.push((id, matrix));
        }

        let count = staged.len();
        for (id, matrix) in staged {
            let cable = &mut self.graph.cables[id.index()];
            cable.weights = matrix;
            Cable::enforce_constraints(
                &mut cable.weights,
                cable.mask.as_ref(),
                cable.plasticity.as_ref(),
            );
        }
        info!(target: "neurograph_npu_engine", "imported weights for {} cables", count);
        Ok(())
    }
}
