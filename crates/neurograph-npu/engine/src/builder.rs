// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Graph construction context.
//!
//! Declarations are validated as they arrive: unknown endpoints, wrong weight
//! shapes and cables into non-input compartments fail immediately. `compile`
//! consumes the builder, so the structure of a compiled graph cannot change.

use crate::cable::{Cable, CableSpec, Endpoint};
use crate::clamp::ClampKey;
use crate::compiler::{compile_graph, CompiledGraph};
use crate::error::{SimError, SimResult};
use crate::lifecycle::Lifecycle;
use crate::node::Node;
use crate::plan::CompileOptions;
use ahash::AHashSet;
use neurograph_npu_neural::{CableId, CompartmentKind, NodeId, NodeModel};
use neurograph_npu_plasticity::PlasticityState;
use tracing::debug;

#[derive(Debug, Default)]
pub struct GraphBuilder {
    pub(crate) nodes: Vec<Node>,
    pub(crate) cables: Vec<Cable>,
    pub(crate) clamp_sites: Vec<ClampKey>,
    node_names: AHashSet<String>,
    cable_names: AHashSet<String>,
    base_seed: u64,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base seed for cables declared without their own
    ///
    /// Such a cable uses `seed + cable index`, so cables sharing an
    /// initialiser still draw different matrices.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    /// A builder is always in the declaration phase
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::Uninitialized
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn cable_count(&self) -> usize {
        self.cables.len()
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.name == name)
            .map(|node| node.id)
    }

    /// Declare a population of `n_units` units running `model`
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        model: NodeModel,
        n_units: usize,
    ) -> SimResult<NodeId> {
        let name = name.into();
        if self.node_names.contains(&name) {
            return Err(SimError::DuplicateName(name));
        }
        let id = NodeId::new(self.nodes.len());
        let node = Node::new(id, name.clone(), model, n_units)?;
        debug!(target: "neurograph_npu_engine", "declared {} '{}' ({}, {} units)", id, name, node.model.tag(), n_units);
        self.node_names.insert(name);
        self.nodes.push(node);
        Ok(id)
    }

    fn node(&self, id: NodeId) -> SimResult<&Node> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| SimError::UnknownNode(id.to_string()))
    }

    /// Declare a cable; endpoints and weight shape are checked here
    pub fn add_cable(&mut self, spec: CableSpec) -> SimResult<CableId> {
        if self.cable_names.contains(&spec.name) {
            return Err(SimError::DuplicateName(spec.name));
        }

        let source = self.node(spec.source)?;
        let dest = self.node(spec.dest)?;
        let source_idx = source.compartment(&spec.source_compartment)?;
        let dest_idx = dest.compartment(&spec.dest_compartment)?;

        if dest.compartment_kind(dest_idx) != Some(CompartmentKind::Input) {
            return Err(SimError::NotAnInputCompartment {
                node: dest.name.clone(),
                compartment: spec.dest_compartment.clone(),
            });
        }

        let shape = (source.n_units(), dest.n_units());
        let seed = spec
            .seed
            .unwrap_or_else(|| self.base_seed.wrapping_add(self.cables.len() as u64));
        let mut weights = spec
            .weights
            .build(shape, spec.connection_probability, seed)
            .map_err(|err| match err {
                neurograph_npu_neural::ModelError::WeightShape { expected, actual } => {
                    SimError::ShapeMismatch {
                        cable: spec.name.clone(),
                        expected,
                        actual,
                    }
                }
                other => other.into(),
            })?;

        if let Some(bias) = &spec.transform.bias {
            if bias.len() != dest.n_units() {
                return Err(SimError::ShapeMismatch {
                    cable: spec.name.clone(),
                    expected: (1, dest.n_units()),
                    actual: (1, bias.len()),
                });
            }
        }

        let plasticity = match spec.plasticity.clone() {
            Some(rule) => {
                if rule.needs_spikes() {
                    if source.compartment_kind(source_idx) != Some(CompartmentKind::Spike) {
                        return Err(SimError::PlasticityRequiresSpikes {
                            cable: spec.name.clone(),
                            reason: format!(
                                "source '{}.{}' is not a spike compartment",
                                source.name, spec.source_compartment
                            ),
                        });
                    }
                    if !dest.model.is_spiking() {
                        return Err(SimError::PlasticityRequiresSpikes {
                            cable: spec.name.clone(),
                            reason: format!("destination '{}' does not spike", dest.name),
                        });
                    }
                }
                Some(PlasticityState::new(rule, shape.0, shape.1)?)
            }
            None => None,
        };

        let mask = match spec.patches {
            Some(layout) => Some(layout.mask(shape).map_err(|err| {
                SimError::InvalidParameters(format!("cable '{}': {}", spec.name, err))
            })?),
            None => None,
        };
        Cable::enforce_constraints(&mut weights, mask.as_ref(), plasticity.as_ref());

        let id = CableId::new(self.cables.len());
        let cable = Cable {
            id,
            name: spec.name.clone(),
            source: Endpoint {
                node: spec.source,
                compartment: source_idx,
            },
            dest: Endpoint {
                node: spec.dest,
                compartment: dest_idx,
            },
            initial_weights: weights.clone(),
            weights,
            patches: spec.patches,
            mask,
            transform: spec.transform,
            synapse_type: spec.synapse_type,
            coupling: spec.coupling,
            plasticity,
        };
        debug!(
            target: "neurograph_npu_engine",
            "declared {} '{}' {}.{} -> {}.{} {:?}",
            id, cable.name, source.name, spec.source_compartment, dest.name, spec.dest_compartment, cable.coupling
        );
        self.cable_names.insert(spec.name);
        self.cables.push(cable);
        Ok(id)
    }

    /// Allow runtime clamping of `node.compartment`
    pub fn add_clamp_site(&mut self, node: NodeId, compartment: &str) -> SimResult<()> {
        let index = self.node(node)?.compartment(compartment)?;
        let key = ClampKey {
            node,
            compartment: index,
        };
        if !self.clamp_sites.contains(&key) {
            self.clamp_sites.push(key);
        }
        Ok(())
    }

    /// Fix the structure and build the execution plan
    pub fn compile(self, options: CompileOptions) -> SimResult<CompiledGraph> {
        compile_graph(self.nodes, self.cables, self.clamp_sites, options)
    }
}
