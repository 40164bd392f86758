// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cable arena entries and declaration specs

use neurograph_npu_neural::{CableId, DenseTransform, NodeId, PatchLayout, SynapseType, WeightInit};
use neurograph_npu_plasticity::{PlasticityRule, PlasticityState};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// When a cable's destination sees its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coupling {
    /// Reads the source as it was at the start of the step
    #[default]
    Delayed,
    /// Reads the source after it updated in the same step (orders the graph)
    SameStep,
}

/// Resolved `(node, compartment index)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub compartment: usize,
}

/// Declaration of a cable, resolved by `GraphBuilder::add_cable`
#[derive(Debug, Clone, PartialEq)]
pub struct CableSpec {
    pub name: String,
    pub source: NodeId,
    pub source_compartment: String,
    pub dest: NodeId,
    pub dest_compartment: String,
    pub weights: WeightInit,
    pub connection_probability: Option<f32>,
    /// Initialiser seed; unset cables derive one from the builder's base seed
    pub seed: Option<u64>,
    /// Restrict connectivity to block-diagonal patches
    pub patches: Option<PatchLayout>,
    pub transform: DenseTransform,
    pub synapse_type: SynapseType,
    pub coupling: Coupling,
    pub plasticity: Option<PlasticityRule>,
}

impl CableSpec {
    pub fn new(
        name: impl Into<String>,
        source: NodeId,
        source_compartment: impl Into<String>,
        dest: NodeId,
        dest_compartment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            source_compartment: source_compartment.into(),
            dest,
            dest_compartment: dest_compartment.into(),
            weights: WeightInit::constant(1.0),
            connection_probability: None,
            seed: None,
            patches: None,
            transform: DenseTransform::default(),
            synapse_type: SynapseType::Excitatory,
            coupling: Coupling::Delayed,
            plasticity: None,
        }
    }

    pub fn with_weights(mut self, weights: WeightInit) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_connection_probability(mut self, p: f32) -> Self {
        self.connection_probability = Some(p);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_patches(mut self, patches: PatchLayout) -> Self {
        self.patches = Some(patches);
        self
    }

    pub fn with_transform(mut self, transform: DenseTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn inhibitory(mut self) -> Self {
        self.synapse_type = SynapseType::Inhibitory;
        self
    }

    pub fn same_step(mut self) -> Self {
        self.coupling = Coupling::SameStep;
        self
    }

    pub fn with_plasticity(mut self, rule: PlasticityRule) -> Self {
        self.plasticity = Some(rule);
        self
    }
}

/// Weighted connection between two compartments
#[derive(Debug, Clone, PartialEq)]
pub struct Cable {
    pub(crate) id: CableId,
    pub(crate) name: String,
    pub(crate) source: Endpoint,
    pub(crate) dest: Endpoint,
    pub(crate) weights: Array2<f32>,
    pub(crate) initial_weights: Array2<f32>,
    pub(crate) patches: Option<PatchLayout>,
    /// Connectivity mask built from `patches`
    pub(crate) mask: Option<Array2<f32>>,
    pub(crate) transform: DenseTransform,
    pub(crate) synapse_type: SynapseType,
    pub(crate) coupling: Coupling,
    pub(crate) plasticity: Option<PlasticityState>,
}

impl Cable {
    pub fn id(&self) -> CableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Endpoint {
        self.source
    }

    pub fn dest(&self) -> Endpoint {
        self.dest
    }

    pub fn coupling(&self) -> Coupling {
        self.coupling
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn plasticity(&self) -> Option<&PlasticityState> {
        self.plasticity.as_ref()
    }

    /// Add this cable's contribution for `signal` into `acc`
    #[inline]
    pub(crate) fn transmit(&self, signal: ArrayView1<'_, f32>, acc: &mut Array1<f32>) {
        self.transform
            .accumulate(signal, self.weights.view(), self.synapse_type, acc);
    }

    /// Clip plastic weights into their bounds, then zero masked-out entries
    ///
    /// Masked entries stay at 0 even when 0 lies outside the rule's bounds.
    pub(crate) fn enforce_constraints(
        weights: &mut Array2<f32>,
        mask: Option<&Array2<f32>>,
        plasticity: Option<&PlasticityState>,
    ) {
        if let Some(state) = plasticity {
            state.enforce_bounds(weights);
        }
        if let Some(mask) = mask {
            *weights *= mask;
        }
    }

    pub(crate) fn restore_initial_weights(&mut self) {
        self.weights.assign(&self.initial_weights);
    }
}
