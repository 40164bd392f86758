// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Node arena entries

use crate::error::{SimError, SimResult};
use neurograph_npu_neural::{CompartmentKind, CompartmentState, NodeId, NodeModel};

/// One population of identical units
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) model: NodeModel,
    pub(crate) state: CompartmentState,
    pub(crate) initial: CompartmentState,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String, model: NodeModel, n_units: usize) -> SimResult<Self> {
        model.validate()?;
        let initial = model.initial_state(n_units)?;
        Ok(Self {
            id,
            name,
            model,
            state: initial.clone(),
            initial,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &NodeModel {
        &self.model
    }

    pub fn n_units(&self) -> usize {
        self.state.n_units()
    }

    pub fn state(&self) -> &CompartmentState {
        &self.state
    }

    /// Resolve a compartment name to its index
    pub fn compartment(&self, name: &str) -> SimResult<usize> {
        self.model
            .compartment_index(name)
            .ok_or_else(|| SimError::UnknownCompartment {
                node: self.name.clone(),
                compartment: name.to_string(),
            })
    }

    pub fn compartment_name(&self, index: usize) -> &'static str {
        self.model
            .compartments()
            .get(index)
            .map_or("?", |spec| spec.name)
    }

    pub fn compartment_kind(&self, index: usize) -> Option<CompartmentKind> {
        self.model.compartment_kind(index)
    }

    /// Indices of every input compartment
    pub(crate) fn input_compartments(&self) -> impl Iterator<Item = usize> + '_ {
        self.model
            .compartments()
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.kind == CompartmentKind::Input)
            .map(|(index, _)| index)
    }

    pub(crate) fn restore_initial(&mut self) {
        self.state = self.initial.clone();
    }
}
