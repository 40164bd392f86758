// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compartment layout and per-node state storage.
//!
//! Each model declares a fixed, ordered list of compartments. A node's state is
//! one `Array1<f32>` of length `n_units` per compartment, addressed by the
//! compartment's position in that list.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Role of a compartment inside a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompartmentKind {
    /// Accumulation target for incoming cables (rewritten every step)
    Input,
    /// Continuous state variable (potential, rate, adaptation)
    State,
    /// Binary spike output (0.0 or 1.0)
    Spike,
    /// Remaining refractory time
    Refractory,
    /// Time of last spike
    Time,
}

impl CompartmentKind {
    /// Binary compartments only accept 0.0 or 1.0
    pub fn is_binary(self) -> bool {
        matches!(self, CompartmentKind::Spike)
    }
}

/// Static description of one compartment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompartmentSpec {
    pub name: &'static str,
    pub kind: CompartmentKind,
}

impl CompartmentSpec {
    pub const fn new(name: &'static str, kind: CompartmentKind) -> Self {
        Self { name, kind }
    }
}

/// Find a compartment's index in a layout
pub fn compartment_index(layout: &[CompartmentSpec], name: &str) -> Option<usize> {
    layout.iter().position(|spec| spec.name == name)
}

/// Live values of every compartment of one node
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentState {
    n_units: usize,
    values: Vec<Array1<f32>>,
}

impl CompartmentState {
    /// Build a state from per-compartment initial values
    pub fn from_initial(n_units: usize, initial: &[f32]) -> Self {
        let values = initial
            .iter()
            .map(|&value| Array1::from_elem(n_units, value))
            .collect();
        Self { n_units, values }
    }

    pub fn n_units(&self) -> usize {
        self.n_units
    }

    pub fn compartment_count(&self) -> usize {
        self.values.len()
    }

    pub fn view(&self, compartment: usize) -> Option<ArrayView1<'_, f32>> {
        self.values.get(compartment).map(|values| values.view())
    }

    /// Overwrite a whole compartment
    ///
    /// `values` must have `n_units` entries.
    pub fn assign(&mut self, compartment: usize, values: &Array1<f32>) {
        if let Some(target) = self.values.get_mut(compartment) {
            target.assign(values);
        }
    }

    /// Set every unit of a compartment to the same value
    pub fn fill(&mut self, compartment: usize, value: f32) {
        if let Some(target) = self.values.get_mut(compartment) {
            target.fill(value);
        }
    }

    #[inline(always)]
    pub fn get(&self, compartment: usize, unit: usize) -> f32 {
        self.values[compartment][unit]
    }

    #[inline(always)]
    pub fn set(&mut self, compartment: usize, unit: usize, value: f32) {
        self.values[compartment][unit] = value;
    }
}
