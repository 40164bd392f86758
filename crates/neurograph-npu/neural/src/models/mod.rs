// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Node Models
//!
//! Closed set of node dynamics. Every model:
//! - declares an ordered compartment layout
//! - provides initial values for each compartment (reset re-materialises them)
//! - advances one explicit-Euler step given the step context and clamp overrides
//!
//! ## Supported Models
//! - **Graded**: continuous leaky integrator with an output nonlinearity
//! - **LIF**: leaky integrate-and-fire with refractory period
//! - **Quadratic LIF**: LIF plus a quadratic voltage term
//! - **ELIF**: LIF plus an exponential voltage term
//! - **AdEx**: ELIF plus a spike-triggered adaptation current
//! - **Izhikevich**: two-variable quadratic model with recovery variable
//!
//! ## Clamping
//! A clamp on a compartment replaces its natural value at the point in the
//! update where that compartment is computed. Downstream computation inside
//! the node sees the clamped value.

pub mod adex;
pub mod elif;
pub mod graded;
pub mod integrate_fire;
pub mod izhikevich;
pub mod lif;
pub mod quadratic_lif;

pub use adex::AdExParameters;
pub use elif::ElifParameters;
pub use graded::{Activation, GradedParameters};
pub use izhikevich::IzhikevichParameters;
pub use lif::LifParameters;
pub use quadratic_lif::QuadraticLifParameters;

use crate::types::{CompartmentKind, CompartmentSpec, CompartmentState, ModelError, ModelResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Per-step inputs shared by every node update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Integration step
    pub dt: f32,
    /// Simulation time at the end of this step
    pub time: f32,
    /// Magnitude at which potentials are saturated
    pub potential_bound: f32,
}

impl StepContext {
    pub fn new(dt: f32, time: f32, potential_bound: f32) -> Self {
        Self {
            dt,
            time,
            potential_bound,
        }
    }
}

/// Clamp overrides for one node, indexed by compartment position
#[derive(Debug, Clone, Copy)]
pub struct Overrides<'a> {
    slots: &'a [Option<Array1<f32>>],
}

impl<'a> Overrides<'a> {
    pub fn new(slots: &'a [Option<Array1<f32>>]) -> Self {
        Self { slots }
    }

    pub fn none() -> Overrides<'static> {
        Overrides { slots: &[] }
    }

    #[inline(always)]
    pub fn value(&self, compartment: usize, unit: usize) -> Option<f32> {
        self.slots
            .get(compartment)
            .and_then(|slot| slot.as_ref())
            .map(|values| values[unit])
    }

    pub fn is_clamped(&self, compartment: usize) -> bool {
        matches!(self.slots.get(compartment), Some(Some(_)))
    }
}

/// A compartment whose value had to be saturated during an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saturation {
    pub compartment: &'static str,
    pub units: usize,
}

/// What happened during one node update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Units whose spike compartment is 1.0 after the update
    pub spikes: usize,
    pub saturations: Vec<Saturation>,
}

impl UpdateOutcome {
    pub(crate) fn record_saturation(&mut self, compartment: &'static str, units: usize) {
        if units > 0 {
            self.saturations.push(Saturation { compartment, units });
        }
    }
}

/// Clip a value to `[-bound, bound]`, replacing NaN with `fallback`
///
/// Returns the saturated value and whether saturation happened.
#[inline(always)]
pub fn saturate(value: f32, bound: f32, fallback: f32) -> (f32, bool) {
    if value.is_nan() {
        (fallback, true)
    } else if value > bound {
        (bound, true)
    } else if value < -bound {
        (-bound, true)
    } else {
        (value, false)
    }
}

/// Capability set every node model provides
pub trait NeuronModel {
    /// Human-readable model name
    fn model_name(&self) -> &'static str;

    /// Ordered compartment layout
    fn compartments(&self) -> &'static [CompartmentSpec];

    /// Initial value of each compartment, in layout order
    fn initial_values(&self) -> Vec<f32>;

    /// Compartment cables usually read from
    fn output_compartment(&self) -> &'static str;

    /// Binary spike compartment, if the model spikes
    fn spike_compartment(&self) -> Option<&'static str>;

    /// Check parameter ranges
    fn validate(&self) -> Result<(), &'static str>;

    /// Advance every unit by one step
    fn advance(
        &self,
        state: &mut CompartmentState,
        ctx: &StepContext,
        overrides: &Overrides<'_>,
    ) -> UpdateOutcome;
}

/// Node model variant with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeModel {
    Graded(GradedParameters),
    Lif(LifParameters),
    QuadraticLif(QuadraticLifParameters),
    Elif(ElifParameters),
    AdEx(AdExParameters),
    Izhikevich(IzhikevichParameters),
}

impl NodeModel {
    fn inner(&self) -> &dyn NeuronModel {
        match self {
            NodeModel::Graded(params) => params,
            NodeModel::Lif(params) => params,
            NodeModel::QuadraticLif(params) => params,
            NodeModel::Elif(params) => params,
            NodeModel::AdEx(params) => params,
            NodeModel::Izhikevich(params) => params,
        }
    }

    /// Short tag used in topology exports
    pub fn tag(&self) -> &'static str {
        match self {
            NodeModel::Graded(_) => "graded",
            NodeModel::Lif(_) => "lif",
            NodeModel::QuadraticLif(_) => "quadratic_lif",
            NodeModel::Elif(_) => "elif",
            NodeModel::AdEx(_) => "adex",
            NodeModel::Izhikevich(_) => "izhikevich",
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.inner().model_name()
    }

    pub fn compartments(&self) -> &'static [CompartmentSpec] {
        self.inner().compartments()
    }

    pub fn compartment_index(&self, name: &str) -> Option<usize> {
        crate::types::compartment_index(self.compartments(), name)
    }

    pub fn compartment_kind(&self, index: usize) -> Option<CompartmentKind> {
        self.compartments().get(index).map(|spec| spec.kind)
    }

    pub fn output_compartment(&self) -> &'static str {
        self.inner().output_compartment()
    }

    pub fn spike_compartment(&self) -> Option<&'static str> {
        self.inner().spike_compartment()
    }

    pub fn is_spiking(&self) -> bool {
        self.spike_compartment().is_some()
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.inner()
            .validate()
            .map_err(|reason| ModelError::InvalidParameter {
                model: self.model_name(),
                reason,
            })
    }

    /// Fresh state for a population of `n_units`
    pub fn initial_state(&self, n_units: usize) -> ModelResult<CompartmentState> {
        if n_units == 0 {
            return Err(ModelError::EmptyPopulation);
        }
        Ok(CompartmentState::from_initial(
            n_units,
            &self.inner().initial_values(),
        ))
    }

    #[inline]
    pub fn advance(
        &self,
        state: &mut CompartmentState,
        ctx: &StepContext,
        overrides: &Overrides<'_>,
    ) -> UpdateOutcome {
        self.inner().advance(state, ctx, overrides)
    }
}

impl Default for NodeModel {
    fn default() -> Self {
        NodeModel::Lif(LifParameters::default())
    }
}
