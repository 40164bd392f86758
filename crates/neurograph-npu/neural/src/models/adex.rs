// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # AdEx (Adaptive Exponential Integrate-and-Fire)
//!
//! ```text
//! V += dt/tau_m × (-(V - V_rest) + Δ_T exp((V - V_rheo)/Δ_T) - R w + R j)
//! w += dt/tau_w × (a (V - V_rest) - w)
//! on spike: V = V_reset, w += b
//! ```
//!
//! The adaptation current `w` grows with every spike and decays between them,
//! so a constant input produces lengthening inter-spike intervals.

use super::elif::exponential_term;
use super::integrate_fire::{advance_integrate_and_fire, Adaptation, SpikingLayout};
use super::lif::LifParameters;
use super::{NeuronModel, Overrides, StepContext, UpdateOutcome};
use crate::types::{CompartmentKind, CompartmentSpec, CompartmentState};
use serde::{Deserialize, Serialize};

const ADEX_COMPARTMENTS: &[CompartmentSpec] = &[
    CompartmentSpec::new("j", CompartmentKind::Input),
    CompartmentSpec::new("v", CompartmentKind::State),
    CompartmentSpec::new("w", CompartmentKind::State),
    CompartmentSpec::new("s", CompartmentKind::Spike),
    CompartmentSpec::new("rfr", CompartmentKind::Refractory),
    CompartmentSpec::new("tols", CompartmentKind::Time),
];

const ADEX_LAYOUT: SpikingLayout = SpikingLayout {
    j: 0,
    v: 1,
    s: 3,
    rfr: 4,
    tols: 5,
    w: Some(2),
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdExParameters {
    pub lif: LifParameters,
    pub v_rheo: f32,
    pub sharpness: f32,
    /// Adaptation time constant
    pub tau_w: f32,
    /// Subthreshold adaptation coupling
    pub a: f32,
    /// Spike-triggered adaptation increment
    pub b: f32,
}

impl Default for AdExParameters {
    fn default() -> Self {
        Self {
            lif: LifParameters {
                tau_m: 15.0,
                ..LifParameters::default()
            },
            v_rheo: 0.7,
            sharpness: 0.1,
            tau_w: 100.0,
            a: 0.0,
            b: 0.1,
        }
    }
}

impl NeuronModel for AdExParameters {
    fn model_name(&self) -> &'static str {
        "Adaptive Exponential Integrate-and-Fire (AdEx)"
    }

    fn compartments(&self) -> &'static [CompartmentSpec] {
        ADEX_COMPARTMENTS
    }

    fn initial_values(&self) -> Vec<f32> {
        vec![0.0, self.lif.v_rest, 0.0, 0.0, 0.0, 0.0]
    }

    fn output_compartment(&self) -> &'static str {
        "s"
    }

    fn spike_compartment(&self) -> Option<&'static str> {
        Some("s")
    }

    fn validate(&self) -> Result<(), &'static str> {
        self.lif.validate_core()?;
        if !(self.sharpness > 0.0) {
            return Err("sharpness must be positive");
        }
        if !(self.tau_w > 0.0) {
            return Err("tau_w must be positive");
        }
        Ok(())
    }

    fn advance(
        &self,
        state: &mut CompartmentState,
        ctx: &StepContext,
        overrides: &Overrides<'_>,
    ) -> UpdateOutcome {
        let (v_rheo, sharpness) = (self.v_rheo, self.sharpness);
        let adaptation = Adaptation {
            tau_w: self.tau_w,
            a: self.a,
            b: self.b,
        };
        advance_integrate_and_fire(
            &self.lif,
            Some(adaptation),
            move |v| exponential_term(v, v_rheo, sharpness),
            ADEX_LAYOUT,
            state,
            ctx,
            overrides,
        )
    }
}
