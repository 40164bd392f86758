// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exponential LIF: LIF plus `Δ_T × exp((V - V_rheo) / Δ_T)` in the drive.
//!
//! The exponential can overflow for runaway potentials; the shared update
//! saturates the result and reports it.

use super::integrate_fire::advance_integrate_and_fire;
use super::lif::{LifParameters, LIF_COMPARTMENTS, LIF_LAYOUT};
use super::{NeuronModel, Overrides, StepContext, UpdateOutcome};
use crate::types::{CompartmentSpec, CompartmentState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElifParameters {
    pub lif: LifParameters,
    /// Rheobase potential
    pub v_rheo: f32,
    /// Sharpness (slope factor Δ_T)
    pub sharpness: f32,
}

impl Default for ElifParameters {
    fn default() -> Self {
        Self {
            lif: LifParameters::default(),
            v_rheo: 0.7,
            sharpness: 0.1,
        }
    }
}

pub(crate) fn exponential_term(v: f32, v_rheo: f32, sharpness: f32) -> f32 {
    sharpness * ((v - v_rheo) / sharpness).exp()
}

impl NeuronModel for ElifParameters {
    fn model_name(&self) -> &'static str {
        "Exponential Leaky Integrate-and-Fire (ELIF)"
    }

    fn compartments(&self) -> &'static [CompartmentSpec] {
        LIF_COMPARTMENTS
    }

    fn initial_values(&self) -> Vec<f32> {
        self.lif.initial_values()
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
        Ok(())
    }

    fn advance(
        &self,
        state: &mut CompartmentState,
        ctx: &StepContext,
        overrides: &Overrides<'_>,
    ) -> UpdateOutcome {
        let (v_rheo, sharpness) = (self.v_rheo, self.sharpness);
        advance_integrate_and_fire(
            &self.lif,
            None,
            move |v| exponential_term(v, v_rheo, sharpness),
            LIF_LAYOUT,
            state,
            ctx,
            overrides,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_runaway_is_saturated() {
        let params = ElifParameters {
            lif: LifParameters::default().with_threshold(1e9).with_tau_m(1.0),
            v_rheo: 0.0,
            sharpness: 0.01,
        };
        let mut state = CompartmentState::from_initial(1, &params.initial_values());
        state.set(1, 0, 50.0);
        let outcome = params.advance(
            &mut state,
            &StepContext::new(1.0, 1.0, 500.0),
            &Overrides::none(),
        );
        assert_eq!(state.get(1, 0), 500.0);
        assert_eq!(outcome.saturations[0].compartment, "v");
    }

    #[test]
    fn test_elif_fires_under_drive() {
        let params = ElifParameters::default();
        let mut state = CompartmentState::from_initial(1, &params.initial_values());
        let mut spikes = 0;
        for step in 1..=50 {
            state.fill(0, 2.0);
            spikes += params
                .advance(
                    &mut state,
                    &StepContext::new(1.0, step as f32, 1e4),
                    &Overrides::none(),
                )
                .spikes;
        }
        assert!(spikes > 0);
    }
}
