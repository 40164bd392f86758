// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Graded (rate) node
//!
//! Continuous leaky integrator without spikes:
//!
//! ```text
//! z += dt/tau_m × (-(z - z_rest) + R × j)
//! r  = f(z)
//! ```
//!
//! Cables normally read `r`. Clamping `z` also fixes `r` because `f` is
//! applied to the effective value of `z`.

use super::{saturate, NeuronModel, Overrides, StepContext, UpdateOutcome};
use crate::types::{CompartmentKind, CompartmentSpec, CompartmentState};
use serde::{Deserialize, Serialize};

const GRADED_COMPARTMENTS: &[CompartmentSpec] = &[
    CompartmentSpec::new("j", CompartmentKind::Input),
    CompartmentSpec::new("z", CompartmentKind::State),
    CompartmentSpec::new("r", CompartmentKind::State),
];

const J: usize = 0;
const Z: usize = 1;
const R: usize = 2;

/// Output nonlinearity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Identity,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    #[inline(always)]
    pub fn apply(self, z: f32) -> f32 {
        match self {
            Activation::Identity => z,
            Activation::Relu => z.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-z).exp()),
            Activation::Tanh => z.tanh(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradedParameters {
    pub tau_m: f32,
    pub resist_m: f32,
    pub z_rest: f32,
    pub activation: Activation,
}

impl Default for GradedParameters {
    fn default() -> Self {
        Self {
            tau_m: 1.0,
            resist_m: 1.0,
            z_rest: 0.0,
            activation: Activation::Identity,
        }
    }
}

impl NeuronModel for GradedParameters {
    fn model_name(&self) -> &'static str {
        "Graded Leaky Integrator"
    }

    fn compartments(&self) -> &'static [CompartmentSpec] {
        GRADED_COMPARTMENTS
    }

    fn initial_values(&self) -> Vec<f32> {
        vec![0.0, self.z_rest, self.activation.apply(self.z_rest)]
    }

    fn output_compartment(&self) -> &'static str {
        "r"
    }

    fn spike_compartment(&self) -> Option<&'static str> {
        None
    }

    fn validate(&self) -> Result<(), &'static str> {
        if !(self.tau_m > 0.0) {
            return Err("tau_m must be positive");
        }
        if !self.resist_m.is_finite() {
            return Err("resist_m must be finite");
        }
        Ok(())
    }

    fn advance(
        &self,
        state: &mut CompartmentState,
        ctx: &StepContext,
        overrides: &Overrides<'_>,
    ) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();
        let mut saturated = 0;

        for unit in 0..state.n_units() {
            let j = overrides
                .value(J, unit)
                .unwrap_or_else(|| state.get(J, unit));
            let z_prev = state.get(Z, unit);
            let dz = ctx.dt / self.tau_m * (-(z_prev - self.z_rest) + self.resist_m * j);
            let (z_nat, hit) = saturate(z_prev + dz, ctx.potential_bound, self.z_rest);
            saturated += hit as usize;

            let z = overrides.value(Z, unit).unwrap_or(z_nat);
            let r = overrides
                .value(R, unit)
                .unwrap_or_else(|| self.activation.apply(z));

            state.set(J, unit, j);
            state.set(Z, unit, z);
            state.set(R, unit, r);
        }

        outcome.record_saturation("z", saturated);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_graded_tracks_input_with_unit_tau() {
        let params = GradedParameters::default();
        let mut state = CompartmentState::from_initial(2, &params.initial_values());
        state.assign(J, &Array1::from(vec![0.5, -2.0]));
        let outcome = params.advance(
            &mut state,
            &StepContext::new(1.0, 1.0, 1e4),
            &Overrides::none(),
        );
        assert_eq!(state.view(R).unwrap().to_vec(), vec![0.5, -2.0]);
        assert_eq!(outcome.spikes, 0);
    }

    #[test]
    fn test_clamped_state_drives_output() {
        let params = GradedParameters {
            activation: Activation::Relu,
            tau_m: 5.0,
            ..GradedParameters::default()
        };
        let mut state = CompartmentState::from_initial(1, &params.initial_values());
        let slots = vec![None, Some(Array1::from(vec![-3.0])), None];
        params.advance(
            &mut state,
            &StepContext::new(1.0, 1.0, 1e4),
            &Overrides::new(&slots),
        );
        assert_eq!(state.get(Z, 0), -3.0);
        assert_eq!(state.get(R, 0), 0.0);
    }

    #[test]
    fn test_activations() {
        assert_eq!(Activation::Identity.apply(-1.0), -1.0);
        assert_eq!(Activation::Relu.apply(-1.0), 0.0);
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::Tanh.apply(0.0), 0.0);
    }
}
