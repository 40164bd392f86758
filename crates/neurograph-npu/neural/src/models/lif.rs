// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # LIF (Leaky Integrate-and-Fire) Node Model
//!
//! ## Model Dynamics
//!
//! ```text
//! Membrane Potential Update (explicit Euler):
//!     V(t+dt) = V(t) + dt/tau_m × (-(V(t) - V_rest) + R × j)
//!
//!     Where:
//!     - j = summed cable input (masked to 0 while refractory)
//!     - R = membrane resistance
//!
//! Firing Check:
//!     if refractory_remaining > 0:
//!         No spike
//!     else if V(t+dt) ≥ threshold:
//!         FIRE, reset to V_reset, refractory_remaining = refract_t
//! ```
//!
//! ## Compartments
//! `j` (input), `v` (potential), `s` (spike), `rfr` (refractory remaining),
//! `tols` (time of last spike).
//!
//! A clamped `v` is never reset. A clamped `s` forces the spike output only;
//! reset and refractory entry follow the natural threshold crossing.

use super::integrate_fire::{advance_integrate_and_fire, SpikingLayout};
use super::{NeuronModel, Overrides, StepContext, UpdateOutcome};
use crate::types::{CompartmentKind, CompartmentSpec, CompartmentState};
use serde::{Deserialize, Serialize};

pub(crate) const LIF_COMPARTMENTS: &[CompartmentSpec] = &[
    CompartmentSpec::new("j", CompartmentKind::Input),
    CompartmentSpec::new("v", CompartmentKind::State),
    CompartmentSpec::new("s", CompartmentKind::Spike),
    CompartmentSpec::new("rfr", CompartmentKind::Refractory),
    CompartmentSpec::new("tols", CompartmentKind::Time),
];

pub(crate) const LIF_LAYOUT: SpikingLayout = SpikingLayout {
    j: 0,
    v: 1,
    s: 2,
    rfr: 3,
    tols: 4,
    w: None,
};

/// LIF model parameters (also the shared core of the LIF variants)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifParameters {
    /// Membrane time constant
    pub tau_m: f32,

    /// Membrane resistance applied to input current
    pub resist_m: f32,

    /// Resting potential: baseline potential when no input
    pub v_rest: f32,

    /// Potential after a spike
    pub v_reset: f32,

    /// Firing threshold
    pub v_thr: f32,

    /// Absolute refractory period (same time unit as dt)
    pub refract_t: f32,
}

impl LifParameters {
    /// Create new LIF parameters with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, v_thr: f32) -> Self {
        self.v_thr = v_thr;
        self
    }

    pub fn with_tau_m(mut self, tau_m: f32) -> Self {
        self.tau_m = tau_m;
        self
    }

    pub fn with_refractory(mut self, refract_t: f32) -> Self {
        self.refract_t = refract_t;
        self
    }

    pub(crate) fn validate_core(&self) -> Result<(), &'static str> {
        if !(self.tau_m > 0.0) {
            return Err("tau_m must be positive");
        }
        if !self.resist_m.is_finite() {
            return Err("resist_m must be finite");
        }
        if !(self.refract_t >= 0.0) {
            return Err("refract_t must be non-negative");
        }
        if !(self.v_reset < self.v_thr) {
            return Err("v_reset must be below v_thr");
        }
        Ok(())
    }

    pub(crate) fn initial_values(&self) -> Vec<f32> {
        vec![0.0, self.v_rest, 0.0, 0.0, 0.0]
    }
}

impl Default for LifParameters {
    fn default() -> Self {
        Self {
            tau_m: 10.0,
            resist_m: 1.0,
            v_rest: 0.0,
            v_reset: 0.0,
            v_thr: 1.0,
            refract_t: 1.0,
        }
    }
}

impl NeuronModel for LifParameters {
    fn model_name(&self) -> &'static str {
        "Leaky Integrate-and-Fire (LIF)"
    }

    fn compartments(&self) -> &'static [CompartmentSpec] {
        LIF_COMPARTMENTS
    }

    fn initial_values(&self) -> Vec<f32> {
        LifParameters::initial_values(self)
    }

    fn output_compartment(&self) -> &'static str {
        "s"
    }

    fn spike_compartment(&self) -> Option<&'static str> {
        Some("s")
    }

    fn validate(&self) -> Result<(), &'static str> {
        self.validate_core()
    }

    fn advance(
        &self,
        state: &mut CompartmentState,
        ctx: &StepContext,
        overrides: &Overrides<'_>,
    ) -> UpdateOutcome {
        advance_integrate_and_fire(self, None, |_| 0.0, LIF_LAYOUT, state, ctx, overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    const J: usize = 0;
    const V: usize = 1;
    const S: usize = 2;

    fn drive(params: &LifParameters, state: &mut CompartmentState, input: f32, t: f32) -> f32 {
        state.fill(J, input);
        params.advance(state, &StepContext::new(1.0, t, 1e4), &Overrides::none());
        state.get(S, 0)
    }

    #[test]
    fn test_lif_membrane_potential_update() {
        let params = LifParameters::new().with_tau_m(2.0);
        let mut state = CompartmentState::from_initial(1, &params.initial_values());

        drive(&params, &mut state, 1.0, 1.0);
        assert_eq!(state.get(V, 0), 0.5);
        drive(&params, &mut state, 0.0, 2.0);
        assert_eq!(state.get(V, 0), 0.25);
    }

    #[test]
    fn test_lif_spike_reset_and_refractory() {
        let params = LifParameters {
            tau_m: 2.0,
            refract_t: 2.0,
            ..LifParameters::default()
        };
        let mut state = CompartmentState::from_initial(1, &params.initial_values());

        // 0.75, 1.125 -> spike at step 2
        let train: Vec<f32> = (1..=8)
            .map(|step| drive(&params, &mut state, 1.5, step as f32))
            .collect();
        assert_eq!(train, vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(state.get(V, 0), params.v_reset);
        assert_eq!(state.get(4, 0), 8.0);
    }

    #[test]
    fn test_lif_refractory_masks_input() {
        let params = LifParameters {
            tau_m: 1.0,
            refract_t: 3.0,
            ..LifParameters::default()
        };
        let mut state = CompartmentState::from_initial(1, &params.initial_values());

        assert_eq!(drive(&params, &mut state, 5.0, 1.0), 1.0);
        for step in 2..=3 {
            assert_eq!(drive(&params, &mut state, 5.0, step as f32), 0.0);
            assert_eq!(state.get(V, 0), 0.0);
        }
        assert_eq!(drive(&params, &mut state, 5.0, 4.0), 1.0);
    }

    #[test]
    fn test_lif_clamped_potential_is_not_reset() {
        let params = LifParameters::default();
        let mut state = CompartmentState::from_initial(2, &params.initial_values());
        let slots = vec![None, Some(Array1::from(vec![2.0, 0.5])), None, None, None];

        params.advance(
            &mut state,
            &StepContext::new(1.0, 1.0, 1e4),
            &Overrides::new(&slots),
        );
        assert_eq!(state.get(V, 0), 2.0);
        assert_eq!(state.get(S, 0), 1.0);
        assert_eq!(state.get(V, 1), 0.5);
        assert_eq!(state.get(S, 1), 0.0);
    }

    #[test]
    fn test_lif_saturation_reported() {
        let params = LifParameters {
            v_thr: 1e6,
            tau_m: 1.0,
            ..LifParameters::default()
        };
        let mut state = CompartmentState::from_initial(3, &params.initial_values());
        state.fill(J, 1e9);
        let outcome = params.advance(
            &mut state,
            &StepContext::new(1.0, 1.0, 100.0),
            &Overrides::none(),
        );
        assert_eq!(state.get(V, 0), 100.0);
        assert_eq!(outcome.saturations.len(), 1);
        assert_eq!(outcome.saturations[0].units, 3);
    }

    #[test]
    fn test_lif_validation() {
        assert!(LifParameters::default().validate().is_ok());
        assert!(LifParameters::default().with_tau_m(0.0).validate().is_err());
        assert!(LifParameters::default().with_threshold(-1.0).validate().is_err());
    }
}
