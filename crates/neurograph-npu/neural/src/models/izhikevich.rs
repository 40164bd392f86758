// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Izhikevich two-variable spiking model.
//!
//! ```text
//! v += dt/tau_m × (0.04 v² + 5 v + 140 - w + R j)
//! w += dt/tau_w × (b v - w)
//! on previous v > v_thr: v = c (v_reset), w = w_prev + d (w_reset)
//! ```
//!
//! The spike is decided from the potential entering the step, so a cell
//! fires one step after its potential first exceeds `v_thr`.
//!
//! Defaults are the regular-spiking cortical cell.

use super::{saturate, NeuronModel, Overrides, StepContext, UpdateOutcome};
use crate::types::{CompartmentKind, CompartmentSpec, CompartmentState};
use serde::{Deserialize, Serialize};

const IZHIKEVICH_COMPARTMENTS: &[CompartmentSpec] = &[
    CompartmentSpec::new("j", CompartmentKind::Input),
    CompartmentSpec::new("v", CompartmentKind::State),
    CompartmentSpec::new("w", CompartmentKind::State),
    CompartmentSpec::new("s", CompartmentKind::Spike),
    CompartmentSpec::new("tols", CompartmentKind::Time),
];

const J: usize = 0;
const V: usize = 1;
const W: usize = 2;
const S: usize = 3;
const TOLS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IzhikevichParameters {
    pub tau_m: f32,
    pub resist_m: f32,
    pub v_thr: f32,
    /// Reset potential (c)
    pub v_reset: f32,
    /// Recovery time constant (1/a)
    pub tau_w: f32,
    /// Recovery increment after a spike (d)
    pub w_reset: f32,
    /// Recovery coupling to v (b)
    pub coupling: f32,
    pub v0: f32,
    pub w0: f32,
}

impl Default for IzhikevichParameters {
    fn default() -> Self {
        Self {
            tau_m: 1.0,
            resist_m: 1.0,
            v_thr: 30.0,
            v_reset: -65.0,
            tau_w: 50.0,
            w_reset: 8.0,
            coupling: 0.2,
            v0: -65.0,
            w0: -14.0,
        }
    }
}

impl NeuronModel for IzhikevichParameters {
    fn model_name(&self) -> &'static str {
        "Izhikevich"
    }

    fn compartments(&self) -> &'static [CompartmentSpec] {
        IZHIKEVICH_COMPARTMENTS
    }

    fn initial_values(&self) -> Vec<f32> {
        vec![0.0, self.v0, self.w0, 0.0, 0.0]
    }

    fn output_compartment(&self) -> &'static str {
        "s"
    }

    fn spike_compartment(&self) -> Option<&'static str> {
        Some("s")
    }

    fn validate(&self) -> Result<(), &'static str> {
        if !(self.tau_m > 0.0) {
            return Err("tau_m must be positive");
        }
        if !(self.tau_w > 0.0) {
            return Err("tau_w must be positive");
        }
        if !(self.v_reset < self.v_thr) {
            return Err("v_reset must be below v_thr");
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
        let (mut v_sat, mut w_sat) = (0, 0);
        let dt = ctx.dt;

        for unit in 0..state.n_units() {
            let j = overrides
                .value(J, unit)
                .unwrap_or_else(|| state.get(J, unit));
            let v_prev = state.get(V, unit);
            let w_prev = state.get(W, unit);

            let crossed = v_prev > self.v_thr;
            let (mut v, w) = if crossed {
                (self.v_reset, w_prev + self.w_reset)
            } else {
                let dv =
                    0.04 * v_prev * v_prev + 5.0 * v_prev + 140.0 - w_prev + self.resist_m * j;
                let (v_nat, hit) =
                    saturate(v_prev + dt / self.tau_m * dv, ctx.potential_bound, self.v_reset);
                v_sat += hit as usize;
                let (w_nat, hit) = saturate(
                    w_prev + dt / self.tau_w * (self.coupling * v_prev - w_prev),
                    ctx.potential_bound,
                    self.w0,
                );
                w_sat += hit as usize;
                (v_nat, w_nat)
            };
            if let Some(clamped) = overrides.value(V, unit) {
                v = clamped;
            }
            let s = overrides
                .value(S, unit)
                .unwrap_or(if crossed { 1.0 } else { 0.0 });
            let w = overrides.value(W, unit).unwrap_or(w);
            let tols = overrides.value(TOLS, unit).unwrap_or(if s > 0.0 {
                ctx.time
            } else {
                state.get(TOLS, unit)
            });

            state.set(J, unit, j);
            state.set(V, unit, v);
            state.set(W, unit, w);
            state.set(S, unit, s);
            state.set(TOLS, unit, tols);
            if s > 0.0 {
                outcome.spikes += 1;
            }
        }

        outcome.record_saturation("v", v_sat);
        outcome.record_saturation("w", w_sat);
        outcome
    }
}
