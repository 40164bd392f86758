// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared integrate-and-fire update used by LIF, quadratic LIF, ELIF and AdEx.
//!
//! ```text
//! rfr    = max(rfr - dt, 0)              refractory expiring this step is over
//! j_eff  = rfr > 0 ? 0 : j               input is masked while refractory
//! v     += dt/tau_m * (-(v - v_rest) + f(v) - R*w + R*j_eff)
//! spike  = rfr == 0 && v >= v_thr
//! spike => v = v_reset, rfr = refract_t, w += b, tols = t
//! ```
//!
//! `f(v)` is the model-specific voltage term and `w` the optional adaptation
//! current (zero for models without one).

use super::{saturate, Overrides, StepContext, UpdateOutcome};
use super::lif::LifParameters;
use crate::types::CompartmentState;

/// Compartment positions used by the integrate-and-fire family
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpikingLayout {
    pub j: usize,
    pub v: usize,
    pub s: usize,
    pub rfr: usize,
    pub tols: usize,
    pub w: Option<usize>,
}

/// Spike-triggered adaptation current
#[derive(Debug, Clone, Copy)]
pub(crate) struct Adaptation {
    pub tau_w: f32,
    pub a: f32,
    pub b: f32,
}

pub(crate) fn advance_integrate_and_fire<F>(
    core: &LifParameters,
    adaptation: Option<Adaptation>,
    voltage_term: F,
    layout: SpikingLayout,
    state: &mut CompartmentState,
    ctx: &StepContext,
    overrides: &Overrides<'_>,
) -> UpdateOutcome
where
    F: Fn(f32) -> f32,
{
    let mut outcome = UpdateOutcome::default();
    let mut v_saturated = 0;
    let mut w_saturated = 0;
    let dt = ctx.dt;
    let bound = ctx.potential_bound;

    for unit in 0..state.n_units() {
        let j = overrides
            .value(layout.j, unit)
            .unwrap_or_else(|| state.get(layout.j, unit));

        let mut rfr = overrides
            .value(layout.rfr, unit)
            .unwrap_or_else(|| (state.get(layout.rfr, unit) - dt).max(0.0));
        let refractory = rfr > 0.0;
        let j_eff = if refractory { 0.0 } else { j };

        let v_prev = state.get(layout.v, unit);
        let w_prev = layout.w.map_or(0.0, |w| state.get(w, unit));

        let drive = -(v_prev - core.v_rest) + voltage_term(v_prev) - core.resist_m * w_prev
            + core.resist_m * j_eff;
        let (mut v, hit) = saturate(v_prev + dt / core.tau_m * drive, bound, core.v_rest);
        v_saturated += hit as usize;

        let v_clamped = match overrides.value(layout.v, unit) {
            Some(clamped) => {
                v = clamped;
                true
            }
            None => false,
        };

        let crossed = !refractory && v >= core.v_thr;
        let s = overrides
            .value(layout.s, unit)
            .unwrap_or(if crossed { 1.0 } else { 0.0 });

        if crossed {
            if !v_clamped {
                v = core.v_reset;
            }
            if !overrides.is_clamped(layout.rfr) {
                rfr = core.refract_t;
            }
        }

        if let (Some(w_idx), Some(adapt)) = (layout.w, adaptation) {
            let mut w = w_prev + dt / adapt.tau_w * (adapt.a * (v_prev - core.v_rest) - w_prev);
            if crossed {
                w += adapt.b;
            }
            let (w_sat, hit) = saturate(w, bound, 0.0);
            w_saturated += hit as usize;
            let w = overrides.value(w_idx, unit).unwrap_or(w_sat);
            state.set(w_idx, unit, w);
        }

        let tols = overrides.value(layout.tols, unit).unwrap_or(if s > 0.0 {
            ctx.time
        } else {
            state.get(layout.tols, unit)
        });

        state.set(layout.j, unit, j);
        state.set(layout.v, unit, v);
        state.set(layout.s, unit, s);
        state.set(layout.rfr, unit, rfr);
        state.set(layout.tols, unit, tols);

        if s > 0.0 {
            outcome.spikes += 1;
        }
    }

    outcome.record_saturation("v", v_saturated);
    outcome.record_saturation("w", w_saturated);
    outcome
}
