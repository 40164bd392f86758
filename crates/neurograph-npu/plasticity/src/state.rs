// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Per-cable plasticity update
//!
//! ## Trace-based rules (exponential, power-law, modulated)
//!
//! ```text
//! 1. x_pre *= exp(-dt/τ_pre), x_post *= exp(-dt/τ_post)
//! 2. Δw_ij = η (A+ x_pre_i s_post_j - A- s_pre_i x_post_j)
//! 3. x_pre, x_post bumped on their spikes (increment or reset)
//! 4. w clipped to [w_min, w_max]
//! ```
//!
//! Step 2 uses the traces from before this step's spikes, so a pre and post
//! spike in the same step do not pair with each other.
//!
//! ## Event-based rule
//!
//! Keeps the last spike time of every unit and evaluates the pair kernel only
//! for units that spiked this step. Steps without spikes leave weights
//! unchanged.
//!
//! ## Modulated rule
//!
//! The trace-rule update feeds an eligibility trace instead of the weights;
//! `w += η r e` with modulator `r`, then `w -= w dt/τ_w` when weight decay is
//! enabled.
//!
//! ## Hebbian rule
//!
//! ```text
//! Δw_ij = η (pre_i post_j (b - |w_ij|) + prior(w_ij))
//! ```
//!
//! `pre` and `post` may be graded; the soft-bound factor is dropped when `b`
//! is 0.
//!
//! Every rule ends with the clip to `[w_min, w_max]`, so weights that start
//! out of range are pulled in on the first step.

use crate::rule::{PlasticityRule, RuleKind};
use crate::stdp_core::{
    compute_stdp_weight_change, decay_factor, hebbian_scale, soft_bound_ltd, soft_bound_ltp,
};
use crate::traces::{decay, register_spikes, stamp_spikes, SynapticTraces};
use crate::{PlasticityError, PlasticityResult};
use ndarray::{Array2, ArrayView1, Zip};
use neurograph_npu_neural::clip_weights;

fn spiking_units(spikes: ArrayView1<'_, f32>) -> Vec<usize> {
    spikes
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s > 0.0)
        .map(|(unit, _)| unit)
        .collect()
}

/// Timing of the step being learned from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasticityContext {
    pub dt: f32,
    /// Simulation time at the end of the step
    pub time: f32,
}

/// Result of one plasticity update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlasticityOutcome {
    /// Whether any weight was touched
    pub updated: bool,
    /// Trace entries that hit `trace_bound`
    pub trace_saturations: usize,
}

/// Rule plus learning state for one cable
#[derive(Debug, Clone, PartialEq)]
pub struct PlasticityState {
    rule: PlasticityRule,
    traces: SynapticTraces,
    modulator: f32,
}

impl PlasticityState {
    pub fn new(rule: PlasticityRule, n_pre: usize, n_post: usize) -> PlasticityResult<Self> {
        rule.validate()?;
        let with_eligibility = rule.kind == RuleKind::Modulated;
        Ok(Self {
            traces: SynapticTraces::new(n_pre, n_post, with_eligibility),
            rule,
            modulator: 0.0,
        })
    }

    pub fn rule(&self) -> &PlasticityRule {
        &self.rule
    }

    pub fn traces(&self) -> &SynapticTraces {
        &self.traces
    }

    pub fn modulator(&self) -> f32 {
        self.modulator
    }

    /// Set the third factor for modulated rules
    pub fn set_modulator(&mut self, value: f32) -> PlasticityResult<()> {
        if !value.is_finite() {
            return Err(PlasticityError::InvalidRule {
                field: "modulator",
                reason: format!("{} is not finite", value),
            });
        }
        self.modulator = value;
        Ok(())
    }

    /// Clear traces and eligibility (the modulator is an input and is kept)
    pub fn reset(&mut self) {
        self.traces.reset();
    }

    /// Clip `weights` into the rule's bounds
    pub fn enforce_bounds(&self, weights: &mut Array2<f32>) {
        clip_weights(weights, self.rule.w_min, self.rule.w_max);
    }

    /// Learn from one step
    ///
    /// `pre` is the signal the cable transmitted, `post` the destination's
    /// spike compartment after its update (its output compartment for
    /// Hebbian rules). STDP rules expect binary signals.
    pub fn apply(
        &mut self,
        weights: &mut Array2<f32>,
        pre: ArrayView1<'_, f32>,
        post: ArrayView1<'_, f32>,
        ctx: PlasticityContext,
    ) -> PlasticityOutcome {
        let outcome = match self.rule.kind {
            RuleKind::Exponential | RuleKind::PowerLaw => {
                self.apply_trace_rule(weights, pre, post, ctx)
            }
            RuleKind::EventBased => self.apply_event_rule(weights, pre, post, ctx),
            RuleKind::Modulated => self.apply_modulated_rule(weights, pre, post, ctx),
            RuleKind::Hebbian => self.apply_hebbian_rule(weights, pre, post),
        };
        self.enforce_bounds(weights);
        outcome
    }

    fn decay_traces(&mut self, dt: f32) {
        decay(&mut self.traces.pre, decay_factor(dt, self.rule.tau_pre));
        decay(&mut self.traces.post, decay_factor(dt, self.rule.tau_post));
    }

    fn register(&mut self, pre: ArrayView1<'_, f32>, post: ArrayView1<'_, f32>) -> usize {
        let rule = &self.rule;
        register_spikes(&mut self.traces.pre, pre, rule.trace_mode, rule.trace_bound)
            + register_spikes(&mut self.traces.post, post, rule.trace_mode, rule.trace_bound)
    }

    /// `(A+ x_pre s_post, A- s_pre x_post)` for one synapse
    #[inline(always)]
    fn pair_terms(
        &self,
        i: usize,
        j: usize,
        pre: &ArrayView1<'_, f32>,
        post: &ArrayView1<'_, f32>,
    ) -> (f32, f32) {
        let ltp = self.rule.a_plus * self.traces.pre[i] * post[j];
        let ltd = self.rule.a_minus * pre[i] * self.traces.post[j];
        (ltp, ltd)
    }

    fn apply_trace_rule(
        &mut self,
        weights: &mut Array2<f32>,
        pre: ArrayView1<'_, f32>,
        post: ArrayView1<'_, f32>,
        ctx: PlasticityContext,
    ) -> PlasticityOutcome {
        self.decay_traces(ctx.dt);

        let any_spike = pre.iter().any(|&s| s > 0.0) || post.iter().any(|&s| s > 0.0);
        if any_spike {
            let power_law = self.rule.kind == RuleKind::PowerLaw;
            for ((i, j), w) in weights.indexed_iter_mut() {
                let (mut ltp, mut ltd) = self.pair_terms(i, j, &pre, &post);
                if power_law {
                    ltp *= soft_bound_ltp(*w, &self.rule);
                    ltd *= soft_bound_ltd(*w, &self.rule);
                }
                *w += self.rule.eta * (ltp - ltd);
            }
        }

        PlasticityOutcome {
            updated: any_spike,
            trace_saturations: self.register(pre, post),
        }
    }

    fn apply_event_rule(
        &mut self,
        weights: &mut Array2<f32>,
        pre: ArrayView1<'_, f32>,
        post: ArrayView1<'_, f32>,
        ctx: PlasticityContext,
    ) -> PlasticityOutcome {
        let pre_spiked = spiking_units(pre);
        let post_spiked = spiking_units(post);
        if pre_spiked.is_empty() && post_spiked.is_empty() {
            return PlasticityOutcome::default();
        }

        let eta = self.rule.eta;
        // Post spikes now pair with earlier pre spikes (potentiation)
        for &j in &post_spiked {
            for (i, &t_pre) in self.traces.last_pre.iter().enumerate() {
                if t_pre.is_finite() {
                    weights[[i, j]] +=
                        eta * compute_stdp_weight_change(ctx.time - t_pre, &self.rule);
                }
            }
        }
        // Pre spikes now pair with earlier post spikes (depression)
        for &i in &pre_spiked {
            for (j, &t_post) in self.traces.last_post.iter().enumerate() {
                if t_post.is_finite() {
                    weights[[i, j]] +=
                        eta * compute_stdp_weight_change(t_post - ctx.time, &self.rule);
                }
            }
        }

        stamp_spikes(&mut self.traces.last_pre, pre, ctx.time);
        stamp_spikes(&mut self.traces.last_post, post, ctx.time);

        PlasticityOutcome {
            updated: true,
            trace_saturations: 0,
        }
    }

    fn apply_modulated_rule(
        &mut self,
        weights: &mut Array2<f32>,
        pre: ArrayView1<'_, f32>,
        post: ArrayView1<'_, f32>,
        ctx: PlasticityContext,
    ) -> PlasticityOutcome {
        self.decay_traces(ctx.dt);

        let mut eligibility = match self.traces.eligibility.take() {
            Some(eligibility) => eligibility,
            None => Array2::zeros(weights.dim()),
        };
        let (tau_elg, elg_decay) = (self.rule.tau_elg, self.rule.elg_decay);
        let carry = if tau_elg > 0.0 {
            decay_factor(ctx.dt, tau_elg) * elg_decay
        } else {
            0.0
        };

        for ((i, j), e) in eligibility.indexed_iter_mut() {
            let (ltp, ltd) = self.pair_terms(i, j, &pre, &post);
            let dw = ltp - ltd;
            *e = if tau_elg > 0.0 { *e * carry + dw / tau_elg } else { dw };
        }

        let gain = self.rule.eta * self.modulator;
        if gain != 0.0 {
            Zip::from(&mut *weights)
                .and(&eligibility)
                .for_each(|w, &e| *w += gain * e);
        }
        self.traces.eligibility = Some(eligibility);

        let decay = if self.rule.tau_w > 0.0 {
            ctx.dt / self.rule.tau_w
        } else {
            0.0
        };
        if decay != 0.0 {
            weights.mapv_inplace(|w| w - w * decay);
        }

        PlasticityOutcome {
            updated: gain != 0.0 || decay != 0.0,
            trace_saturations: self.register(pre, post),
        }
    }

    fn apply_hebbian_rule(
        &self,
        weights: &mut Array2<f32>,
        pre: ArrayView1<'_, f32>,
        post: ArrayView1<'_, f32>,
    ) -> PlasticityOutcome {
        let active = pre.iter().any(|&x| x != 0.0) && post.iter().any(|&y| y != 0.0);
        let prior = self.rule.prior;
        if !active && !prior.is_active() {
            return PlasticityOutcome::default();
        }

        let eta = self.rule.eta;
        for ((i, j), w) in weights.indexed_iter_mut() {
            let hebb = pre[i] * post[j] * hebbian_scale(*w, &self.rule);
            *w += eta * (hebb + prior.term(*w));
        }

        PlasticityOutcome {
            updated: true,
            trace_saturations: 0,
        }
    }
}
