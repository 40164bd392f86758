// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Pure STDP kernels
//!
//! Allocation-free building blocks shared by every rule variant.

use crate::rule::PlasticityRule;

/// Pair-based STDP weight change for one spike pair
///
/// - Δw = A+ * exp(-Δt/τ_pre) if pre before post (potentiation)
/// - Δw = -A- * exp(Δt/τ_post) if post before pre (depression)
///
/// # Arguments
/// * `delta_t` - Spike timing difference (post_time - pre_time)
/// * `rule` - Amplitudes and time constants
///
/// # Example
/// ```
/// use neurograph_npu_plasticity::stdp_core::compute_stdp_weight_change;
/// use neurograph_npu_plasticity::PlasticityRule;
///
/// let rule = PlasticityRule::exponential();
/// assert!(compute_stdp_weight_change(5.0, &rule) > 0.0);
/// assert!(compute_stdp_weight_change(-5.0, &rule) < 0.0);
/// ```
#[inline]
pub fn compute_stdp_weight_change(delta_t: f32, rule: &PlasticityRule) -> f32 {
    if delta_t > 0.0 {
        rule.a_plus * (-delta_t / rule.tau_pre).exp()
    } else if delta_t < 0.0 {
        -rule.a_minus * (delta_t / rule.tau_post).exp()
    } else {
        0.0
    }
}

/// Exponential decay factor for one step
#[inline(always)]
pub fn decay_factor(dt: f32, tau: f32) -> f32 {
    (-dt / tau).exp()
}

/// Power-law potentiation scale: `((w_max - w) / (w_max - w_min))^mu`
#[inline(always)]
pub fn soft_bound_ltp(weight: f32, rule: &PlasticityRule) -> f32 {
    let range = rule.w_max - rule.w_min;
    ((rule.w_max - weight) / range).max(0.0).powf(rule.mu)
}

/// Power-law depression scale: `((w - w_min) / (w_max - w_min))^mu`
#[inline(always)]
pub fn soft_bound_ltd(weight: f32, rule: &PlasticityRule) -> f32 {
    let range = rule.w_max - rule.w_min;
    ((weight - rule.w_min) / range).max(0.0).powf(rule.mu)
}

/// Hebbian soft-bound scale: `soft_bound - |w|`, or 1 when disabled
#[inline(always)]
pub fn hebbian_scale(weight: f32, rule: &PlasticityRule) -> f32 {
    if rule.soft_bound > 0.0 {
        rule.soft_bound - weight.abs()
    } else {
        1.0
    }
}
