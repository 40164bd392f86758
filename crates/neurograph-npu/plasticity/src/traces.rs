// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-cable learning state: spike traces, last spike times and eligibility

use crate::rule::TraceMode;
use ndarray::{Array1, Array2, ArrayView1};

/// Learning state owned by one plastic cable
#[derive(Debug, Clone, PartialEq)]
pub struct SynapticTraces {
    /// Pre-synaptic trace, one entry per source unit
    pub pre: Array1<f32>,
    /// Post-synaptic trace, one entry per destination unit
    pub post: Array1<f32>,
    /// Last pre spike time (`-inf` until the first spike)
    pub last_pre: Array1<f32>,
    /// Last post spike time (`-inf` until the first spike)
    pub last_post: Array1<f32>,
    /// Eligibility trace (modulated rules only)
    pub eligibility: Option<Array2<f32>>,
}

impl SynapticTraces {
    pub fn new(n_pre: usize, n_post: usize, with_eligibility: bool) -> Self {
        Self {
            pre: Array1::zeros(n_pre),
            post: Array1::zeros(n_post),
            last_pre: Array1::from_elem(n_pre, f32::NEG_INFINITY),
            last_post: Array1::from_elem(n_post, f32::NEG_INFINITY),
            eligibility: with_eligibility.then(|| Array2::zeros((n_pre, n_post))),
        }
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.pre.fill(0.0);
        self.post.fill(0.0);
        self.last_pre.fill(f32::NEG_INFINITY);
        self.last_post.fill(f32::NEG_INFINITY);
        if let Some(eligibility) = self.eligibility.as_mut() {
            eligibility.fill(0.0);
        }
    }
}

/// Multiply every entry by `factor`
pub(crate) fn decay(trace: &mut Array1<f32>, factor: f32) {
    trace.mapv_inplace(|x| x * factor);
}

/// Bump the trace of every spiking unit; returns how many entries saturated
pub(crate) fn register_spikes(
    trace: &mut Array1<f32>,
    spikes: ArrayView1<'_, f32>,
    mode: TraceMode,
    bound: f32,
) -> usize {
    let mut saturated = 0;
    for (x, &s) in trace.iter_mut().zip(spikes.iter()) {
        if s > 0.0 {
            let bumped = match mode {
                TraceMode::Increment => *x + s,
                TraceMode::Reset => s,
            };
            if bumped > bound {
                saturated += 1;
                *x = bound;
            } else {
                *x = bumped;
            }
        }
    }
    saturated
}

/// Record the spike time of every spiking unit
pub(crate) fn stamp_spikes(last: &mut Array1<f32>, spikes: ArrayView1<'_, f32>, time: f32) {
    for (t, &s) in last.iter_mut().zip(spikes.iter()) {
        if s > 0.0 {
            *t = time;
        }
    }
}
