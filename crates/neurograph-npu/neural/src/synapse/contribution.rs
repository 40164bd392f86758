// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Dense cable contribution.
//!
//! ```text
//! out = (in · W) × resist_scale × sign + bias
//! ```
//!
//! `W` has shape `(source units, destination units)`. Contributions are added
//! into the destination's accumulation buffer, so the caller controls the
//! summation order.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Synapse sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynapseType {
    #[default]
    Excitatory,
    Inhibitory,
}

impl SynapseType {
    #[inline(always)]
    pub fn sign(self) -> f32 {
        match self {
            SynapseType::Excitatory => 1.0,
            SynapseType::Inhibitory => -1.0,
        }
    }
}

/// Linear transform applied by a cable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseTransform {
    /// Scale applied to the projected signal
    pub resist_scale: f32,
    /// Optional per-destination bias
    pub bias: Option<Vec<f32>>,
}

impl Default for DenseTransform {
    fn default() -> Self {
        Self {
            resist_scale: 1.0,
            bias: None,
        }
    }
}

impl DenseTransform {
    pub fn with_resist_scale(mut self, resist_scale: f32) -> Self {
        self.resist_scale = resist_scale;
        self
    }

    pub fn with_bias(mut self, bias: Vec<f32>) -> Self {
        self.bias = Some(bias);
        self
    }

    /// Add this cable's contribution into `acc`
    #[inline]
    pub fn accumulate(
        &self,
        input: ArrayView1<'_, f32>,
        weights: ArrayView2<'_, f32>,
        synapse_type: SynapseType,
        acc: &mut Array1<f32>,
    ) {
        let scale = self.resist_scale;
        let sign = synapse_type.sign();
        let mut projected = input.dot(&weights);
        projected.mapv_inplace(|value| value * scale * sign);
        if let Some(bias) = &self.bias {
            for (value, b) in projected.iter_mut().zip(bias) {
                *value += *b;
            }
        }
        *acc += &projected;
    }
}
