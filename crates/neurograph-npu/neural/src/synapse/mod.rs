// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cable transforms and weight initialisation

pub mod contribution;
pub mod weight;

pub use contribution::{DenseTransform, SynapseType};
pub use weight::{clip_weights, PatchLayout, WeightInit};
