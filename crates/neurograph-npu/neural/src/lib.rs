// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # neurograph Neural Computation
//!
//! Everything a single node or cable needs, independent of graph execution:
//! - **Types**: node/cable identifiers, compartment layouts and state storage
//! - **Models**: graded, LIF family, AdEx and Izhikevich dynamics
//! - **Synapse**: dense cable transform and weight initialisation

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod models;
pub mod synapse;
pub mod types;

pub use models::{
    saturate, Activation, AdExParameters, ElifParameters, GradedParameters,
    IzhikevichParameters, LifParameters, NeuronModel, NodeModel, Overrides,
    QuadraticLifParameters, Saturation, StepContext, UpdateOutcome,
};
pub use synapse::{clip_weights, DenseTransform, PatchLayout, SynapseType, WeightInit};
pub use types::{
    CableId, CompartmentKind, CompartmentSpec, CompartmentState, ModelError, ModelResult,
    NodeId,
};
