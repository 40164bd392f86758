// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions shared by models, cables and the engine

pub mod compartment;
pub mod error;
pub mod ids;

pub use compartment::{compartment_index, CompartmentKind, CompartmentSpec, CompartmentState};
pub use error::{ModelError, ModelResult};
pub use ids::{CableId, NodeId};
