// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # neurograph Plasticity
//!
//! Local, per-cable learning rules:
//! - **Exponential STDP**: trace-based pair rule with fixed amplitudes
//! - **Power-law STDP**: same pairing, soft-bounded by the distance to the weight bounds
//! - **Event-based STDP**: last-spike-time pairing evaluated only on spike steps
//! - **Modulated STDP**: STDP feeds an eligibility trace, a scalar modulator gates the update
//! - **Hebbian**: two-factor `pre ⊗ post` rule with a soft bound and optional weight prior
//!
//! Weights are held in `[w_min, w_max]` after every step, whether or not the
//! rule changed them.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod rule;
pub mod state;
pub mod stdp_core;
pub mod traces;

pub use rule::{PlasticityRule, RuleKind, TraceMode, WeightPrior};
pub use state::{PlasticityContext, PlasticityOutcome, PlasticityState};
pub use traces::SynapticTraces;

/// Plasticity error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlasticityError {
    #[error("Invalid plasticity rule: {field} {reason}")]
    InvalidRule { field: &'static str, reason: String },
}

pub type PlasticityResult<T> = Result<T, PlasticityError>;
