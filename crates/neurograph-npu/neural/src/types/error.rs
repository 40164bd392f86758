// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for model and cable construction

/// Errors raised while validating node models or building cable weights
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid {model} parameters: {reason}")]
    InvalidParameter {
        model: &'static str,
        reason: &'static str,
    },

    #[error("Population size must be at least 1")]
    EmptyPopulation,

    #[error("Weight matrix shape mismatch: expected {expected:?}, got {actual:?}")]
    WeightShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid weight initializer: {0}")]
    InvalidInitializer(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
