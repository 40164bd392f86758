// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for graph construction, compilation and stepping

use crate::lifecycle::Lifecycle;
use neurograph_npu_neural::ModelError;
use neurograph_npu_plasticity::PlasticityError;

/// Simulation errors
///
/// Structural problems surface at declaration or compile time. The only
/// step-time error is [`SimError::ClampTypeMismatch`], and a step that fails
/// with it leaves all state untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// `nodes` holds only nodes on a cycle, not those downstream of one
    #[error("Same-step cycle detected between nodes: {}", nodes.join(", "))]
    CyclicGraph { nodes: Vec<String> },

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Unknown compartment '{compartment}' on node '{node}'")]
    UnknownCompartment { node: String, compartment: String },

    #[error("Unknown cable: {0}")]
    UnknownCable(String),

    #[error("Clamp on '{node}.{compartment}' rejected: {reason}")]
    ClampTypeMismatch {
        node: String,
        compartment: String,
        reason: String,
    },

    #[error("Shape mismatch on cable '{cable}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        cable: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Compartment '{compartment}' on node '{node}' is not an input compartment")]
    NotAnInputCompartment { node: String, compartment: String },

    #[error("Plastic cable '{cable}' needs spiking endpoints: {reason}")]
    PlasticityRequiresSpikes { cable: String, reason: String },

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: Lifecycle,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<ModelError> for SimError {
    fn from(err: ModelError) -> Self {
        SimError::InvalidParameters(err.to_string())
    }
}

impl From<PlasticityError> for SimError {
    fn from(err: PlasticityError) -> Self {
        SimError::InvalidParameters(err.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Snapshot(err.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_nodes() {
        let err = SimError::CyclicGraph {
            nodes: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Same-step cycle detected between nodes: a, b");
    }

    #[test]
    fn test_model_error_conversion() {
        let err: SimError = ModelError::EmptyPopulation.into();
        assert!(matches!(err, SimError::InvalidParameters(_)));
    }

    #[test]
    fn test_transition_message() {
        let err = SimError::InvalidTransition {
            action: "step",
            state: Lifecycle::Halted,
        };
        assert_eq!(err.to_string(), "Cannot step while halted");
    }
}
