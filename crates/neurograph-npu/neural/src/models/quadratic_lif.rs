// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Quadratic LIF: LIF plus `a0 × (V - V_rest) × (V - V_crit)` in the drive.
//!
//! Below `v_crit` the quadratic term pulls the potential back toward rest;
//! above it the potential runs away until the threshold catches it.

use super::integrate_fire::advance_integrate_and_fire;
use super::lif::{LifParameters, LIF_COMPARTMENTS, LIF_LAYOUT};
use super::{NeuronModel, Overrides, StepContext, UpdateOutcome};
use crate::types::{CompartmentSpec, CompartmentState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadraticLifParameters {
    pub lif: LifParameters,
    /// Critical voltage where the quadratic term changes sign
    pub v_crit: f32,
    /// Quadratic scaling factor
    pub a0: f32,
}

impl Default for QuadraticLifParameters {
    fn default() -> Self {
        Self {
            lif: LifParameters::default(),
            v_crit: 0.8,
            a0: 1.0,
        }
    }
}

impl NeuronModel for QuadraticLifParameters {
    fn model_name(&self) -> &'static str {
        "Quadratic Leaky Integrate-and-Fire"
    }

    fn compartments(&self) -> &'static [CompartmentSpec] {
        LIF_COMPARTMENTS
    }

    fn initial_values(&self) -> Vec<f32> {
        self.lif.initial_values()
    }

    fn output_compartment(&self) -> &'static str {
        "s"
    }

    fn spike_compartment(&self) -> Option<&'static str> {
        Some("s")
    }

    fn validate(&self) -> Result<(), &'static str> {
        self.lif.validate_core()?;
        if !(self.a0 >= 0.0) {
            return Err("a0 must be non-negative");
        }
        if !(self.v_crit > self.lif.v_rest) {
            return Err("v_crit must be above v_rest");
        }
        Ok(())
    }

    fn advance(
        &self,
        state: &mut CompartmentState,
        ctx: &StepContext,
        overrides: &Overrides<'_>,
    ) -> UpdateOutcome {
        let (v_rest, v_crit, a0) = (self.lif.v_rest, self.v_crit, self.a0);
        advance_integrate_and_fire(
            &self.lif,
            None,
            move |v| a0 * (v - v_rest) * (v - v_crit),
            LIF_LAYOUT,
            state,
            ctx,
            overrides,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_term_accelerates_above_critical() {
        let lif = LifParameters::default().with_threshold(10.0);
        let quad = QuadraticLifParameters {
            lif,
            v_crit: 0.5,
            a0: 1.0,
        };
        let ctx = StepContext::new(1.0, 1.0, 1e4);

        let mut plain = CompartmentState::from_initial(1, &lif.initial_values());
        let mut fast = CompartmentState::from_initial(1, &quad.initial_values());
        plain.set(1, 0, 2.0);
        fast.set(1, 0, 2.0);
        lif.advance(&mut plain, &ctx, &Overrides::none());
        quad.advance(&mut fast, &ctx, &Overrides::none());
        assert!(fast.get(1, 0) > plain.get(1, 0));

        plain.set(1, 0, 0.25);
        fast.set(1, 0, 0.25);
        lif.advance(&mut plain, &ctx, &Overrides::none());
        quad.advance(&mut fast, &ctx, &Overrides::none());
        assert!(fast.get(1, 0) < plain.get(1, 0));
    }

    #[test]
    fn test_validation() {
        assert!(QuadraticLifParameters::default().validate().is_ok());
        let bad = QuadraticLifParameters {
            v_crit: -1.0,
            ..QuadraticLifParameters::default()
        };
        assert!(bad.validate().is_err());
    }
}
