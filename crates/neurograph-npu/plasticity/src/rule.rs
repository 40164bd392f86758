// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Plasticity rule configuration

use crate::{PlasticityError, PlasticityResult};
use serde::{Deserialize, Serialize};

/// Which learning rule a cable uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Exponential,
    PowerLaw,
    EventBased,
    Modulated,
    /// Two-factor `pre ⊗ post` rule on graded or spiking signals
    Hebbian,
}

/// Weight prior added to Hebbian updates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightPrior {
    #[default]
    None,
    /// `-λ sign(w)`
    L1 { lambda: f32 },
    /// `-λ w`
    L2 { lambda: f32 },
    /// `-λ (r sign(w) + (1 - r) w / 2)`
    ElasticNet { lambda: f32, l1_ratio: f32 },
}

impl WeightPrior {
    /// Prior term for one weight
    #[inline(always)]
    pub fn term(&self, w: f32) -> f32 {
        let sign = if w > 0.0 {
            1.0
        } else if w < 0.0 {
            -1.0
        } else {
            0.0
        };
        match *self {
            WeightPrior::None => 0.0,
            WeightPrior::L1 { lambda } => -lambda * sign,
            WeightPrior::L2 { lambda } => -lambda * w,
            WeightPrior::ElasticNet { lambda, l1_ratio } => {
                -lambda * (l1_ratio * sign + (1.0 - l1_ratio) * w / 2.0)
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, WeightPrior::None)
    }
}

/// How a trace reacts to a spike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    /// `x += 1` (all-to-all pairing)
    #[default]
    Increment,
    /// `x = 1` (nearest-spike pairing)
    Reset,
}

/// Learning rule attached to a cable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasticityRule {
    pub kind: RuleKind,
    /// Pre-synaptic trace time constant (τ_pre)
    pub tau_pre: f32,
    /// Post-synaptic trace time constant (τ_post)
    pub tau_post: f32,
    /// Potentiation amplitude (A+)
    pub a_plus: f32,
    /// Depression amplitude (A-)
    pub a_minus: f32,
    /// Learning rate
    pub eta: f32,
    pub w_min: f32,
    pub w_max: f32,
    /// Power-law exponent (PowerLaw only)
    pub mu: f32,
    pub trace_mode: TraceMode,
    /// Traces saturate at this magnitude
    pub trace_bound: f32,
    /// Eligibility time constant (Modulated only); 0 means no eligibility memory
    pub tau_elg: f32,
    /// Extra eligibility decay factor per step (Modulated only)
    pub elg_decay: f32,
    /// Weight decay time constant (Modulated only); 0 disables decay
    pub tau_w: f32,
    /// Hebbian soft bound: updates scale by `soft_bound - |w|`; 0 disables
    pub soft_bound: f32,
    /// Hebbian weight prior
    pub prior: WeightPrior,
}

impl Default for PlasticityRule {
    fn default() -> Self {
        Self {
            kind: RuleKind::Exponential,
            tau_pre: 20.0,
            tau_post: 20.0,
            a_plus: 0.01,
            a_minus: 0.012,
            eta: 1.0,
            w_min: 0.0,
            w_max: 1.0,
            mu: 1.0,
            trace_mode: TraceMode::Increment,
            trace_bound: 100.0,
            tau_elg: 0.0,
            elg_decay: 1.0,
            tau_w: 0.0,
            soft_bound: 0.0,
            prior: WeightPrior::None,
        }
    }
}

impl PlasticityRule {
    pub fn exponential() -> Self {
        Self::default()
    }

    pub fn power_law(mu: f32) -> Self {
        Self {
            kind: RuleKind::PowerLaw,
            mu,
            ..Self::default()
        }
    }

    pub fn event_based() -> Self {
        Self {
            kind: RuleKind::EventBased,
            ..Self::default()
        }
    }

    pub fn modulated(tau_elg: f32) -> Self {
        Self {
            kind: RuleKind::Modulated,
            tau_elg,
            ..Self::default()
        }
    }

    /// Hebbian rule clipped to `[-1, 1]` with a soft bound at 1
    pub fn hebbian(eta: f32) -> Self {
        Self {
            kind: RuleKind::Hebbian,
            eta,
            w_min: -1.0,
            w_max: 1.0,
            soft_bound: 1.0,
            ..Self::default()
        }
    }

    pub fn with_soft_bound(mut self, soft_bound: f32) -> Self {
        self.soft_bound = soft_bound;
        self
    }

    pub fn with_prior(mut self, prior: WeightPrior) -> Self {
        self.prior = prior;
        self
    }

    pub fn with_weight_decay(mut self, tau_w: f32) -> Self {
        self.tau_w = tau_w;
        self
    }

    /// Whether both endpoints must carry spikes
    pub fn needs_spikes(&self) -> bool {
        self.kind != RuleKind::Hebbian
    }

    pub fn with_bounds(mut self, w_min: f32, w_max: f32) -> Self {
        self.w_min = w_min;
        self.w_max = w_max;
        self
    }

    pub fn with_amplitudes(mut self, a_plus: f32, a_minus: f32) -> Self {
        self.a_plus = a_plus;
        self.a_minus = a_minus;
        self
    }

    pub fn with_time_constants(mut self, tau_pre: f32, tau_post: f32) -> Self {
        self.tau_pre = tau_pre;
        self.tau_post = tau_post;
        self
    }

    pub fn with_learning_rate(mut self, eta: f32) -> Self {
        self.eta = eta;
        self
    }

    pub fn with_trace_mode(mut self, trace_mode: TraceMode) -> Self {
        self.trace_mode = trace_mode;
        self
    }

    pub fn validate(&self) -> PlasticityResult<()> {
        fn invalid(field: &'static str, reason: &str) -> PlasticityError {
            PlasticityError::InvalidRule {
                field,
                reason: reason.to_string(),
            }
        }

        if !(self.tau_pre > 0.0) {
            return Err(invalid("tau_pre", "must be positive"));
        }
        if !(self.tau_post > 0.0) {
            return Err(invalid("tau_post", "must be positive"));
        }
        if !(self.a_plus >= 0.0 && self.a_minus >= 0.0) {
            return Err(invalid("a_plus/a_minus", "must be non-negative"));
        }
        if !self.eta.is_finite() {
            return Err(invalid("eta", "must be finite"));
        }
        if !(self.w_min.is_finite() && self.w_max.is_finite() && self.w_min < self.w_max) {
            return Err(PlasticityError::InvalidRule {
                field: "w_min/w_max",
                reason: format!("[{}, {}] is not a valid range", self.w_min, self.w_max),
            });
        }
        if !(self.mu >= 0.0) {
            return Err(invalid("mu", "must be non-negative"));
        }
        if !(self.trace_bound > 0.0) {
            return Err(invalid("trace_bound", "must be positive"));
        }
        if !(self.tau_elg >= 0.0) {
            return Err(invalid("tau_elg", "must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.elg_decay) {
            return Err(invalid("elg_decay", "must be in [0, 1]"));
        }
        if !(self.tau_w >= 0.0) {
            return Err(invalid("tau_w", "must be non-negative"));
        }
        if !(self.soft_bound >= 0.0) {
            return Err(invalid("soft_bound", "must be non-negative"));
        }
        match self.prior {
            WeightPrior::None => {}
            WeightPrior::L1 { lambda } | WeightPrior::L2 { lambda } => {
                if !(lambda >= 0.0 && lambda.is_finite()) {
                    return Err(invalid("prior", "lambda must be finite and non-negative"));
                }
            }
            WeightPrior::ElasticNet { lambda, l1_ratio } => {
                if !(lambda >= 0.0 && lambda.is_finite()) {
                    return Err(invalid("prior", "lambda must be finite and non-negative"));
                }
                if !(0.0..=1.0).contains(&l1_ratio) {
                    return Err(invalid("prior", "l1_ratio must be in [0, 1]"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PlasticityRule::exponential().validate().is_ok());
        assert!(PlasticityRule::power_law(0.5).validate().is_ok());
        assert!(PlasticityRule::event_based().validate().is_ok());
        assert!(PlasticityRule::modulated(25.0).validate().is_ok());
        assert!(PlasticityRule::hebbian(0.1).validate().is_ok());
    }

    #[test]
    fn test_invalid_prior_rejected() {
        let rule = PlasticityRule::hebbian(0.1).with_prior(WeightPrior::ElasticNet {
            lambda: 0.1,
            l1_ratio: 1.5,
        });
        assert!(rule.validate().unwrap_err().to_string().contains("l1_ratio"));
        let rule = PlasticityRule::hebbian(0.1).with_prior(WeightPrior::L1 { lambda: -1.0 });
        assert!(rule.validate().is_err());
        assert!(PlasticityRule::modulated(0.0)
            .with_weight_decay(-1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_prior_terms() {
        assert_eq!(WeightPrior::None.term(0.5), 0.0);
        assert_eq!(WeightPrior::L1 { lambda: 0.1 }.term(-0.5), 0.1);
        assert_eq!(WeightPrior::L1 { lambda: 0.1 }.term(0.0), 0.0);
        assert_eq!(WeightPrior::L2 { lambda: 0.1 }.term(0.5), -0.05);
        let elastic = WeightPrior::ElasticNet {
            lambda: 1.0,
            l1_ratio: 0.5,
        };
        assert!((elastic.term(0.4) - -(0.5 + 0.5 * 0.4 / 2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_hebbian_accepts_graded_signals() {
        assert!(!PlasticityRule::hebbian(0.1).needs_spikes());
        assert!(PlasticityRule::event_based().needs_spikes());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let err = PlasticityRule::exponential()
            .with_bounds(1.0, 0.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("w_min/w_max"));
    }

    #[test]
    fn test_invalid_time_constant_rejected() {
        let rule = PlasticityRule::exponential().with_time_constants(0.0, 20.0);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let rule: PlasticityRule =
            serde_json::from_str(r#"{"kind":"power_law","mu":0.5}"#).unwrap();
        assert_eq!(rule.kind, RuleKind::PowerLaw);
        assert_eq!(rule.mu, 0.5);
        assert_eq!(rule.a_plus, 0.01);

        let rule: PlasticityRule = serde_json::from_str(
            r#"{"kind":"hebbian","prior":{"kind":"l2","lambda":0.01}}"#,
        )
        .unwrap();
        assert_eq!(rule.kind, RuleKind::Hebbian);
        assert_eq!(rule.prior, WeightPrior::L2 { lambda: 0.01 });
    }
}
