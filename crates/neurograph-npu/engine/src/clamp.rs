// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Injection / Clamping table
//!
//! Side table keyed by `(node, compartment index)`. Only compartments declared
//! as clamp sites at build time have an entry. Entries persist across steps
//! and resets until cleared; setting one again replaces it.
//!
//! Values are validated against the compartment when a step starts, before
//! anything is mutated, so a bad clamp fails the step as a whole.

use crate::error::{SimError, SimResult};
use crate::node::Node;
use ahash::AHashMap;
use ndarray::Array1;
use neurograph_npu_neural::{CompartmentKind, NodeId};
use serde::{Deserialize, Serialize};

/// Value forced onto a compartment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampValue {
    /// Same value for every unit
    Scalar(f32),
    /// One value per unit
    Vector(Vec<f32>),
    /// One frame per step (each frame scalar-length or per-unit); the last
    /// frame holds once the schedule runs out
    Schedule(Vec<Vec<f32>>),
}

impl From<f32> for ClampValue {
    fn from(value: f32) -> Self {
        ClampValue::Scalar(value)
    }
}

impl From<Vec<f32>> for ClampValue {
    fn from(values: Vec<f32>) -> Self {
        ClampValue::Vector(values)
    }
}

impl ClampValue {
    /// Expand to exactly `n_units` values for `step`
    pub fn resolve(
        &self,
        step: u64,
        n_units: usize,
        kind: CompartmentKind,
    ) -> Result<Array1<f32>, String> {
        let values = match self {
            ClampValue::Scalar(value) => Array1::from_elem(n_units, *value),
            ClampValue::Vector(values) => expand(values, n_units)?,
            ClampValue::Schedule(frames) => {
                let last = frames.len().checked_sub(1).ok_or("schedule is empty")?;
                let index = usize::try_from(step).unwrap_or(usize::MAX).min(last);
                expand(&frames[index], n_units)?
            }
        };

        if let Some(bad) = values.iter().find(|value| !value.is_finite()) {
            return Err(format!("value {} is not finite", bad));
        }
        if kind.is_binary() {
            if let Some(bad) = values.iter().find(|&&value| value != 0.0 && value != 1.0) {
                return Err(format!("spike compartment only accepts 0 or 1, got {}", bad));
            }
        }
        Ok(values)
    }
}

fn expand(values: &[f32], n_units: usize) -> Result<Array1<f32>, String> {
    match values.len() {
        len if len == n_units => Ok(Array1::from(values.to_vec())),
        1 => Ok(Array1::from_elem(n_units, values[0])),
        len => Err(format!("expected {} values, got {}", n_units, len)),
    }
}

/// Table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClampKey {
    pub node: NodeId,
    pub compartment: usize,
}

/// State of one clamp site
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClampEntry {
    #[default]
    Free,
    Clamped(ClampValue),
}

/// Resolved overrides for one step: `[node][compartment] -> values`
pub type ResolvedClamps = Vec<Vec<Option<Array1<f32>>>>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClampTable {
    entries: AHashMap<ClampKey, ClampEntry>,
}

impl ClampTable {
    pub(crate) fn with_sites(sites: impl IntoIterator<Item = ClampKey>) -> Self {
        let entries = sites
            .into_iter()
            .map(|key| (key, ClampEntry::Free))
            .collect();
        Self { entries }
    }

    pub fn is_site(&self, key: ClampKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn entry(&self, key: ClampKey) -> Option<&ClampEntry> {
        self.entries.get(&key)
    }

    /// Declared sites in key order
    pub fn sites(&self) -> Vec<ClampKey> {
        let mut keys: Vec<ClampKey> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn active_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry, ClampEntry::Clamped(_)))
            .count()
    }

    /// Returns `false` if `key` is not a declared site
    pub(crate) fn set(&mut self, key: ClampKey, value: ClampValue) -> bool {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                *entry = ClampEntry::Clamped(value);
                true
            }
            None => false,
        }
    }

    /// Returns `false` if `key` is not a declared site
    pub(crate) fn clear(&mut self, key: ClampKey) -> bool {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                *entry = ClampEntry::Free;
                true
            }
            None => false,
        }
    }

    /// Expand every active clamp for `step`
    ///
    /// Nodes without active clamps get an empty slot list.
    pub(crate) fn resolve(&self, step: u64, nodes: &[Node]) -> SimResult<ResolvedClamps> {
        let mut resolved: ResolvedClamps = vec![Vec::new(); nodes.len()];
        for key in self.sites() {
            let Some(ClampEntry::Clamped(value)) = self.entries.get(&key) else {
                continue;
            };
            let node = &nodes[key.node.index()];
            let kind = node
                .compartment_kind(key.compartment)
                .unwrap_or(CompartmentKind::State);
            let values = value.resolve(step, node.n_units(), kind).map_err(|reason| {
                SimError::ClampTypeMismatch {
                    node: node.name().to_string(),
                    compartment: node.compartment_name(key.compartment).to_string(),
                    reason,
                }
            })?;

            let slots = &mut resolved[key.node.index()];
            if slots.is_empty() {
                slots.resize(node.state().compartment_count(), None);
            }
            slots[key.compartment] = Some(values);
        }
        Ok(resolved)
    }
}
