// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Arena identifiers for nodes and cables.
//!
//! Both are dense indices handed out in declaration order, so they double as
//! stable tie-breakers wherever a deterministic order is needed.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Node identifier (index into the node arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Cable identifier (index into the cable arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CableId(pub u32);

impl CableId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cable#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_index() {
        assert_eq!(NodeId::new(7).index(), 7);
        assert_eq!(CableId::new(3).index(), 3);
        assert!(NodeId(1) < NodeId(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeId(4).to_string(), "node#4");
        assert_eq!(CableId(0).to_string(), "cable#0");
    }
}
