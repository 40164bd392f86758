// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Weight matrix initialisation and clipping

use crate::types::{ModelError, ModelResult};
use ndarray::{s, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How a cable's weight matrix is created at declaration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightInit {
    /// Every entry equal to `value`
    Constant { value: f32 },
    /// Uniform in `[low, high)`, drawn from the cable's seeded RNG
    Uniform { low: f32, high: f32 },
    /// Row-major values, one row per source unit
    Explicit { values: Vec<f32> },
}

impl WeightInit {
    pub fn constant(value: f32) -> Self {
        WeightInit::Constant { value }
    }

    pub fn uniform(low: f32, high: f32) -> Self {
        WeightInit::Uniform { low, high }
    }

    /// Build a `(rows, cols)` matrix
    ///
    /// `connection_probability` zeroes each entry independently with
    /// probability `1 - p`. All randomness comes from `seed`, so the same
    /// declaration always yields the same matrix.
    pub fn build(
        &self,
        shape: (usize, usize),
        connection_probability: Option<f32>,
        seed: u64,
    ) -> ModelResult<Array2<f32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut weights = match self {
            WeightInit::Constant { value } => {
                if !value.is_finite() {
                    return Err(ModelError::InvalidInitializer(
                        "constant weight must be finite".to_string(),
                    ));
                }
                Array2::from_elem(shape, *value)
            }
            WeightInit::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite() && low < high) {
                    return Err(ModelError::InvalidInitializer(format!(
                        "uniform range [{}, {}) is empty or not finite",
                        low, high
                    )));
                }
                Array2::from_shape_simple_fn(shape, || rng.gen_range(*low..*high))
            }
            WeightInit::Explicit { values } => {
                if values.len() != shape.0 * shape.1 {
                    return Err(ModelError::WeightShape {
                        expected: shape,
                        actual: (values.len() / shape.1.max(1), shape.1),
                    });
                }
                Array2::from_shape_vec(shape, values.clone())
                    .map_err(|e| ModelError::InvalidInitializer(e.to_string()))?
            }
        };

        if let Some(p) = connection_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::InvalidInitializer(format!(
                    "connection probability {} outside [0, 1]",
                    p
                )));
            }
            if p < 1.0 {
                weights.mapv_inplace(|w| if rng.gen::<f32>() < p { w } else { 0.0 });
            }
        }

        Ok(weights)
    }
}

/// Block-diagonal layout splitting a cable into independent patches
///
/// With `patches = n` and `stride = (si, sj)`, a `(rows, cols)` matrix needs
/// `rows = n·di + 2·si` and `cols = n·dj + 2·sj`. Patch `k` covers rows
/// `k·di .. (k+1)·di + 2·si` and columns `k·dj .. (k+1)·dj + 2·sj`, so
/// neighbouring patches overlap by the stride. The outer `si` rows and `sj`
/// columns on each border stay disconnected.
///
/// ```text
///   [ W1  0   0  ]
///   [ 0   W2  0  ]
///   [ 0   0   W3 ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchLayout {
    pub patches: usize,
    #[serde(default)]
    pub stride: (usize, usize),
}

impl PatchLayout {
    pub fn new(patches: usize) -> Self {
        Self {
            patches,
            stride: (0, 0),
        }
    }

    pub fn with_stride(mut self, rows: usize, cols: usize) -> Self {
        self.stride = (rows, cols);
        self
    }

    /// Binary connectivity mask for a `(rows, cols)` matrix
    pub fn mask(&self, shape: (usize, usize)) -> ModelResult<Array2<f32>> {
        let (rows, cols) = shape;
        let (si, sj) = self.stride;
        let fits = |len: usize, stride: usize| {
            len > 2 * stride && (len - 2 * stride) % self.patches == 0
        };
        if self.patches == 0 || !fits(rows, si) || !fits(cols, sj) {
            return Err(ModelError::InvalidInitializer(format!(
                "{} patches with stride {:?} do not tile a {}x{} matrix",
                self.patches, self.stride, rows, cols
            )));
        }

        let di = (rows - 2 * si) / self.patches;
        let dj = (cols - 2 * sj) / self.patches;
        let mut mask = Array2::zeros(shape);
        for k in 0..self.patches {
            mask.slice_mut(s![k * di..(k + 1) * di + 2 * si, k * dj..(k + 1) * dj + 2 * sj])
                .fill(1.0);
        }
        mask.slice_mut(s![..si, ..]).fill(0.0);
        mask.slice_mut(s![rows - si.., ..]).fill(0.0);
        mask.slice_mut(s![.., ..sj]).fill(0.0);
        mask.slice_mut(s![.., cols - sj..]).fill(0.0);
        Ok(mask)
    }
}

/// Clip every weight into `[w_min, w_max]`
pub fn clip_weights(weights: &mut Array2<f32>, w_min: f32, w_max: f32) {
    weights.mapv_inplace(|w| w.clamp(w_min, w_max));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_init() {
        let w = WeightInit::constant(1.5).build((2, 3), None, 0).unwrap();
        assert_eq!(w.dim(), (2, 3));
        assert!(w.iter().all(|&x| x == 1.5));
    }

    #[test]
    fn test_uniform_init_is_seeded() {
        let init = WeightInit::uniform(-0.5, 0.5);
        let a = init.build((4, 4), None, 42).unwrap();
        let b = init.build((4, 4), None, 42).unwrap();
        let c = init.build((4, 4), None, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|&x| (-0.5..0.5).contains(&x)));
    }

    #[test]
    fn test_explicit_shape_checked() {
        let init = WeightInit::Explicit {
            values: vec![1.0, 2.0, 3.0],
        };
        assert!(matches!(
            init.build((2, 2), None, 0),
            Err(ModelError::WeightShape { .. })
        ));
        let ok = WeightInit::Explicit {
            values: vec![1.0, 2.0, 3.0, 4.0],
        }
        .build((2, 2), None, 0)
        .unwrap();
        assert_eq!(ok[[1, 0]], 3.0);
    }

    #[test]
    fn test_connection_probability_masks() {
        let init = WeightInit::constant(1.0);
        let none = init.build((10, 10), Some(0.0), 7).unwrap();
        assert!(none.iter().all(|&x| x == 0.0));
        let sparse = init.build((20, 20), Some(0.5), 7).unwrap();
        let kept = sparse.iter().filter(|&&x| x == 1.0).count();
        assert!(kept > 100 && kept < 300);
        assert!(init.build((2, 2), Some(1.5), 7).is_err());
    }

    #[test]
    fn test_patch_mask_is_block_diagonal() {
        let mask = PatchLayout::new(2).mask((4, 6)).unwrap();
        let expected = ndarray::array![
            [1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            [0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        ];
        assert_eq!(mask, expected);
    }

    #[test]
    fn test_patch_stride_overlaps_and_clears_borders() {
        // di = dj = 2, patches cover rows/cols 0..4 and 2..6
        let mask = PatchLayout::new(2).with_stride(1, 1).mask((6, 6)).unwrap();
        assert!(mask.row(0).iter().all(|&m| m == 0.0));
        assert!(mask.row(5).iter().all(|&m| m == 0.0));
        assert!(mask.column(0).iter().all(|&m| m == 0.0));
        assert_eq!(mask[[1, 1]], 1.0);
        assert_eq!(mask[[3, 3]], 1.0);
        assert_eq!(mask[[2, 4]], 1.0);
        assert_eq!(mask[[1, 4]], 0.0);
        assert_eq!(mask[[4, 1]], 0.0);
    }

    #[test]
    fn test_patch_layout_must_tile() {
        assert!(PatchLayout::new(3).mask((4, 6)).is_err());
        assert!(PatchLayout::new(0).mask((4, 4)).is_err());
        assert!(PatchLayout::new(1).with_stride(2, 0).mask((4, 4)).is_err());
    }

    #[test]
    fn test_clip_weights() {
        let mut w = Array2::from_shape_vec((1, 3), vec![-1.0, 0.5, 2.0]).unwrap();
        clip_weights(&mut w, 0.0, 1.0);
        assert_eq!(w.row(0).to_vec(), vec![0.0, 0.5, 1.0]);
    }
}
