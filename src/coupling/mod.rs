//! Coupling between physical transducer geometry and the solver grid.
//!
//! Sources and sensors rarely sit exactly on the computational grid. Three
//! strategies bridge the gap, all sharing one contract: exact point
//! coupling at integer indices, band-limited interpolation at fractional
//! coordinates, and distributed masks for extended apertures. The strategy
//! is chosen when the coupling object is built; the solver loop only sees
//! [`Source`] and [`Sensor`].
//!
//! Per time step `n` the solver asks each source for its field contribution
//! via [`Source::inject`], advances the field, then reads each sensor with
//! [`Sensor::sample`]. Coupling objects hold no simulation state beyond
//! weights precomputed at construction.

pub mod bli;
pub mod sensors;
pub mod sources;
pub mod transducer;

pub use bli::{SeparableInterpolant, bli_weights, bli_weights_complex};
pub use sensors::{BliSensors, PointSensors};
pub use sources::{BliSources, PointSources, TimeHarmonicSource};
pub use transducer::{DistributedTransducer, line_transducer};

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayD, IxDyn};

/// Common surface of every coupling object.
pub trait Coupling {
    /// Number of coupled points (1 for a distributed transducer).
    fn num_points(&self) -> usize;

    /// Boolean grid mask with `true` at every owned cell.
    ///
    /// Used by external code for visualization and for carving out
    /// localized media or transducer regions.
    fn to_mask(&self, shape: &[usize]) -> Result<ArrayD<bool>>;
}

/// Transmit side of the coupling contract.
///
/// `inject(n)` returns the field-shaped contribution for discrete time step
/// `n`; the solver adds it to the field before advancing.
pub trait Source: Coupling {
    fn inject(&self, n: usize) -> Result<ArrayD<f64>>;
}

/// Receive side of the coupling contract.
///
/// `sample(field)` extracts one value per coupled point from the current
/// field; successive calls are stacked externally into a
/// `(num_points, num_timesteps)` record over a full run.
pub trait Sensor: Coupling {
    fn sample(&self, field: &ArrayD<f64>) -> Result<Array1<f64>>;
}

/// Boolean mask with `true` at each integer position.
///
/// Positions are expected inside the grid; out-of-range indices panic, as
/// does any other out-of-bounds array access.
pub(crate) fn point_mask(positions: &[Vec<usize>], shape: &[usize]) -> Result<ArrayD<bool>> {
    if shape.len() != positions.len() {
        bail!(
            "mask shape has {} axes but positions have {}",
            shape.len(),
            positions.len()
        );
    }
    let mut mask = ArrayD::from_elem(IxDyn(shape), false);
    let mut idx = vec![0usize; positions.len()];
    for p in 0..positions[0].len() {
        for (axis, pos) in positions.iter().enumerate() {
            idx[axis] = pos[p];
        }
        mask[IxDyn(&idx)] = true;
    }
    Ok(mask)
}

/// Nearest-cell integer positions for fractional coordinates, clamped to
/// the grid so visualization masks never index out of bounds.
pub(crate) fn rounded_positions(positions: &[Vec<f64>], shape: &[usize]) -> Vec<Vec<usize>> {
    positions
        .iter()
        .zip(shape)
        .map(|(axis, &n)| {
            axis.iter()
                .map(|&x| (x.round() as usize).min(n - 1))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_mask_marks_cells() {
        let mask = point_mask(&[vec![0, 2], vec![1, 3]], &[4, 4]).unwrap();
        assert!(mask[[0, 1]]);
        assert!(mask[[2, 3]]);
        let count = mask.iter().filter(|&&m| m).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_point_mask_axis_mismatch() {
        assert!(point_mask(&[vec![0]], &[4, 4]).is_err());
    }

    #[test]
    fn test_rounded_positions_clamped() {
        let rounded = rounded_positions(&[vec![1.4, 7.8], vec![0.5, 2.0]], &[8, 4]);
        assert_eq!(rounded[0], vec![1, 7]);
        assert_eq!(rounded[1], vec![1, 2]);
    }
}
