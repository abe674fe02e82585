//! Distributed (masked) transducers for extended apertures.

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayD};

use super::{Coupling, Sensor, Source};
use crate::grid::Grid;
use crate::state::Partitioned;

/// An extended-aperture transducer defined by a spatial weighting mask.
///
/// The third coupling strategy next to point and band-limited coupling: all
/// cells under the mask share a single scalar time signal. Transmit
/// multiplies the mask by the current signal value; receive projects the
/// field onto the mask (inner product). The mask may be continuous-valued
/// to model apodization across the aperture.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedTransducer {
    mask: ArrayD<f64>,
    signal: Array1<f64>,
    dt: f64,
}

impl DistributedTransducer {
    /// Creates a transducer from a field-shaped weighting mask and a scalar
    /// time signal. An empty signal is valid and transmits nothing.
    pub fn new(mask: ArrayD<f64>, signal: Array1<f64>, dt: f64) -> Result<Self> {
        if mask.ndim() == 0 || mask.ndim() > 3 {
            bail!("transducer mask must have 1, 2 or 3 axes, not {}", mask.ndim());
        }
        Ok(Self { mask, signal, dt })
    }

    /// Replaces the drive signal, keeping the aperture.
    pub fn with_signal(mut self, signal: Array1<f64>) -> Self {
        self.signal = signal;
        self
    }

    /// Replaces the aperture mask, keeping the signal.
    pub fn with_mask(self, mask: ArrayD<f64>) -> Result<Self> {
        Self::new(mask, self.signal, self.dt)
    }

    /// The spatial weighting mask.
    pub fn mask(&self) -> &ArrayD<f64> {
        &self.mask
    }

    /// The scalar drive signal.
    pub fn signal(&self) -> &Array1<f64> {
        &self.signal
    }

    /// Time step of the drive signal.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Transmit mode: the field produced by the transducer at time step `n`.
    pub fn transmit(&self, n: usize) -> Result<ArrayD<f64>> {
        if self.signal.is_empty() {
            return Ok(ArrayD::zeros(self.mask.raw_dim()));
        }
        if n >= self.signal.len() {
            bail!(
                "time index {} outside drive signal of {} steps",
                n,
                self.signal.len()
            );
        }
        let s = self.signal[n];
        Ok(self.mask.mapv(|m| m * s))
    }

    /// Receive mode: the transducer output for the wavefield, i.e. the
    /// inner product of the mask with the field.
    pub fn receive(&self, field: &ArrayD<f64>) -> Result<f64> {
        if field.shape() != self.mask.shape() {
            bail!(
                "field shape {:?} does not match mask shape {:?}",
                field.shape(),
                self.mask.shape()
            );
        }
        Ok((&self.mask * field).sum())
    }
}

impl Coupling for DistributedTransducer {
    fn num_points(&self) -> usize {
        1
    }

    fn to_mask(&self, shape: &[usize]) -> Result<ArrayD<bool>> {
        if shape != self.mask.shape() {
            bail!(
                "requested mask shape {:?} does not match aperture shape {:?}",
                shape,
                self.mask.shape()
            );
        }
        Ok(self.mask.mapv(|m| m != 0.0))
    }
}

impl Source for DistributedTransducer {
    fn inject(&self, n: usize) -> Result<ArrayD<f64>> {
        self.transmit(n)
    }
}

impl Sensor for DistributedTransducer {
    fn sample(&self, field: &ArrayD<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_vec(vec![self.receive(field)?]))
    }
}

impl Partitioned for DistributedTransducer {
    /// Mask weights, signal and time step are all continuous state.
    type Active = (ArrayD<f64>, Array1<f64>, f64);
    type Frozen = ();

    fn into_parts(self) -> (Self::Active, Self::Frozen) {
        ((self.mask, self.signal, self.dt), ())
    }

    fn from_parts(active: Self::Active, _frozen: Self::Frozen) -> Result<Self> {
        let (mask, signal, dt) = active;
        Self::new(mask, signal, dt)
    }
}

/// Builds a horizontal line transducer on a 2-D grid: a one-cell-thick
/// aperture of `width` cells centred along the second axis, at row `row` of
/// the first axis. The returned transducer has an empty drive signal;
/// attach one with [`DistributedTransducer::with_signal`].
pub fn line_transducer(grid: &Grid, row: usize, width: usize) -> Result<DistributedTransducer> {
    if grid.ndim() != 2 {
        bail!("line transducer requires a 2-axis grid, got {}", grid.ndim());
    }
    let (n0, n1) = (grid.shape()[0], grid.shape()[1]);
    if row >= n0 {
        bail!("row {} outside grid of {} rows", row, n0);
    }
    if width > n1 {
        bail!("aperture width {} exceeds grid extent {}", width, n1);
    }
    let start = (n1 - width) / 2;
    let end = (n1 + width) / 2;
    let mut mask = grid.zeros();
    for col in start..end {
        mask[[row, col]] = 1.0;
    }
    DistributedTransducer::new(mask, Array1::zeros(0), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn step_mask() -> ArrayD<f64> {
        array![[0.0, 1.0, 0.5], [0.0, 0.0, 0.0]].into_dyn()
    }

    #[test]
    fn test_transmit_scales_mask() {
        let t = DistributedTransducer::new(step_mask(), array![2.0, -1.0], 1e-6).unwrap();
        let field = t.transmit(0).unwrap();
        assert!((field[[0, 1]] - 2.0).abs() < 1e-15);
        assert!((field[[0, 2]] - 1.0).abs() < 1e-15);
        let flipped = t.transmit(1).unwrap();
        assert!((flipped[[0, 1]] + 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_transmit_empty_signal_is_zero_field() {
        let t = DistributedTransducer::new(step_mask(), Array1::zeros(0), 0.0).unwrap();
        let field = t.transmit(0).unwrap();
        assert_eq!(field.shape(), &[2, 3]);
        assert!((field.sum() - 0.0).abs() < 1e-15);
    }

    #[test]
    fn test_receive_is_inner_product() {
        let t = DistributedTransducer::new(step_mask(), Array1::zeros(0), 0.0).unwrap();
        let field = array![[1.0, 2.0, 4.0], [8.0, 16.0, 32.0]].into_dyn();
        // 1.0 * 2.0 + 0.5 * 4.0
        let out = t.receive(&field).unwrap();
        assert!((out - 4.0).abs() < 1e-15);
    }

    #[test]
    fn test_receive_shape_mismatch_rejected() {
        let t = DistributedTransducer::new(step_mask(), Array1::zeros(0), 0.0).unwrap();
        let field = ndarray::Array2::<f64>::zeros((3, 3)).into_dyn();
        assert!(t.receive(&field).is_err());
    }

    #[test]
    fn test_line_transducer_centred() {
        let grid = Grid::isotropic(vec![8, 8], 1.0).unwrap();
        let t = line_transducer(&grid, 3, 4).unwrap();
        let mask = t.mask();
        for col in 2..6 {
            assert!((mask[[3, col]] - 1.0).abs() < 1e-15);
        }
        assert!((mask.sum() - 4.0).abs() < 1e-15);
    }

    #[test]
    fn test_line_transducer_rejects_1d_grid() {
        let grid = Grid::isotropic(vec![8], 1.0).unwrap();
        assert!(line_transducer(&grid, 0, 4).is_err());
    }

    #[test]
    fn test_with_signal_keeps_aperture() {
        let grid = Grid::isotropic(vec![8, 8], 1.0).unwrap();
        let t = line_transducer(&grid, 3, 4)
            .unwrap()
            .with_signal(array![3.0]);
        let field = t.transmit(0).unwrap();
        assert!((field[[3, 2]] - 3.0).abs() < 1e-15);
    }
}
