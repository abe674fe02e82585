//! Sensors: per-time-step extraction of field values at sensor positions.

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayD, IxDyn, LinalgScalar};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::bli::SeparableInterpolant;
use super::{Coupling, Sensor, point_mask, rounded_positions};
use crate::state::Partitioned;

/// Exact point sensors on integer grid indices.
///
/// The cheap degenerate case of off-grid sensing: each output value is the
/// field entry at the sensor's own grid cell. Sufficient whenever sub-cell
/// positioning does not matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSensors {
    positions: Vec<Vec<usize>>,
}

impl PointSensors {
    /// Creates point sensors from per-axis integer indices.
    pub fn new(positions: Vec<Vec<usize>>) -> Result<Self> {
        if positions.is_empty() || positions.len() > 3 {
            bail!(
                "positions must have 1, 2 or 3 axes, not {}",
                positions.len()
            );
        }
        let num_points = positions[0].len();
        if positions.iter().any(|axis| axis.len() != num_points) {
            let counts: Vec<usize> = positions.iter().map(|axis| axis.len()).collect();
            bail!("per-axis position counts differ: {:?}", counts);
        }
        Ok(Self { positions })
    }

    /// Number of sensors.
    pub fn num_points(&self) -> usize {
        self.positions[0].len()
    }

    /// Number of position axes.
    pub fn ndim(&self) -> usize {
        self.positions.len()
    }

    /// Per-axis integer positions.
    pub fn positions(&self) -> &[Vec<usize>] {
        &self.positions
    }

    /// Gathers the field values at the sensor positions.
    ///
    /// Works for any element type (real or complex fields). Positions
    /// outside the grid are a caller error and panic on indexing.
    pub fn sample<A: Copy>(&self, field: &ArrayD<A>) -> Result<Array1<A>> {
        if field.ndim() != self.positions.len() {
            bail!(
                "field has {} axes but sensors have {}",
                field.ndim(),
                self.positions.len()
            );
        }
        let mut out = Vec::with_capacity(self.num_points());
        let mut idx = vec![0usize; self.positions.len()];
        for p in 0..self.num_points() {
            for (axis, pos) in self.positions.iter().enumerate() {
                idx[axis] = pos[p];
            }
            out.push(field[IxDyn(&idx)]);
        }
        Ok(Array1::from_vec(out))
    }
}

impl Coupling for PointSensors {
    fn num_points(&self) -> usize {
        PointSensors::num_points(self)
    }

    fn to_mask(&self, shape: &[usize]) -> Result<ArrayD<bool>> {
        point_mask(&self.positions, shape)
    }
}

impl Sensor for PointSensors {
    fn sample(&self, field: &ArrayD<f64>) -> Result<Array1<f64>> {
        PointSensors::sample(self, field)
    }
}

impl Partitioned for PointSensors {
    // Integer geometry is not differentiable; everything is frozen.
    type Active = ();
    type Frozen = Vec<Vec<usize>>;

    fn into_parts(self) -> (Self::Active, Self::Frozen) {
        ((), self.positions)
    }

    fn from_parts(_active: Self::Active, frozen: Self::Frozen) -> Result<Self> {
        Self::new(frozen)
    }
}

/// Band-limited (off-grid) sensors.
///
/// Samples a periodic field at fractional coordinates through the separable
/// sinc interpolant. Weights are computed once at construction and reused
/// read-only for every time step, so the per-step cost is the contraction
/// alone. Exact when a coordinate coincides with a grid index.
#[derive(Debug, Clone)]
pub struct BliSensors<A = f64> {
    positions: Vec<Vec<f64>>,
    interp: SeparableInterpolant<A>,
}

impl BliSensors<f64> {
    /// Creates sensors at fractional coordinates on a grid of the given
    /// shape, using the real interpolation kernel.
    pub fn new(positions: Vec<Vec<f64>>, shape: &[usize]) -> Result<Self> {
        let interp = SeparableInterpolant::new(&positions, shape)?;
        Ok(Self { positions, interp })
    }
}

impl BliSensors<Complex64> {
    /// Phase-sensitive variant using the complex interpolation kernel, for
    /// fields that carry a complex phase (e.g. propagating waves).
    pub fn new_complex(positions: Vec<Vec<f64>>, shape: &[usize]) -> Result<Self> {
        let interp = SeparableInterpolant::new_complex(&positions, shape)?;
        Ok(Self { positions, interp })
    }
}

impl<A> BliSensors<A>
where
    A: LinalgScalar + Send + Sync,
{
    /// Number of sensors.
    pub fn num_points(&self) -> usize {
        self.interp.num_points()
    }

    /// Per-axis fractional coordinates.
    pub fn positions(&self) -> &[Vec<f64>] {
        &self.positions
    }

    /// Grid size along each axis.
    pub fn grid_shape(&self) -> &[usize] {
        self.interp.shape()
    }

    /// Samples the field at every sensor position.
    pub fn sample(&self, field: &ArrayD<A>) -> Result<Array1<A>> {
        self.interp.sample(field.view())
    }
}

impl Coupling for BliSensors<f64> {
    fn num_points(&self) -> usize {
        BliSensors::num_points(self)
    }

    fn to_mask(&self, shape: &[usize]) -> Result<ArrayD<bool>> {
        // Nearest grid cell per sensor; the interpolant itself has global
        // support, so this is a visualization aid, not the true footprint.
        point_mask(&rounded_positions(&self.positions, shape), shape)
    }
}

impl Sensor for BliSensors<f64> {
    fn sample(&self, field: &ArrayD<f64>) -> Result<Array1<f64>> {
        BliSensors::sample(self, field)
    }
}

impl Partitioned for BliSensors<f64> {
    /// Fractional positions: the quantity gradient-based calibration moves.
    type Active = Vec<Vec<f64>>;
    /// Grid shape; weights are derived state and recomputed on rebuild.
    type Frozen = Vec<usize>;

    fn into_parts(self) -> (Self::Active, Self::Frozen) {
        let frozen = self.interp.shape().to_vec();
        (self.positions, frozen)
    }

    fn from_parts(active: Self::Active, frozen: Self::Frozen) -> Result<Self> {
        Self::new(active, &frozen)
    }
}

impl Partitioned for BliSensors<Complex64> {
    type Active = Vec<Vec<f64>>;
    type Frozen = Vec<usize>;

    fn into_parts(self) -> (Self::Active, Self::Frozen) {
        let frozen = self.interp.shape().to_vec();
        (self.positions, frozen)
    }

    fn from_parts(active: Self::Active, frozen: Self::Frozen) -> Result<Self> {
        Self::new_complex(active, &frozen)
    }
}
