//! Sources: time-indexed signal injection on or off the grid.

use anyhow::{Result, bail};
use ndarray::{Array2, ArrayD, IxDyn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::bli::SeparableInterpolant;
use super::{Coupling, Source, point_mask, rounded_positions};
use crate::grid::Grid;
use crate::state::Partitioned;

fn validate_source_geometry(
    positions_axes: usize,
    num_points: usize,
    signals: &Array2<f64>,
    grid: &Grid,
) -> Result<()> {
    if positions_axes != grid.ndim() {
        bail!(
            "got {} position axes for a {}-axis grid",
            positions_axes,
            grid.ndim()
        );
    }
    if signals.nrows() != num_points {
        bail!(
            "signal table has {} rows for {} source points",
            signals.nrows(),
            num_points
        );
    }
    Ok(())
}

/// On-grid point sources.
///
/// Each source owns one row of the signal table (shape
/// `(num_points, num_timesteps)`); at time step `n` the `n`-th column is
/// scatter-added into a zero field at the integer positions. An empty table
/// is the valid "no sources" case and injects a zero field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSources {
    positions: Vec<Vec<usize>>,
    signals: Array2<f64>,
    dt: f64,
    grid: Grid,
}

impl PointSources {
    /// Creates point sources from per-axis integer indices and a signal
    /// table with one row per source.
    pub fn new(
        positions: Vec<Vec<usize>>,
        signals: Array2<f64>,
        dt: f64,
        grid: Grid,
    ) -> Result<Self> {
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
        validate_source_geometry(positions.len(), num_points, &signals, &grid)?;
        Ok(Self {
            positions,
            signals,
            dt,
            grid,
        })
    }

    /// The valid "no sources" case: injects a zero field at every step.
    pub fn none(grid: Grid) -> Self {
        let ndim = grid.ndim();
        Self {
            positions: vec![Vec::new(); ndim],
            signals: Array2::zeros((0, 0)),
            dt: 1.0,
            grid,
        }
    }

    /// Number of source points.
    pub fn num_points(&self) -> usize {
        self.positions[0].len()
    }

    /// Number of time steps in the signal table.
    pub fn num_steps(&self) -> usize {
        self.signals.ncols()
    }

    /// Time step of the signal table.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The grid the sources live on.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Per-axis integer positions.
    pub fn positions(&self) -> &[Vec<usize>] {
        &self.positions
    }

    /// Per-point signal table.
    pub fn signals(&self) -> &Array2<f64> {
        &self.signals
    }

    /// Field contribution at discrete time step `n`: zero everywhere except
    /// the source cells, which receive their signal value. Coincident
    /// sources accumulate.
    pub fn inject(&self, n: usize) -> Result<ArrayD<f64>> {
        let mut field = self.grid.zeros();
        if self.signals.nrows() == 0 {
            return Ok(field);
        }
        if n >= self.signals.ncols() {
            bail!(
                "time index {} outside signal table of {} steps",
                n,
                self.signals.ncols()
            );
        }
        let mut idx = vec![0usize; self.positions.len()];
        for p in 0..self.num_points() {
            for (axis, pos) in self.positions.iter().enumerate() {
                idx[axis] = pos[p];
            }
            field[IxDyn(&idx)] += self.signals[[p, n]];
        }
        Ok(field)
    }
}

impl Coupling for PointSources {
    fn num_points(&self) -> usize {
        PointSources::num_points(self)
    }

    fn to_mask(&self, shape: &[usize]) -> Result<ArrayD<bool>> {
        point_mask(&self.positions, shape)
    }
}

impl Source for PointSources {
    fn inject(&self, n: usize) -> Result<ArrayD<f64>> {
        PointSources::inject(self, n)
    }
}

impl Partitioned for PointSources {
    /// Signal values and time step are what calibration adjusts.
    type Active = (Array2<f64>, f64);
    /// Integer geometry and the grid stay fixed.
    type Frozen = (Vec<Vec<usize>>, Grid);

    fn into_parts(self) -> (Self::Active, Self::Frozen) {
        ((self.signals, self.dt), (self.positions, self.grid))
    }

    fn from_parts(active: Self::Active, frozen: Self::Frozen) -> Result<Self> {
        let (signals, dt) = active;
        let (positions, grid) = frozen;
        Self::new(positions, signals, dt, grid)
    }
}

/// Off-grid sources driven through the band-limited interpolant.
///
/// The adjoint of off-grid sampling: each point's signal value is spread
/// onto the grid with the same per-axis weights a sensor at that position
/// would use, so transmit and receive stay consistent for band-limited
/// fields.
#[derive(Debug, Clone)]
pub struct BliSources {
    positions: Vec<Vec<f64>>,
    signals: Array2<f64>,
    dt: f64,
    grid: Grid,
    interp: SeparableInterpolant<f64>,
}

impl BliSources {
    /// Creates sources at fractional coordinates with a signal table of one
    /// row per source.
    pub fn new(
        positions: Vec<Vec<f64>>,
        signals: Array2<f64>,
        dt: f64,
        grid: Grid,
    ) -> Result<Self> {
        let interp = SeparableInterpolant::new(&positions, grid.shape())?;
        validate_source_geometry(positions.len(), interp.num_points(), &signals, &grid)?;
        Ok(Self {
            positions,
            signals,
            dt,
            grid,
            interp,
        })
    }

    /// Number of source points.
    pub fn num_points(&self) -> usize {
        self.interp.num_points()
    }

    /// Number of time steps in the signal table.
    pub fn num_steps(&self) -> usize {
        self.signals.ncols()
    }

    /// Time step of the signal table.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Per-axis fractional coordinates.
    pub fn positions(&self) -> &[Vec<f64>] {
        &self.positions
    }

    /// Field contribution at discrete time step `n`, spread through the
    /// interpolant's adjoint.
    pub fn inject(&self, n: usize) -> Result<ArrayD<f64>> {
        if self.signals.nrows() == 0 {
            return Ok(self.grid.zeros());
        }
        if n >= self.signals.ncols() {
            bail!(
                "time index {} outside signal table of {} steps",
                n,
                self.signals.ncols()
            );
        }
        let amplitudes = self.signals.column(n).to_vec();
        self.interp.inject(&amplitudes)
    }
}

impl Coupling for BliSources {
    fn num_points(&self) -> usize {
        BliSources::num_points(self)
    }

    fn to_mask(&self, shape: &[usize]) -> Result<ArrayD<bool>> {
        point_mask(&rounded_positions(&self.positions, shape), shape)
    }
}

impl Source for BliSources {
    fn inject(&self, n: usize) -> Result<ArrayD<f64>> {
        BliSources::inject(self, n)
    }
}

impl Partitioned for BliSources {
    /// Positions, signals and time step all move under calibration.
    type Active = (Vec<Vec<f64>>, Array2<f64>, f64);
    /// The grid stays fixed; weights are recomputed on rebuild.
    type Frozen = Grid;

    fn into_parts(self) -> (Self::Active, Self::Frozen) {
        ((self.positions, self.signals, self.dt), self.grid)
    }

    fn from_parts(active: Self::Active, frozen: Self::Frozen) -> Result<Self> {
        let (positions, signals, dt) = active;
        Self::new(positions, signals, dt, frozen)
    }
}

/// A single-frequency source with a complex amplitude field.
///
/// `field_at(t)` rotates the stored amplitude by `exp(i*omega*t)`; the real
/// part drives a time-domain solver, the full complex field a
/// Helmholtz-style one.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeHarmonicSource {
    amplitude: ArrayD<Complex64>,
    omega: f64,
}

impl TimeHarmonicSource {
    /// Creates a time-harmonic source from an amplitude field and an
    /// angular frequency.
    pub fn new(amplitude: ArrayD<Complex64>, omega: f64) -> Self {
        Self { amplitude, omega }
    }

    /// Builds the amplitude field from isolated point sources.
    pub fn from_point_sources(
        grid: &Grid,
        positions: &[Vec<usize>],
        values: &[Complex64],
        omega: f64,
    ) -> Result<Self> {
        if positions.len() != grid.ndim() {
            bail!(
                "got {} position axes for a {}-axis grid",
                positions.len(),
                grid.ndim()
            );
        }
        let num_points = values.len();
        if positions.iter().any(|axis| axis.len() != num_points) {
            bail!(
                "expected {} positions per axis to match the source values",
                num_points
            );
        }
        let mut amplitude = grid.zeros_complex();
        let mut idx = vec![0usize; positions.len()];
        for (p, &value) in values.iter().enumerate() {
            for (axis, pos) in positions.iter().enumerate() {
                idx[axis] = pos[p];
            }
            amplitude[IxDyn(&idx)] = value;
        }
        Ok(Self { amplitude, omega })
    }

    /// Angular frequency.
    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// The complex amplitude field.
    pub fn amplitude(&self) -> &ArrayD<Complex64> {
        &self.amplitude
    }

    /// The complex source field at time `t`.
    pub fn field_at(&self, t: f64) -> ArrayD<Complex64> {
        let phase = Complex64::new(0.0, self.omega * t).exp();
        self.amplitude.mapv(|a| a * phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid_8x8() -> Grid {
        Grid::isotropic(vec![8, 8], 1.0).unwrap()
    }

    #[test]
    fn test_point_sources_inject() {
        let sources = PointSources::new(
            vec![vec![2], vec![3]],
            array![[5.0]],
            1e-6,
            grid_8x8(),
        )
        .unwrap();
        let field = sources.inject(0).unwrap();
        assert!((field[[2, 3]] - 5.0).abs() < 1e-15);
        assert!((field.sum() - 5.0).abs() < 1e-15);
    }

    #[test]
    fn test_coincident_sources_accumulate() {
        let sources = PointSources::new(
            vec![vec![1, 1], vec![1, 1]],
            array![[2.0], [3.0]],
            1e-6,
            grid_8x8(),
        )
        .unwrap();
        let field = sources.inject(0).unwrap();
        assert!((field[[1, 1]] - 5.0).abs() < 1e-15);
    }

    #[test]
    fn test_no_sources_inject_zero() {
        let sources = PointSources::none(grid_8x8());
        let field = sources.inject(0).unwrap();
        assert_eq!(field.shape(), &[8, 8]);
        assert!((field.sum() - 0.0).abs() < 1e-15);
    }

    #[test]
    fn test_time_index_out_of_range() {
        let sources = PointSources::new(
            vec![vec![2], vec![3]],
            array![[5.0, 6.0]],
            1e-6,
            grid_8x8(),
        )
        .unwrap();
        assert!(sources.inject(1).is_ok());
        assert!(sources.inject(2).is_err());
    }

    #[test]
    fn test_signal_row_count_mismatch_rejected() {
        let result = PointSources::new(
            vec![vec![2], vec![3]],
            array![[1.0], [2.0]],
            1e-6,
            grid_8x8(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_bli_sources_on_grid_matches_point_sources() {
        let signals = array![[4.0]];
        let point = PointSources::new(
            vec![vec![2], vec![3]],
            signals.clone(),
            1e-6,
            grid_8x8(),
        )
        .unwrap();
        let bli = BliSources::new(
            vec![vec![2.0], vec![3.0]],
            signals,
            1e-6,
            grid_8x8(),
        )
        .unwrap();
        let a = point.inject(0).unwrap();
        let b = bli.inject(0).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bli_sources_conserve_injected_amplitude() {
        // Partition of unity per axis: the spread weights of each point sum
        // to its signal value.
        let bli = BliSources::new(
            vec![vec![2.7], vec![4.3]],
            array![[1.5]],
            1e-6,
            grid_8x8(),
        )
        .unwrap();
        let field = bli.inject(0).unwrap();
        assert!((field.sum() - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_point_sources_roundtrip_parts() {
        let sources = PointSources::new(
            vec![vec![2], vec![3]],
            array![[5.0, 6.0]],
            1e-6,
            grid_8x8(),
        )
        .unwrap();
        let expected = sources.inject(1).unwrap();
        let (active, frozen) = sources.into_parts();
        let rebuilt = PointSources::from_parts(active, frozen).unwrap();
        let actual = rebuilt.inject(1).unwrap();
        for (x, y) in expected.iter().zip(actual.iter()) {
            assert!((x - y).abs() < 1e-15);
        }
    }

    #[test]
    fn test_time_harmonic_phase_rotation() {
        let grid = grid_8x8();
        let source = TimeHarmonicSource::from_point_sources(
            &grid,
            &[vec![1], vec![2]],
            &[Complex64::new(2.0, 0.0)],
            std::f64::consts::PI,
        )
        .unwrap();

        let at_zero = source.field_at(0.0);
        assert!((at_zero[[1, 2]] - Complex64::new(2.0, 0.0)).norm() < 1e-12);

        // One full half-period flips the sign.
        let at_one = source.field_at(1.0);
        assert!((at_one[[1, 2]] - Complex64::new(-2.0, 0.0)).norm() < 1e-12);

        // Magnitude is preserved at any time.
        let at_t = source.field_at(0.37);
        assert!((at_t[[1, 2]].norm() - 2.0).abs() < 1e-12);
    }
}
