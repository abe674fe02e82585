//! Band-limited (periodic sinc) interpolation on uniform grids.
//!
//! A periodic, Nyquist-limited signal sampled on a uniform grid is fully
//! determined by its samples, so it can be reconstructed exactly at any
//! fractional coordinate. This is the working assumption of pseudospectral
//! wave solvers, which makes the global Dirichlet kernel the right tool for
//! off-grid coupling even though every grid point contributes to every
//! sampled value. [`bli_weights`] builds the per-axis weight matrix;
//! [`SeparableInterpolant`] composes 1-3 of them into sampling and
//! injection operators over full fields.

use std::f64::consts::PI;

use anyhow::{Result, bail};
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayViewD, Ix1, Ix2, Ix3, LinalgScalar};
use num_complex::Complex64;
use rayon::prelude::*;

/// Index of the grid point that `x0` lies exactly on, if any.
fn on_grid_index(x0: f64, n: usize) -> Option<usize> {
    if x0.fract() == 0.0 && x0 >= 0.0 && x0 < n as f64 {
        Some(x0 as usize)
    } else {
        None
    }
}

/// Periodic band-limited interpolation weights along one axis.
///
/// Returns a `(coords.len(), n)` matrix whose row `i` reconstructs the value
/// of a periodic band-limited length-`n` sequence at the fractional
/// coordinate `coords[i]`: `value = row · samples`.
///
/// Even-length grids carry a single Nyquist mode whose phase the samples
/// cannot resolve; the second term of the even branch removes the bias this
/// would otherwise introduce. A coordinate lying exactly on a grid index
/// produces a one-hot row, so on-grid sampling is exact and the 0/0 form of
/// the sinc ratio is never evaluated.
pub fn bli_weights(coords: &[f64], n: usize) -> Array2<f64> {
    let nf = n as f64;
    let mut w = Array2::zeros((coords.len(), n));
    for (i, &x0) in coords.iter().enumerate() {
        let mut row = w.row_mut(i);
        if let Some(j) = on_grid_index(x0, n) {
            row[j] = 1.0;
            continue;
        }
        for (j, wj) in row.iter_mut().enumerate() {
            let delta = x0 - j as f64;
            *wj = if n % 2 == 0 {
                (PI * delta).sin() / (PI * delta / nf).tan() / nf
                    - (PI * x0).sin() * (PI * j as f64).sin() / nf
            } else {
                (PI * delta).sin() / (PI * delta / nf).sin() / nf
            };
        }
    }
    w
}

/// Complex variant of [`bli_weights`] for phase-sensitive fields.
///
/// Identical to the real kernel except that on even-length grids the
/// Nyquist term keeps its quadrature component, recovering the analytic
/// interpolation kernel for complex (e.g. propagating-wave) fields. On
/// odd-length grids the imaginary part is identically zero. One-hot rows
/// from on-grid coordinates stay purely real in both branches.
pub fn bli_weights_complex(coords: &[f64], n: usize) -> Array2<Complex64> {
    let nf = n as f64;
    let mut w = bli_weights(coords, n).mapv(|re| Complex64::new(re, 0.0));
    if n % 2 != 0 {
        return w;
    }
    for (i, &x0) in coords.iter().enumerate() {
        if on_grid_index(x0, n).is_some() {
            continue;
        }
        for (j, wj) in w.row_mut(i).iter_mut().enumerate() {
            wj.im = (PI * x0).cos() * (PI * j as f64).sin() / nf;
        }
    }
    w
}

fn validate_positions(positions: &[Vec<f64>], shape: &[usize]) -> Result<usize> {
    if positions.is_empty() || positions.len() > 3 {
        bail!(
            "positions must have 1, 2 or 3 axes, not {}",
            positions.len()
        );
    }
    if positions.len() != shape.len() {
        bail!(
            "got {} position axes for a {}-axis grid",
            positions.len(),
            shape.len()
        );
    }
    let num_points = positions[0].len();
    if positions.iter().any(|axis| axis.len() != num_points) {
        let counts: Vec<usize> = positions.iter().map(|axis| axis.len()).collect();
        bail!("per-axis coordinate counts differ: {:?}", counts);
    }
    Ok(num_points)
}

/// Separable band-limited interpolation operator over a 1-3 axis grid.
///
/// Holds one precomputed weight matrix per axis. Sampling contracts the
/// field against the axis weights one axis at a time, which keeps the cost
/// of the multi-dimensional kernel linear in the number of axes; injection
/// spreads per-point amplitudes back onto the grid through the same
/// weights, making the two operations adjoint.
#[derive(Debug, Clone)]
pub struct SeparableInterpolant<A = f64> {
    weights: Vec<Array2<A>>,
    shape: Vec<usize>,
    num_points: usize,
}

impl SeparableInterpolant<f64> {
    /// Builds the real-kernel interpolant for the given per-axis coordinates.
    pub fn new(positions: &[Vec<f64>], shape: &[usize]) -> Result<Self> {
        let num_points = validate_positions(positions, shape)?;
        let weights = positions
            .iter()
            .zip(shape)
            .map(|(axis, &n)| bli_weights(axis, n))
            .collect();
        Ok(Self {
            weights,
            shape: shape.to_vec(),
            num_points,
        })
    }
}

impl SeparableInterpolant<Complex64> {
    /// Builds the phase-sensitive (complex kernel) interpolant.
    pub fn new_complex(positions: &[Vec<f64>], shape: &[usize]) -> Result<Self> {
        let num_points = validate_positions(positions, shape)?;
        let weights = positions
            .iter()
            .zip(shape)
            .map(|(axis, &n)| bli_weights_complex(axis, n))
            .collect();
        Ok(Self {
            weights,
            shape: shape.to_vec(),
            num_points,
        })
    }
}

impl<A> SeparableInterpolant<A>
where
    A: LinalgScalar + Send + Sync,
{
    /// Number of interpolation points.
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Grid size along each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-axis weight matrix, each of shape `(num_points, n_axis)`.
    pub fn weights(&self) -> &[Array2<A>] {
        &self.weights
    }

    /// Samples the field at every point.
    ///
    /// The first axis is contracted for all points at once (a matrix
    /// product); the remaining axes are contracted per point, in parallel
    /// across points.
    pub fn sample(&self, field: ArrayViewD<'_, A>) -> Result<Array1<A>> {
        if field.shape() != self.shape.as_slice() {
            bail!(
                "field shape {:?} does not match grid shape {:?}",
                field.shape(),
                self.shape
            );
        }
        match self.weights.len() {
            1 => {
                let f = field.into_dimensionality::<Ix1>()?;
                Ok(self.weights[0].dot(&f))
            }
            2 => {
                let f = field.into_dimensionality::<Ix2>()?;
                let partial = self.weights[0].dot(&f);
                let out: Vec<A> = (0..self.num_points)
                    .into_par_iter()
                    .map(|i| self.weights[1].row(i).dot(&partial.row(i)))
                    .collect();
                Ok(Array1::from_vec(out))
            }
            3 => {
                let f = field.into_dimensionality::<Ix3>()?;
                let (n0, n1, n2) = f.dim();
                let flat = f.to_shape((n0, n1 * n2))?;
                let partial = self.weights[0].dot(&flat);
                let out: Vec<A> = (0..self.num_points)
                    .into_par_iter()
                    .map(|i| {
                        // partial row `i` is the axis-0 contraction, laid
                        // out as (n1, n2)
                        let plane = partial.row(i);
                        let wy = self.weights[1].row(i);
                        let wz = self.weights[2].row(i);
                        let mut acc = A::zero();
                        for j in 0..n1 {
                            let mut inner = A::zero();
                            for k in 0..n2 {
                                inner = inner + plane[j * n2 + k] * wz[k];
                            }
                            acc = acc + wy[j] * inner;
                        }
                        acc
                    })
                    .collect();
                Ok(Array1::from_vec(out))
            }
            d => bail!("positions must be 1, 2 or 3 dimensional, not {}", d),
        }
    }

    /// Spreads per-point amplitudes onto the grid, the adjoint of
    /// [`sample`](Self::sample).
    ///
    /// Point `i` contributes `amplitudes[i]` times the outer product of its
    /// per-axis weight rows, so a source and a sensor at the same fractional
    /// position are transposes of each other.
    pub fn inject(&self, amplitudes: &[A]) -> Result<ArrayD<A>> {
        if amplitudes.len() != self.num_points {
            bail!(
                "expected {} amplitudes, got {}",
                self.num_points,
                amplitudes.len()
            );
        }
        let amps = ArrayView1::from(amplitudes);
        match self.weights.len() {
            1 => Ok(self.weights[0].t().dot(&amps).into_dyn()),
            2 => {
                let n1 = self.shape[1];
                // Scale each point's axis-1 row by its amplitude, then push
                // the result through axis 0: out[j,k] = sum_i a_i wx[i,j] wy[i,k]
                let mut scaled = Array2::<A>::zeros((self.num_points, n1));
                for i in 0..self.num_points {
                    let a = amps[i];
                    let wy = self.weights[1].row(i);
                    for k in 0..n1 {
                        scaled[[i, k]] = a * wy[k];
                    }
                }
                Ok(self.weights[0].t().dot(&scaled).into_dyn())
            }
            3 => {
                let (n1, n2) = (self.shape[1], self.shape[2]);
                let mut scaled = Array2::<A>::zeros((self.num_points, n1 * n2));
                for i in 0..self.num_points {
                    let a = amps[i];
                    let wy = self.weights[1].row(i);
                    let wz = self.weights[2].row(i);
                    for j in 0..n1 {
                        let aj = a * wy[j];
                        for k in 0..n2 {
                            scaled[[i, j * n2 + k]] = aj * wz[k];
                        }
                    }
                }
                let flat = self.weights[0].t().dot(&scaled);
                Ok(flat
                    .into_shape_with_order((self.shape[0], n1, n2))?
                    .into_dyn())
            }
            d => bail!("positions must be 1, 2 or 3 dimensional, not {}", d),
        }
    }
}
