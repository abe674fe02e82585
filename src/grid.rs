use anyhow::{Result, bail};
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// A uniform rectilinear grid with 1 to 3 axes.
///
/// This is the coupling subsystem's view of the computational domain: the
/// number of cells along each axis plus the spatial step. The spatial step
/// is carried for external collaborators (time-axis construction, unit
/// conversion); the coupling math itself only reads the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    shape: Vec<usize>,
    spacing: Vec<f64>,
}

impl Grid {
    /// Creates a grid from per-axis sizes and spatial steps.
    pub fn new(shape: Vec<usize>, spacing: Vec<f64>) -> Result<Self> {
        if shape.is_empty() || shape.len() > 3 {
            bail!("grid must have 1, 2 or 3 axes, not {}", shape.len());
        }
        if shape.iter().any(|&n| n == 0) {
            bail!("grid sizes must be positive: {:?}", shape);
        }
        if spacing.len() != shape.len() {
            bail!(
                "expected {} spatial steps, got {}",
                shape.len(),
                spacing.len()
            );
        }
        if spacing.iter().any(|&dx| dx <= 0.0) {
            bail!("spatial steps must be positive: {:?}", spacing);
        }
        Ok(Self { shape, spacing })
    }

    /// Creates a grid with the same spatial step along every axis.
    pub fn isotropic(shape: Vec<usize>, dx: f64) -> Result<Self> {
        let spacing = vec![dx; shape.len()];
        Self::new(shape, spacing)
    }

    /// Number of axes (1, 2 or 3).
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Grid size along each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Spatial step along each axis.
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Total number of grid cells.
    pub fn num_cells(&self) -> usize {
        self.shape.iter().product()
    }

    /// Allocates a zero-filled real field with this grid's shape.
    pub fn zeros(&self) -> ArrayD<f64> {
        ArrayD::zeros(IxDyn(&self.shape))
    }

    /// Allocates a zero-filled complex field with this grid's shape.
    pub fn zeros_complex(&self) -> ArrayD<Complex64> {
        ArrayD::zeros(IxDyn(&self.shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let g = Grid::isotropic(vec![8, 16], 1e-4).unwrap();
        assert_eq!(g.ndim(), 2);
        assert_eq!(g.shape(), &[8, 16]);
        assert_eq!(g.num_cells(), 128);
        assert!((g.spacing()[0] - 1e-4).abs() < 1e-18);
    }

    #[test]
    fn test_zeros_matches_shape() {
        let g = Grid::isotropic(vec![3, 4, 5], 1.0).unwrap();
        let f = g.zeros();
        assert_eq!(f.shape(), &[3, 4, 5]);
        assert!((f.sum() - 0.0).abs() < 1e-15);
    }

    #[test]
    fn test_too_many_axes_rejected() {
        assert!(Grid::isotropic(vec![4, 4, 4, 4], 1.0).is_err());
        assert!(Grid::isotropic(vec![], 1.0).is_err());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Grid::isotropic(vec![8, 0], 1.0).is_err());
    }

    #[test]
    fn test_bad_spacing_rejected() {
        assert!(Grid::new(vec![8], vec![0.0]).is_err());
        assert!(Grid::new(vec![8], vec![1.0, 1.0]).is_err());
    }
}
