//! Transducer layout geometry: point sets on circles and spheres, and
//! boolean aperture masks.
//!
//! These helpers generate the position sequences fed to the coupling
//! objects, e.g. a ring of sensors around a target or a spherical cap of
//! receive elements. Coordinates are in grid-index units.

use std::f64::consts::PI;

use ndarray::{Array2, Array3};

/// Evenly spaced points on a circular arc.
///
/// `n` points starting at `start_angle`, covering `max_angle` radians with
/// the endpoint excluded (so a full circle does not duplicate the first
/// point). Returns the x and y coordinate sequences.
pub fn points_on_circle(
    n: usize,
    radius: f64,
    centre: (f64, f64),
    start_angle: f64,
    max_angle: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for i in 0..n {
        let angle = start_angle + max_angle * i as f64 / n as f64;
        xs.push(radius * angle.cos() + centre.0);
        ys.push(radius * angle.sin() + centre.1);
    }
    (xs, ys)
}

/// Snaps real coordinates to integer grid indices by truncation.
///
/// Matches the usual "cast to int" convention for placing on-grid
/// transducer elements; negative coordinates saturate at zero.
pub fn grid_indices(coords: &[f64]) -> Vec<usize> {
    coords.iter().map(|&x| x as usize).collect()
}

/// Evenly distributed points on the unit sphere (Fibonacci lattice).
pub fn unit_fibonacci_sphere(samples: usize) -> Vec<[f64; 3]> {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let denom = (samples.max(2) - 1) as f64;
    let mut points = Vec::with_capacity(samples);
    for i in 0..samples {
        let y = 1.0 - (i as f64 / denom) * 2.0;
        let radius = (1.0 - y * y).sqrt();
        let theta = golden_angle * i as f64;
        points.push([theta.cos() * radius, y, theta.sin() * radius]);
    }
    points
}

/// Evenly distributed points on a sphere of the given radius and centre.
///
/// Returns the x, y and z coordinate sequences.
pub fn fibonacci_sphere(
    n: usize,
    radius: f64,
    centre: [f64; 3],
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    let mut zs = Vec::with_capacity(n);
    for p in unit_fibonacci_sphere(n) {
        xs.push(p[0] * radius + centre[0]);
        ys.push(p[1] * radius + centre[1]);
        zs.push(p[2] * radius + centre[2]);
    }
    (xs, ys, zs)
}

/// Boolean mask of a disk on a 2-D grid: `true` strictly inside the radius.
pub fn disk_mask(shape: (usize, usize), radius: f64, centre: (f64, f64)) -> Array2<bool> {
    Array2::from_shape_fn(shape, |(i, j)| {
        let dx = i as f64 - centre.0;
        let dy = j as f64 - centre.1;
        (dx * dx + dy * dy).sqrt() < radius
    })
}

/// Boolean mask of a ball on a 3-D grid: `true` strictly inside the radius.
pub fn ball_mask(
    shape: (usize, usize, usize),
    radius: f64,
    centre: (f64, f64, f64),
) -> Array3<bool> {
    Array3::from_shape_fn(shape, |(i, j, k)| {
        let dx = i as f64 - centre.0;
        let dy = j as f64 - centre.1;
        let dz = k as f64 - centre.2;
        (dx * dx + dy * dy + dz * dz).sqrt() < radius
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_on_circle_radius() {
        let (xs, ys) = points_on_circle(16, 5.0, (10.0, 10.0), 0.0, 2.0 * PI);
        assert_eq!(xs.len(), 16);
        for (x, y) in xs.iter().zip(ys.iter()) {
            let r = ((x - 10.0).powi(2) + (y - 10.0).powi(2)).sqrt();
            assert!((r - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_points_on_circle_excludes_endpoint() {
        let (xs, ys) = points_on_circle(4, 1.0, (0.0, 0.0), 0.0, 2.0 * PI);
        // Quadrant points: (1,0), (0,1), (-1,0), (0,-1); no wrap-around
        // duplicate of the first.
        assert!((xs[0] - 1.0).abs() < 1e-12 && ys[0].abs() < 1e-12);
        assert!((ys[1] - 1.0).abs() < 1e-12 && xs[1].abs() < 1e-12);
        assert!((xs[2] + 1.0).abs() < 1e-12);
        assert!((ys[3] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_indices_truncate() {
        assert_eq!(grid_indices(&[0.2, 1.9, 3.0]), vec![0, 1, 3]);
    }

    #[test]
    fn test_fibonacci_sphere_radius() {
        let (xs, ys, zs) = fibonacci_sphere(64, 3.0, [1.0, 2.0, 3.0]);
        assert_eq!(xs.len(), 64);
        for i in 0..64 {
            let r = ((xs[i] - 1.0).powi(2) + (ys[i] - 2.0).powi(2) + (zs[i] - 3.0).powi(2)).sqrt();
            assert!((r - 3.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_disk_mask_centre_and_corner() {
        let mask = disk_mask((9, 9), 3.0, (4.0, 4.0));
        assert!(mask[[4, 4]]);
        assert!(mask[[4, 6]]);
        assert!(!mask[[0, 0]]);
        // Boundary is excluded (strict inequality).
        assert!(!mask[[4, 7]]);
    }

    #[test]
    fn test_ball_mask_volume_grows_with_radius() {
        let small = ball_mask((9, 9, 9), 2.0, (4.0, 4.0, 4.0));
        let large = ball_mask((9, 9, 9), 4.0, (4.0, 4.0, 4.0));
        let count_small = small.iter().filter(|&&m| m).count();
        let count_large = large.iter().filter(|&&m| m).count();
        assert!(count_small > 0);
        assert!(count_large > count_small);
        assert!(large[[4, 4, 4]]);
    }
}
