//! Off-grid source and sensor coupling for pseudospectral wave solvers.
//!
//! Physical transducers rarely sit exactly on the solver's grid. This crate
//! couples them anyway: sources inject time signals into a field at
//! possibly fractional coordinates and sensors read the field back, both
//! through periodic band-limited (sinc) interpolation, which is exact for
//! fields representable in the grid's discrete Fourier basis, i.e. exactly
//! what a pseudospectral solver assumes. Exact integer-index coupling and
//! mask-based distributed transducers cover the on-grid cases.

pub mod coupling;
pub mod geom;
pub mod grid;
pub mod state;

// Prelude
pub use coupling::{
    BliSensors, BliSources, Coupling, DistributedTransducer, PointSensors, PointSources,
    Sensor, SeparableInterpolant, Source, TimeHarmonicSource, bli_weights, bli_weights_complex,
    line_transducer,
};
pub use grid::Grid;
pub use state::Partitioned;
