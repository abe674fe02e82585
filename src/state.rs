//! Explicit split of coupling state into active and frozen parts.
//!
//! Gradient-based calibration of transducer geometry treats some of a
//! coupling object's numbers as optimization variables (fractional
//! positions, signal values, time step) and the rest as fixed configuration
//! (grid, integer geometry). [`Partitioned`] makes that split explicit:
//! `into_parts` exports both halves, `from_parts` revalidates and rebuilds
//! the object, recomputing any derived weight tensors. An optimization
//! layer can round-trip the active half through its own machinery without
//! this crate depending on it.

use anyhow::Result;

/// A coupling object with a documented active/frozen decomposition.
pub trait Partitioned: Sized {
    /// The differentiable numeric leaves.
    type Active;
    /// The static configuration.
    type Frozen;

    /// Splits the object into its two halves.
    fn into_parts(self) -> (Self::Active, Self::Frozen);

    /// Rebuilds the object from its two halves.
    ///
    /// Runs the same validation as the ordinary constructors and fails if
    /// the halves are inconsistent.
    fn from_parts(active: Self::Active, frozen: Self::Frozen) -> Result<Self>;
}
