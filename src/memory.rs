//! Memory-placement capability.
//!
//! Simulations that keep their fields in device memory implement
//! [`MemoryPlacement`] to stage arrays through host-addressable memory
//! before slicing or reducing, and to move results back afterwards. On
//! host-only systems [`HostMemory`] is the identity placement; no copies
//! beyond the ones the decomposition itself makes are introduced.
use crate::types::CommElement;
use ndarray::{Array, Dimension};

/// Moves array values between host-addressable memory and whatever compute
/// device the surrounding system uses
pub trait MemoryPlacement {
    /// Bring values into host-addressable memory
    fn to_host<A, D>(&self, values: Array<A, D>) -> Array<A, D>
    where
        A: CommElement,
        D: Dimension;

    /// Move values to the memory space the surrounding system computes in
    fn to_device<A, D>(&self, values: Array<A, D>) -> Array<A, D>
    where
        A: CommElement,
        D: Dimension;
}

/// Identity placement for systems without a separate device memory
#[derive(Debug, Clone, Default)]
pub struct HostMemory;

impl MemoryPlacement for HostMemory {
    fn to_host<A, D>(&self, values: Array<A, D>) -> Array<A, D>
    where
        A: CommElement,
        D: Dimension,
    {
        values
    }

    fn to_device<A, D>(&self, values: Array<A, D>) -> Array<A, D>
    where
        A: CommElement,
        D: Dimension,
    {
        values
    }
}
