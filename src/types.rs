//! Element traits shared by all decomposition routines.
//!
//! `CommElement` marks the number types that can travel through a
//! sum-reduction-to-all; with the `mpi` feature it additionally requires
//! rsmpi's `Equivalence`, so the same bounds serve the single-process,
//! shared-memory and distributed backends.
use num_traits::{Float, FromPrimitive, Zero};
use std::fmt::{Debug, Display};
use std::ops::AddAssign;

#[cfg(feature = "mpi")]
use rsmpi_collective::mpi::traits::Equivalence;

/// Elements that can ride through a sum-reduction-to-all
#[cfg(feature = "mpi")]
pub trait CommElement:
    Copy + Zero + AddAssign + PartialEq + Debug + Send + Sync + 'static + Equivalence
{
}

/// Elements that can ride through a sum-reduction-to-all
#[cfg(not(feature = "mpi"))]
pub trait CommElement: Copy + Zero + AddAssign + PartialEq + Debug + Send + Sync + 'static {}

impl CommElement for f64 {}
impl CommElement for f32 {}
impl CommElement for u64 {}
impl CommElement for u32 {}
impl CommElement for i64 {}
impl CommElement for i32 {}

/// Float elements, used for coordinate values and interval bounds
pub trait FloatNum: CommElement + Float + FromPrimitive + Display {}

impl FloatNum for f64 {}
impl FloatNum for f32 {}
