//! Thin wrappers around the rsmpi collectives used for domain
//! decomposition, plus a re-export of the `mpi` crate so downstream code
//! has a single source for rsmpi types.
pub mod functions;

pub use mpi;
