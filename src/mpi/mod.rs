//! Feature: distributed runs on top of rsmpi
#![cfg(feature = "mpi")]
use crate::collective::Collective;
use crate::types::CommElement;
use rsmpi_collective::mpi::topology::SimpleCommunicator;
use rsmpi_collective::mpi::traits::*;

pub use rsmpi_collective::functions::all_reduce_sum_in_place;
pub use rsmpi_collective::functions::barrier;
pub use rsmpi_collective::mpi;
pub use rsmpi_collective::mpi::environment::Universe;
pub use rsmpi_collective::mpi::initialize;

/// Collective backend over the MPI world communicator.
///
/// The caller initializes MPI before construction and keeps the returned
/// `Universe` alive for the duration of the run:
///
/// ```ignore
/// let universe = pencil_decomp::mpi::initialize().unwrap();
/// let comm = MpiWorldComm::world();
/// ```
pub struct MpiWorldComm {
    world: SimpleCommunicator,
}

impl MpiWorldComm {
    /// Attach to the world communicator
    pub fn world() -> Self {
        Self {
            world: SimpleCommunicator::world(),
        }
    }

    /// This process's rank in the world communicator
    pub fn rank(&self) -> usize {
        self.world.rank() as usize
    }
}

impl Collective for MpiWorldComm {
    fn n_members(&self) -> usize {
        self.world.size() as usize
    }

    fn all_reduce_sum<T: CommElement>(&self, values: &mut [T]) {
        all_reduce_sum_in_place(&self.world, values);
    }

    fn barrier(&self) {
        self.world.barrier();
    }
}
