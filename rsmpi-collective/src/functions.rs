//! Collection of simplified mpi routines
use mpi::collective::SystemOperation;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

/// Elementwise sum of `values` over all processes; every process receives
/// the summed result in place
pub fn all_reduce_sum_in_place<T>(world: &SimpleCommunicator, values: &mut [T])
where
    T: Equivalence + Clone,
{
    let contribution = values.to_vec();
    world.all_reduce_into(&contribution[..], values, SystemOperation::sum());
}

/// Block until every process in the communicator has arrived
pub fn barrier(world: &SimpleCommunicator) {
    world.barrier();
}
