//! Collective-operation backends.
//!
//! Every decomposition routine coordinates ranks exclusively through the
//! [`Collective`] capability: an elementwise sum-reduction whose result is
//! visible on every member, plus a barrier. The backend is chosen once, when
//! the topology is constructed:
//!
//! - [`SingleProcessComm`]: one rank, reductions return their input and the
//!   barrier returns immediately.
//! - [`SharedMemoryComm`]: a team of ranks living on threads of one process,
//!   useful for testing multi-rank behavior without an MPI installation.
//! - `MpiWorldComm` (feature `mpi`, in the crate's `mpi` module): the world
//!   communicator of an MPI run.
//!
//! All members of a team must invoke collectives in the same order with
//! buffers of equal length; a missing call blocks the remaining members, as
//! it would under MPI.
use crate::types::CommElement;
use enum_dispatch::enum_dispatch;
use std::any::Any;
use std::sync::{Arc, Barrier, Mutex};

/// Elementary collective operations over a fixed set of members
#[enum_dispatch]
pub trait Collective {
    /// Number of participating ranks
    fn n_members(&self) -> usize;

    /// Elementwise sum over all members; every member ends up with the
    /// summed values in `values`
    fn all_reduce_sum<T: CommElement>(&self, values: &mut [T]);

    /// Block until every member has arrived
    fn barrier(&self);
}

/// The trivial backend for a single-process run. All operations pass
/// through unchanged.
#[derive(Debug, Clone, Default)]
pub struct SingleProcessComm;

impl Collective for SingleProcessComm {
    fn n_members(&self) -> usize {
        1
    }

    fn all_reduce_sum<T: CommElement>(&self, _values: &mut [T]) {}

    fn barrier(&self) {}
}

struct TeamCell {
    barrier: Barrier,
    accum: Mutex<Option<Box<dyn Any + Send>>>,
}

/// An in-process team of ranks backed by threads.
///
/// [`SharedMemoryComm::split`] produces one handle per rank; each handle is
/// driven from its own thread. Reductions rendezvous on a shared
/// accumulator, so the result is the exact elementwise sum of every
/// member's contribution, independent of scheduling.
pub struct SharedMemoryComm {
    rank: usize,
    members: usize,
    cell: Arc<TeamCell>,
}

impl SharedMemoryComm {
    /// Create `members` connected handles, one per rank
    pub fn split(members: usize) -> Vec<Self> {
        assert!(members > 0, "a team needs at least one member");
        let cell = Arc::new(TeamCell {
            barrier: Barrier::new(members),
            accum: Mutex::new(None),
        });
        (0..members)
            .map(|rank| Self {
                rank,
                members,
                cell: Arc::clone(&cell),
            })
            .collect()
    }

    /// This member's rank within the team
    pub fn rank(&self) -> usize {
        self.rank
    }

    fn lock_accum(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn Any + Send>>> {
        self.cell
            .accum
            .lock()
            .expect("a team member panicked during a collective call")
    }
}

impl Collective for SharedMemoryComm {
    fn n_members(&self) -> usize {
        self.members
    }

    fn all_reduce_sum<T: CommElement>(&self, values: &mut [T]) {
        if self.members == 1 {
            return;
        }
        {
            let mut slot = self.lock_accum();
            match slot.take() {
                None => *slot = Some(Box::new(values.to_vec())),
                Some(mut boxed) => {
                    {
                        let accum = boxed
                            .downcast_mut::<Vec<T>>()
                            .expect("collective calls must agree on the element type");
                        assert_eq!(
                            accum.len(),
                            values.len(),
                            "collective calls must agree on the buffer length"
                        );
                        for (sum, v) in accum.iter_mut().zip(values.iter()) {
                            *sum += *v;
                        }
                    }
                    *slot = Some(boxed);
                }
            }
        }
        // all contributions are in
        self.cell.barrier.wait();
        {
            let slot = self.lock_accum();
            let accum = slot
                .as_ref()
                .and_then(|b| b.downcast_ref::<Vec<T>>())
                .expect("collective calls must agree on the element type");
            values.copy_from_slice(accum);
        }
        // all members have read back; one member resets the accumulator and
        // the final barrier keeps the next collective from overlapping
        let outcome = self.cell.barrier.wait();
        if outcome.is_leader() {
            *self.lock_accum() = None;
        }
        self.cell.barrier.wait();
    }

    fn barrier(&self) {
        self.cell.barrier.wait();
    }
}

/// Backends available without an MPI installation, combined in a single
/// type for hosts that select the backend at runtime
#[enum_dispatch(Collective)]
pub enum InProcessComm {
    SingleProcess(SingleProcessComm),
    SharedMemory(SharedMemoryComm),
}

#[cfg(test)]
pub(crate) fn spawn_team<F>(members: usize, f: F)
where
    F: Fn(SharedMemoryComm) + Send + Sync,
{
    let handles = SharedMemoryComm::split(members);
    std::thread::scope(|scope| {
        for comm in handles {
            let f = &f;
            scope.spawn(move || f(comm));
        }
    });
}
