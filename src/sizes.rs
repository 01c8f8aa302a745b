//! Resolution of per-rank block extents.
//!
//! Block sizes are supplied by the caller, one per rank; no rank knows the
//! others' extents up front. The full per-axis size vector is recovered with
//! the scatter-via-zero-fill idiom: every rank prepares a zero buffer with
//! one slot per rank along the axis, only the canonical rank per slot writes
//! its own extent, and a single sum-reduction-to-all leaves the complete,
//! identical vector on every rank.
use crate::collective::Collective;
use crate::error::{DecompError, Result};
use crate::topology::{Axis3, GlobalSize, ProcessTopology};
use tracing::trace;

impl<C: Collective> ProcessTopology<C> {
    /// The cell counts of every rank's block along `axis`, in rank order.
    ///
    /// The vector has one entry per rank along `axis` and its entries sum to
    /// the global extent; a sum mismatch means the grid and the supplied
    /// block extents disagree (e.g. two ranks claimed the same slot) and is
    /// reported as [`DecompError::InconsistentLocalSizes`].
    ///
    /// Collective: every rank of the grid must call this with the same
    /// `global` and `axis`.
    pub fn concatenate_local_sizes(
        &self,
        global: impl Into<GlobalSize>,
        axis: Axis3,
    ) -> Result<Vec<usize>> {
        let n_global = global.into().along(axis);
        let mut slots = vec![0u64; self.n_ranks(axis)];
        if self.is_canonical_along(axis) {
            slots[self.coord(axis)] = self.local_count(axis) as u64;
        }
        self.comm().all_reduce_sum(&mut slots);
        let total: u64 = slots.iter().sum();
        if total != n_global as u64 {
            return Err(DecompError::InconsistentLocalSizes {
                axis,
                expected: n_global,
                found: total as usize,
            });
        }
        trace!("local sizes along {}: {:?}", axis, slots);
        Ok(slots.iter().map(|&n| n as usize).collect())
    }

    /// Global index of the first cell of this rank's block, per axis.
    ///
    /// With these offsets a procedurally defined field never needs to be
    /// materialized globally: evaluating it at `offset + i` for the local
    /// index `i` yields exactly the block that partitioning the materialized
    /// field would produce.
    ///
    /// Collective: resolves the size vector of all three axes.
    pub fn local_offsets(&self, global: impl Into<GlobalSize>) -> Result<[usize; 3]> {
        let global = global.into();
        let mut offsets = [0usize; 3];
        for axis in Axis3::ALL.iter() {
            let sizes = self.concatenate_local_sizes(global, *axis)?;
            offsets[axis.index()] = sizes[..self.coord(*axis)].iter().sum();
        }
        Ok(offsets)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collective::{spawn_team, SharedMemoryComm};
    use crate::topology::grid_coords;

    #[test]
    fn single_process_sizes() {
        let topo = ProcessTopology::single_process([12, 6, 3]);
        assert_eq!(
            topo.concatenate_local_sizes([12, 6, 3], Axis3::X).unwrap(),
            vec![12]
        );
        assert_eq!(
            topo.concatenate_local_sizes([12, 6, 3], Axis3::Z).unwrap(),
            vec![3]
        );
        assert_eq!(topo.local_offsets([12, 6, 3]).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn three_ranks_concatenate_their_extents() {
        spawn_team(3, |comm: SharedMemoryComm| {
            let coords = [comm.rank(), 0, 0];
            let topo = ProcessTopology::new(comm, [3, 1, 1], coords, [4, 6, 3]).unwrap();
            let sizes = topo.concatenate_local_sizes([12, 6, 3], Axis3::X).unwrap();
            assert_eq!(sizes, vec![4, 4, 4]);
        });
    }

    #[test]
    fn uneven_extents_survive_the_round_trip() {
        spawn_team(3, |comm: SharedMemoryComm| {
            let r = comm.rank();
            let extents = [5, 4, 2];
            let topo =
                ProcessTopology::new(comm, [3, 1, 1], [r, 0, 0], [extents[r], 7, 7]).unwrap();
            let sizes = topo.concatenate_local_sizes([11, 7, 7], Axis3::X).unwrap();
            assert_eq!(sizes, vec![5, 4, 2]);
            let offsets = topo.local_offsets([11, 7, 7]).unwrap();
            assert_eq!(offsets[0], [0, 5, 9][r]);
            assert_eq!(offsets[1], 0);
        });
    }

    #[test]
    fn offsets_on_a_two_axis_grid() {
        spawn_team(6, |comm: SharedMemoryComm| {
            let coords = grid_coords(comm.rank(), [2, 3, 1]);
            let topo = ProcessTopology::new(comm, [2, 3, 1], coords, [2, 2, 5]).unwrap();
            let offsets = topo.local_offsets([4, 6, 5]).unwrap();
            assert_eq!(offsets, [2 * coords[0], 2 * coords[1], 0]);
        });
    }

    #[test]
    fn inconsistent_extents_are_detected() {
        let topo = ProcessTopology::single_process([5, 5, 5]);
        let result = topo.concatenate_local_sizes([4, 5, 5], Axis3::X);
        assert!(matches!(
            result,
            Err(DecompError::InconsistentLocalSizes {
                axis: Axis3::X,
                expected: 4,
                found: 5,
            })
        ));
    }
}
