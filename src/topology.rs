//! Process grid description.
//!
//! A [`ProcessTopology`] captures everything one rank knows about the run:
//! the rank counts of the 3-axis process grid, its own coordinate in that
//! grid, the cell counts of the block it owns, and the communicator used for
//! collective operations. The communicator is always carried as a field and
//! threaded explicitly through every call; nothing in this crate reaches for
//! ambient global state.
//!
//! Topologies are immutable for the lifetime of a run. Whether an operation
//! behaves as a no-op (one process) or as a real collective (many) is
//! decided once, by the communicator chosen at construction; call sites stay
//! unconditional.
use crate::collective::{Collective, SingleProcessComm};
use crate::error::{DecompError, Result};
use std::fmt;

/// One of the three grid axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis3 {
    X,
    Y,
    Z,
}

impl Axis3 {
    pub const ALL: [Axis3; 3] = [Axis3::X, Axis3::Y, Axis3::Z];

    /// Position of this axis in `[x, y, z]`-ordered arrays
    pub fn index(self) -> usize {
        match self {
            Axis3::X => 0,
            Axis3::Y => 1,
            Axis3::Z => 2,
        }
    }

    /// The two axes orthogonal to this one
    pub fn others(self) -> [Axis3; 2] {
        match self {
            Axis3::X => [Axis3::Y, Axis3::Z],
            Axis3::Y => [Axis3::X, Axis3::Z],
            Axis3::Z => [Axis3::X, Axis3::Y],
        }
    }
}

impl fmt::Display for Axis3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Axis3::X => write!(f, "x"),
            Axis3::Y => write!(f, "y"),
            Axis3::Z => write!(f, "z"),
        }
    }
}

/// Global cell counts per axis.
///
/// Built from a single scalar (uniform extent on all axes), a 3-tuple, or a
/// 2-tuple for planar data (third extent 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSize([usize; 3]);

impl GlobalSize {
    /// Cell count along one axis
    pub fn along(self, axis: Axis3) -> usize {
        self.0[axis.index()]
    }

    /// Cell counts as an `[x, y, z]` array
    pub fn extents(self) -> [usize; 3] {
        self.0
    }
}

impl From<usize> for GlobalSize {
    fn from(n: usize) -> Self {
        GlobalSize([n, n, n])
    }
}

impl From<[usize; 3]> for GlobalSize {
    fn from(n: [usize; 3]) -> Self {
        GlobalSize(n)
    }
}

impl From<[usize; 2]> for GlobalSize {
    fn from(n: [usize; 2]) -> Self {
        GlobalSize([n[0], n[1], 1])
    }
}

/// Map a linear rank id to its grid coordinate, x running fastest:
/// `rank = x + ranks_x * (y + ranks_y * z)`
pub fn grid_coords(rank: usize, ranks: [usize; 3]) -> [usize; 3] {
    [
        rank % ranks[0],
        (rank / ranks[0]) % ranks[1],
        rank / (ranks[0] * ranks[1]),
    ]
}

/// One rank's view of the 3-axis process grid
pub struct ProcessTopology<C> {
    ranks: [usize; 3],
    coords: [usize; 3],
    local_counts: [usize; 3],
    comm: C,
}

impl ProcessTopology<SingleProcessComm> {
    /// The trivial topology of a single-process run. The local block is the
    /// whole domain.
    pub fn single_process(local_counts: [usize; 3]) -> Self {
        Self {
            ranks: [1, 1, 1],
            coords: [0, 0, 0],
            local_counts,
            comm: SingleProcessComm,
        }
    }
}

impl<C: Collective> ProcessTopology<C> {
    /// Build a topology from this rank's view of the run.
    ///
    /// `ranks` are the per-axis rank counts, `coords` this rank's 0-based
    /// grid coordinate and `local_counts` the cell counts of the block it
    /// owns (supplied by the caller; this crate never computes a
    /// distribution itself). The rank-count product must match the
    /// communicator size, and all ranks of one run must pass the same
    /// `ranks`.
    pub fn new(
        comm: C,
        ranks: [usize; 3],
        coords: [usize; 3],
        local_counts: [usize; 3],
    ) -> Result<Self> {
        let members: usize = ranks.iter().product();
        if members == 0 {
            return Err(DecompError::InvalidTopology(
                "every axis needs at least one rank".to_string(),
            ));
        }
        if members != comm.n_members() {
            return Err(DecompError::InvalidTopology(format!(
                "process grid {}x{}x{} needs {} ranks, communicator has {}",
                ranks[0],
                ranks[1],
                ranks[2],
                members,
                comm.n_members()
            )));
        }
        for axis in Axis3::ALL.iter() {
            if coords[axis.index()] >= ranks[axis.index()] {
                return Err(DecompError::InvalidTopology(format!(
                    "coordinate {} exceeds the {} ranks along {}",
                    coords[axis.index()],
                    ranks[axis.index()],
                    axis
                )));
            }
        }
        Ok(Self {
            ranks,
            coords,
            local_counts,
            comm,
        })
    }

    /// Per-axis rank counts
    pub fn ranks(&self) -> [usize; 3] {
        self.ranks
    }

    /// This rank's grid coordinate
    pub fn coords(&self) -> [usize; 3] {
        self.coords
    }

    /// Cell counts of this rank's block
    pub fn local_counts(&self) -> [usize; 3] {
        self.local_counts
    }

    /// The communicator carried by this topology
    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Rank count along one axis
    pub fn n_ranks(&self, axis: Axis3) -> usize {
        self.ranks[axis.index()]
    }

    /// This rank's coordinate along one axis
    pub fn coord(&self, axis: Axis3) -> usize {
        self.coords[axis.index()]
    }

    /// This rank's cell count along one axis
    pub fn local_count(&self, axis: Axis3) -> usize {
        self.local_counts[axis.index()]
    }

    /// True for the trivial one-rank grid
    pub fn is_single_process(&self) -> bool {
        self.ranks == [1, 1, 1]
    }

    /// Block until every rank of the grid has arrived
    pub fn barrier(&self) {
        self.comm.barrier();
    }

    /// True if this rank is the designated writer for slots along `axis`:
    /// its coordinate on both orthogonal axes is 0, so exactly one rank per
    /// slot contributes to a zero-filled reduction buffer.
    pub(crate) fn is_canonical_along(&self, axis: Axis3) -> bool {
        let [a, b] = axis.others();
        self.coord(a) == 0 && self.coord(b) == 0
    }

    /// True for the rank at the global low corner
    pub(crate) fn is_low_corner(&self) -> bool {
        self.coords == [0, 0, 0]
    }

    /// True for the canonical rank at the high end of `axis`
    pub(crate) fn is_high_corner_along(&self, axis: Axis3) -> bool {
        self.coord(axis) + 1 == self.n_ranks(axis) && self.is_canonical_along(axis)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collective::{spawn_team, SharedMemoryComm};

    #[test]
    fn single_process_topology() {
        let topo = ProcessTopology::single_process([4, 5, 6]);
        assert!(topo.is_single_process());
        assert_eq!(topo.ranks(), [1, 1, 1]);
        assert_eq!(topo.coords(), [0, 0, 0]);
        assert_eq!(topo.local_count(Axis3::Y), 5);
        assert!(topo.is_canonical_along(Axis3::X));
        assert!(topo.is_low_corner());
        assert!(topo.is_high_corner_along(Axis3::Z));
        topo.barrier();
    }

    #[test]
    fn rejects_mismatched_member_count() {
        let result = ProcessTopology::new(SingleProcessComm, [2, 1, 1], [0, 0, 0], [4, 4, 4]);
        assert!(matches!(result, Err(crate::DecompError::InvalidTopology(_))));
    }

    #[test]
    fn rejects_degenerate_grid() {
        let result = ProcessTopology::new(SingleProcessComm, [0, 1, 1], [0, 0, 0], [4, 4, 4]);
        assert!(matches!(result, Err(crate::DecompError::InvalidTopology(_))));
    }

    #[test]
    fn rejects_out_of_range_coordinate() {
        let result = ProcessTopology::new(SingleProcessComm, [1, 1, 1], [0, 1, 0], [4, 4, 4]);
        assert!(matches!(result, Err(crate::DecompError::InvalidTopology(_))));
    }

    #[test]
    fn grid_coords_runs_x_fastest() {
        let ranks = [2, 3, 2];
        assert_eq!(grid_coords(0, ranks), [0, 0, 0]);
        assert_eq!(grid_coords(1, ranks), [1, 0, 0]);
        assert_eq!(grid_coords(2, ranks), [0, 1, 0]);
        assert_eq!(grid_coords(7, ranks), [1, 0, 1]);
        assert_eq!(grid_coords(11, ranks), [1, 2, 1]);
    }

    #[test]
    fn canonical_ranks_are_unique_per_slot() {
        spawn_team(6, |comm: SharedMemoryComm| {
            let coords = grid_coords(comm.rank(), [3, 2, 1]);
            let topo = ProcessTopology::new(comm, [3, 2, 1], coords, [2, 2, 2]).unwrap();
            // exactly the ranks with y == z == 0 write x-axis slots
            assert_eq!(topo.is_canonical_along(Axis3::X), coords[1] == 0 && coords[2] == 0);
            // count the writers for slot x via a reduction
            let mut writers = vec![0u64];
            if topo.is_canonical_along(Axis3::X) {
                writers[0] = 1;
            }
            topo.comm().all_reduce_sum(&mut writers);
            assert_eq!(writers[0], 3); // one writer per x slot
        });
    }

    #[test]
    fn global_size_conversions() {
        assert_eq!(GlobalSize::from(7).extents(), [7, 7, 7]);
        assert_eq!(GlobalSize::from([8, 6]).extents(), [8, 6, 1]);
        assert_eq!(GlobalSize::from([2, 3, 4]).along(Axis3::Z), 4);
    }

    #[test]
    fn axis_helpers() {
        assert_eq!(Axis3::Y.others(), [Axis3::X, Axis3::Z]);
        assert_eq!(format!("{}", Axis3::Z), "z");
        assert_eq!(Axis3::ALL[1].index(), 1);
    }
}
