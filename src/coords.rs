//! Partition and assembly of 1-D coordinate data.
//!
//! Stretched grids carry their vertices as a sequence of `N + 1` values for
//! `N` cells; uniform grids carry only a `(low, high)` interval. Both forms
//! come in a partition direction (global to this rank's piece) and an
//! assemble direction (all ranks' pieces back to the identical global value
//! on every rank). Partition followed by assemble reproduces the input
//! exactly: every slot of the assembly buffer is written by exactly one
//! canonical rank, so the sum-reduction is bit-exact regardless of the
//! reduction order.
use crate::collective::Collective;
use crate::error::{DecompError, Result};
use crate::topology::{Axis3, GlobalSize, ProcessTopology};
use crate::types::{CommElement, FloatNum};
use ndarray::{s, Array1, ArrayBase, Data, Ix1};

impl<C: Collective> ProcessTopology<C> {
    /// This rank's piece of a global vertex sequence along `axis`.
    ///
    /// The global sequence holds `N + 1` vertices for `N` global cells; the
    /// local piece holds one vertex more than this rank's cell count.
    /// Neighboring ranks share exactly one boundary vertex, so the pieces
    /// stitch seamlessly.
    ///
    /// Collective: all ranks must call with the same sequence, size and axis.
    pub fn partition_coordinate<S, A>(
        &self,
        vertices: &ArrayBase<S, Ix1>,
        global: impl Into<GlobalSize>,
        axis: Axis3,
    ) -> Result<Array1<A>>
    where
        S: Data<Elem = A>,
        A: CommElement,
    {
        let size = global.into();
        let n_global = size.along(axis);
        if vertices.len() != n_global + 1 {
            return Err(DecompError::ShapeMismatch(format!(
                "coordinate sequence has {} vertices, expected {} for {} cells along {}",
                vertices.len(),
                n_global + 1,
                n_global,
                axis
            )));
        }
        let sizes = self.concatenate_local_sizes(size, axis)?;
        let r = self.coord(axis);
        let start: usize = sizes[..r].iter().sum();
        Ok(vertices.slice(s![start..start + sizes[r] + 1]).to_owned())
    }

    /// Reconstruct the global vertex sequence from every rank's local piece.
    ///
    /// Exact inverse of [`ProcessTopology::partition_coordinate`]: canonical
    /// ranks write their piece without its trailing shared vertex into a
    /// zero buffer, the last rank along `axis` adds the final vertex, and
    /// one sum-reduction leaves the full sequence on every rank.
    pub fn assemble_coordinate<S, A>(
        &self,
        local_vertices: &ArrayBase<S, Ix1>,
        global: impl Into<GlobalSize>,
        axis: Axis3,
    ) -> Result<Array1<A>>
    where
        S: Data<Elem = A>,
        A: CommElement,
    {
        let size = global.into();
        let n_global = size.along(axis);
        let sizes = self.concatenate_local_sizes(size, axis)?;
        let r = self.coord(axis);
        if local_vertices.len() != sizes[r] + 1 {
            return Err(DecompError::ShapeMismatch(format!(
                "local coordinate piece has {} vertices, expected {} along {}",
                local_vertices.len(),
                sizes[r] + 1,
                axis
            )));
        }
        let mut assembled = vec![A::zero(); n_global + 1];
        if self.is_canonical_along(axis) {
            let start: usize = sizes[..r].iter().sum();
            for (slot, v) in assembled[start..start + sizes[r]]
                .iter_mut()
                .zip(local_vertices.iter())
            {
                *slot = *v;
            }
            if r + 1 == self.n_ranks(axis) {
                assembled[n_global] = local_vertices[sizes[r]];
            }
        }
        self.comm().all_reduce_sum(&mut assembled);
        Ok(Array1::from(assembled))
    }

    /// This rank's sub-interval of a uniform axis interval.
    ///
    /// The interval is cut proportionally to the per-rank cell counts with
    /// the uniform step `(high - low) / N`. Boundaries are accumulated left
    /// to right with identical float operations on every rank, so the
    /// sub-intervals tile `(low, high)` without gap or overlap and each
    /// width is exactly the step times the rank's cell count.
    pub fn partition_interval<A>(
        &self,
        interval: (A, A),
        global: impl Into<GlobalSize>,
        axis: Axis3,
    ) -> Result<(A, A)>
    where
        A: FloatNum,
    {
        let size = global.into();
        let n_global = size.along(axis);
        if n_global == 0 {
            return Err(DecompError::ShapeMismatch(format!(
                "cannot partition an interval with zero cells along {}",
                axis
            )));
        }
        let sizes = self.concatenate_local_sizes(size, axis)?;
        let (low, high) = interval;
        let step = (high - low) / A::from_usize(n_global).unwrap();
        let r = self.coord(axis);
        let mut lower = low;
        for n in sizes[..r].iter() {
            lower = lower + step * A::from_usize(*n).unwrap();
        }
        let upper = lower + step * A::from_usize(sizes[r]).unwrap();
        Ok((lower, upper))
    }

    /// Recover the global interval from every rank's sub-interval.
    ///
    /// Only the rank at the global low corner contributes the lower bound
    /// and only the canonical rank at the high end of `axis` contributes the
    /// upper bound; a two-slot sum-reduction gives `(low, high)` to every
    /// rank. On a single-process grid both corners are this rank and the
    /// input is returned unchanged.
    pub fn assemble_interval<A>(&self, local: (A, A), axis: Axis3) -> Result<(A, A)>
    where
        A: FloatNum,
    {
        let mut bounds = [A::zero(); 2];
        if self.is_low_corner() {
            bounds[0] = local.0;
        }
        if self.is_high_corner_along(axis) {
            bounds[1] = local.1;
        }
        self.comm().all_reduce_sum(&mut bounds);
        Ok((bounds[0], bounds[1]))
    }
}
