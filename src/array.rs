//! Partition and assembly of 2-D and 3-D field data.
//!
//! Fields are cut along the first two axes only; the third axis always
//! keeps its full extent (z-pencil layout). Grids with more than one rank
//! on the z axis are rejected for array data rather than mishandled.
//!
//! Both directions move the data through a [`MemoryPlacement`] capability at
//! the boundary, so a simulation that keeps its fields in device memory can
//! stage them through host-addressable memory for the slicing and the
//! reduction; [`HostMemory`](crate::memory::HostMemory) is the identity
//! placement for host-only runs.
use crate::collective::Collective;
use crate::error::{DecompError, Result};
use crate::memory::MemoryPlacement;
use crate::topology::{Axis3, GlobalSize, ProcessTopology};
use crate::types::CommElement;
use ndarray::{s, Array, Array2, Array3, ArrayBase, Data, Dimension, Ix2, Ix3};
use tracing::debug_span;

/// Sum an array elementwise over all ranks, in place.
fn reduce_array_in_place<C, A, D>(comm: &C, values: &mut Array<A, D>)
where
    C: Collective,
    A: CommElement,
    D: Dimension,
{
    if let Some(flat) = values.as_slice_memory_order_mut() {
        comm.all_reduce_sum(flat);
    } else {
        let mut flat: Vec<A> = values.iter().copied().collect();
        comm.all_reduce_sum(&mut flat);
        for (slot, v) in values.iter_mut().zip(flat.iter()) {
            *slot = *v;
        }
    }
}

impl<C: Collective> ProcessTopology<C> {
    /// Array data is only ever cut along x and y.
    fn require_unsplit_z(&self) -> Result<()> {
        let [rx, ry, rz] = self.ranks();
        if rz > 1 {
            return Err(DecompError::UnsupportedSplit(rx, ry, rz));
        }
        Ok(())
    }

    /// This rank's block of a global 2-D field.
    ///
    /// Collective: all ranks must call with the same field and size.
    pub fn partition_array2<S, A, M>(
        &self,
        field: &ArrayBase<S, Ix2>,
        global: impl Into<GlobalSize>,
        placement: &M,
    ) -> Result<Array2<A>>
    where
        S: Data<Elem = A>,
        A: CommElement,
        M: MemoryPlacement,
    {
        let size = global.into();
        let (gx, gy) = (size.along(Axis3::X), size.along(Axis3::Y));
        if field.dim() != (gx, gy) {
            return Err(DecompError::ShapeMismatch(format!(
                "global field is {:?}, declared size is ({}, {})",
                field.dim(),
                gx,
                gy
            )));
        }
        self.require_unsplit_z()?;
        if self.is_single_process() {
            return Ok(field.to_owned());
        }
        let _span = debug_span!("partition_array2", rows = gx, cols = gy).entered();
        let nx = self.concatenate_local_sizes(size, Axis3::X)?;
        let ny = self.concatenate_local_sizes(size, Axis3::Y)?;
        let (rx, ry) = (self.coord(Axis3::X), self.coord(Axis3::Y));
        let x0: usize = nx[..rx].iter().sum();
        let y0: usize = ny[..ry].iter().sum();
        let staged = placement.to_host(field.to_owned());
        let block = staged
            .slice(s![x0..x0 + nx[rx], y0..y0 + ny[ry]])
            .to_owned();
        Ok(placement.to_device(block))
    }

    /// This rank's block of a global 3-D field. The third axis keeps its
    /// full extent.
    pub fn partition_array3<S, A, M>(
        &self,
        field: &ArrayBase<S, Ix3>,
        global: impl Into<GlobalSize>,
        placement: &M,
    ) -> Result<Array3<A>>
    where
        S: Data<Elem = A>,
        A: CommElement,
        M: MemoryPlacement,
    {
        let size = global.into();
        let extents = size.extents();
        if field.dim() != (extents[0], extents[1], extents[2]) {
            return Err(DecompError::ShapeMismatch(format!(
                "global field is {:?}, declared size is {:?}",
                field.dim(),
                extents
            )));
        }
        self.require_unsplit_z()?;
        if self.is_single_process() {
            return Ok(field.to_owned());
        }
        let _span = debug_span!(
            "partition_array3",
            nx = extents[0],
            ny = extents[1],
            nz = extents[2]
        )
        .entered();
        let nx = self.concatenate_local_sizes(size, Axis3::X)?;
        let ny = self.concatenate_local_sizes(size, Axis3::Y)?;
        let (rx, ry) = (self.coord(Axis3::X), self.coord(Axis3::Y));
        let x0: usize = nx[..rx].iter().sum();
        let y0: usize = ny[..ry].iter().sum();
        let staged = placement.to_host(field.to_owned());
        let block = staged
            .slice(s![x0..x0 + nx[rx], y0..y0 + ny[ry], ..])
            .to_owned();
        Ok(placement.to_device(block))
    }

    /// Reconstruct the global 2-D field from every rank's block.
    ///
    /// Every rank writes its block into a zeroed global-shaped array at its
    /// offsets; one sum-reduction-to-all leaves the identical full field on
    /// every rank. Exact inverse of [`ProcessTopology::partition_array2`].
    pub fn assemble_array2<S, A, M>(
        &self,
        block: &ArrayBase<S, Ix2>,
        global: impl Into<GlobalSize>,
        placement: &M,
    ) -> Result<Array2<A>>
    where
        S: Data<Elem = A>,
        A: CommElement,
        M: MemoryPlacement,
    {
        let size = global.into();
        let (gx, gy) = (size.along(Axis3::X), size.along(Axis3::Y));
        self.require_unsplit_z()?;
        if self.is_single_process() {
            if block.dim() != (gx, gy) {
                return Err(DecompError::ShapeMismatch(format!(
                    "local block is {:?}, declared size is ({}, {})",
                    block.dim(),
                    gx,
                    gy
                )));
            }
            return Ok(block.to_owned());
        }
        let _span = debug_span!("assemble_array2", rows = gx, cols = gy).entered();
        let nx = self.concatenate_local_sizes(size, Axis3::X)?;
        let ny = self.concatenate_local_sizes(size, Axis3::Y)?;
        let (rx, ry) = (self.coord(Axis3::X), self.coord(Axis3::Y));
        if block.dim() != (nx[rx], ny[ry]) {
            return Err(DecompError::ShapeMismatch(format!(
                "local block is {:?}, this rank owns ({}, {})",
                block.dim(),
                nx[rx],
                ny[ry]
            )));
        }
        let x0: usize = nx[..rx].iter().sum();
        let y0: usize = ny[..ry].iter().sum();
        let staged = placement.to_host(block.to_owned());
        let mut assembled = Array2::zeros((gx, gy));
        assembled
            .slice_mut(s![x0..x0 + nx[rx], y0..y0 + ny[ry]])
            .assign(&staged);
        reduce_array_in_place(self.comm(), &mut assembled);
        Ok(placement.to_device(assembled))
    }

    /// Reconstruct the global 3-D field from every rank's block. Exact
    /// inverse of [`ProcessTopology::partition_array3`].
    pub fn assemble_array3<S, A, M>(
        &self,
        block: &ArrayBase<S, Ix3>,
        global: impl Into<GlobalSize>,
        placement: &M,
    ) -> Result<Array3<A>>
    where
        S: Data<Elem = A>,
        A: CommElement,
        M: MemoryPlacement,
    {
        let size = global.into();
        let extents = size.extents();
        self.require_unsplit_z()?;
        if self.is_single_process() {
            if block.dim() != (extents[0], extents[1], extents[2]) {
                return Err(DecompError::ShapeMismatch(format!(
                    "local block is {:?}, declared size is {:?}",
                    block.dim(),
                    extents
                )));
            }
            return Ok(block.to_owned());
        }
        let _span = debug_span!(
            "assemble_array3",
            nx = extents[0],
            ny = extents[1],
            nz = extents[2]
        )
        .entered();
        let nx = self.concatenate_local_sizes(size, Axis3::X)?;
        let ny = self.concatenate_local_sizes(size, Axis3::Y)?;
        let (rx, ry) = (self.coord(Axis3::X), self.coord(Axis3::Y));
        if block.dim() != (nx[rx], ny[ry], extents[2]) {
            return Err(DecompError::ShapeMismatch(format!(
                "local block is {:?}, this rank owns ({}, {}, {})",
                block.dim(),
                nx[rx],
                ny[ry],
                extents[2]
            )));
        }
        let x0: usize = nx[..rx].iter().sum();
        let y0: usize = ny[..ry].iter().sum();
        let staged = placement.to_host(block.to_owned());
        let mut assembled = Array3::zeros((extents[0], extents[1], extents[2]));
        assembled
            .slice_mut(s![x0..x0 + nx[rx], y0..y0 + ny[ry], ..])
            .assign(&staged);
        reduce_array_in_place(self.comm(), &mut assembled);
        Ok(placement.to_device(assembled))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collective::{spawn_team, SharedMemoryComm};
    use crate::memory::HostMemory;
    use crate::topology::grid_coords;
    use ndarray::{Array2, Array3};

    fn sample2(nx: usize, ny: usize) -> Array2<f64> {
        Array2::from_shape_fn((nx, ny), |(i, j)| (10 * i + j) as f64)
    }

    fn sample3(nx: usize, ny: usize, nz: usize) -> Array3<f64> {
        Array3::from_shape_fn((nx, ny, nz), |(i, j, k)| (100 * i + 10 * j + k) as f64)
    }

    #[test]
    fn single_process_arrays_pass_through() {
        let topo = ProcessTopology::single_process([8, 6, 5]);
        let field2 = sample2(8, 6);
        let local2 = topo.partition_array2(&field2, [8, 6], &HostMemory).unwrap();
        assert_eq!(local2, field2);
        assert_eq!(
            topo.assemble_array2(&local2, [8, 6], &HostMemory).unwrap(),
            field2
        );

        let field3 = sample3(8, 6, 5);
        let local3 = topo
            .partition_array3(&field3, [8, 6, 5], &HostMemory)
            .unwrap();
        assert_eq!(local3, field3);
        assert_eq!(
            topo.assemble_array3(&local3, [8, 6, 5], &HostMemory)
                .unwrap(),
            field3
        );
    }

    #[test]
    fn two_ranks_split_the_rows() {
        spawn_team(2, |comm: SharedMemoryComm| {
            let r = comm.rank();
            let topo = ProcessTopology::new(comm, [2, 1, 1], [r, 0, 0], [4, 6, 1]).unwrap();
            let field = sample2(8, 6);
            let block = topo.partition_array2(&field, [8, 6], &HostMemory).unwrap();
            assert_eq!(block.dim(), (4, 6));
            let rows = 4 * r..4 * (r + 1);
            assert_eq!(block, field.slice(s![rows, ..]).to_owned());
            let back = topo.assemble_array2(&block, [8, 6], &HostMemory).unwrap();
            assert_eq!(back, field);
        });
    }

    #[test]
    fn six_ranks_round_trip_a_3d_field() {
        spawn_team(6, |comm: SharedMemoryComm| {
            let coords = grid_coords(comm.rank(), [2, 3, 1]);
            let topo = ProcessTopology::new(comm, [2, 3, 1], coords, [2, 2, 5]).unwrap();
            let field = sample3(4, 6, 5);
            let block = topo
                .partition_array3(&field, [4, 6, 5], &HostMemory)
                .unwrap();
            assert_eq!(block.dim(), (2, 2, 5));
            let back = topo.assemble_array3(&block, [4, 6, 5], &HostMemory).unwrap();
            assert_eq!(back, field);
        });
    }

    #[test]
    fn offsets_materialize_the_same_block() {
        spawn_team(6, |comm: SharedMemoryComm| {
            let coords = grid_coords(comm.rank(), [2, 3, 1]);
            let topo = ProcessTopology::new(comm, [2, 3, 1], coords, [2, 2, 5]).unwrap();
            let field = sample3(4, 6, 5);
            let block = topo
                .partition_array3(&field, [4, 6, 5], &HostMemory)
                .unwrap();
            // evaluating the field rule per point over the local block only
            let offsets = topo.local_offsets([4, 6, 5]).unwrap();
            let lazy = Array3::from_shape_fn((2, 2, 5), |(i, j, k)| {
                (100 * (offsets[0] + i) + 10 * (offsets[1] + j) + (offsets[2] + k)) as f64
            });
            assert_eq!(block, lazy);
        });
    }

    #[test]
    fn z_splits_are_rejected_for_arrays() {
        spawn_team(2, |comm: SharedMemoryComm| {
            let r = comm.rank();
            let topo = ProcessTopology::new(comm, [1, 1, 2], [0, 0, r], [4, 6, 3]).unwrap();
            let field = sample3(4, 6, 6);
            let result = topo.partition_array3(&field, [4, 6, 6], &HostMemory);
            assert!(matches!(result, Err(DecompError::UnsupportedSplit(1, 1, 2))));
            let block = sample3(4, 6, 3);
            let result = topo.assemble_array3(&block, [4, 6, 6], &HostMemory);
            assert!(matches!(result, Err(DecompError::UnsupportedSplit(1, 1, 2))));
        });
    }

    #[test]
    fn global_shape_is_validated() {
        let topo = ProcessTopology::single_process([8, 6, 5]);
        let field = sample2(8, 5);
        let result = topo.partition_array2(&field, [8, 6], &HostMemory);
        assert!(matches!(result, Err(DecompError::ShapeMismatch(_))));
        let result = topo.assemble_array2(&field, [8, 6], &HostMemory);
        assert!(matches!(result, Err(DecompError::ShapeMismatch(_))));
    }

    #[test]
    fn local_shape_is_validated_on_assembly() {
        spawn_team(2, |comm: SharedMemoryComm| {
            let r = comm.rank();
            let topo = ProcessTopology::new(comm, [2, 1, 1], [r, 0, 0], [4, 6, 1]).unwrap();
            let wrong = sample2(3, 6);
            let result = topo.assemble_array2(&wrong, [8, 6], &HostMemory);
            assert!(matches!(result, Err(DecompError::ShapeMismatch(_))));
            // keep the team in step for the size reductions both ranks ran
            topo.barrier();
        });
    }
}
