//! Partition/assemble round trip on a real MPI run.
//!
//! Run with
//!
//! cargo mpirun --np 4 --features mpi --example split_assemble_mpi
use ndarray::{Array1, Array3};
use pencil_decomp::mpi::{initialize, MpiWorldComm};
use pencil_decomp::{grid_coords, Axis3, Collective, HostMemory, ProcessTopology};

fn main() {
    let _universe = initialize().unwrap();
    let comm = MpiWorldComm::world();
    assert_eq!(comm.n_members(), 4, "run with mpirun --np 4");

    let layout = [2, 2, 1];
    let coords = grid_coords(comm.rank(), layout);
    let size = [8usize, 6, 5];
    let local = [size[0] / 2, size[1] / 2, size[2]];
    let topo = ProcessTopology::new(comm, layout, coords, local).unwrap();

    // coordinate sequence round trip
    let vertices = Array1::linspace(0.0, 8.0, 9);
    let local_vertices = topo.partition_coordinate(&vertices, size, Axis3::X).unwrap();
    let assembled = topo
        .assemble_coordinate(&local_vertices, size, Axis3::X)
        .unwrap();
    assert_eq!(assembled, vertices);

    // uniform interval round trip
    let piece = topo.partition_interval((0.0, 12.0), size, Axis3::Y).unwrap();
    let interval = topo.assemble_interval(piece, Axis3::Y).unwrap();
    assert_eq!(interval, (0.0, 12.0));

    // 3-d field round trip
    let field = Array3::from_shape_fn((size[0], size[1], size[2]), |(i, j, k)| {
        (100 * i + 10 * j + k) as f64
    });
    let block = topo.partition_array3(&field, size, &HostMemory).unwrap();
    let rebuilt = topo.assemble_array3(&block, size, &HostMemory).unwrap();
    assert_eq!(rebuilt, field);

    topo.barrier();
    if topo.coords() == [0, 0, 0] {
        println!("split/assemble round trips verified on 4 ranks");
    }
}
