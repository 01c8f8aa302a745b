//! Run with
//!
//! cargo mpirun --np 2 --example all_reduce_sum
use rsmpi_collective::functions::all_reduce_sum_in_place;
use rsmpi_collective::mpi::initialize;
use rsmpi_collective::mpi::traits::Communicator;

fn main() {
    let universe = initialize().unwrap();
    let world = universe.world();
    let mut values = vec![world.rank() as f64; 4];
    all_reduce_sum_in_place(&world, &mut values);

    let mut expected = 0.;
    for i in 0..world.size() {
        expected += i as f64;
    }
    assert!(values.iter().all(|&v| v == expected));
}
