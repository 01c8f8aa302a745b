//! Run with
//!
//! cargo mpirun --np 2 --example barrier
use rsmpi_collective::functions::barrier;
use rsmpi_collective::mpi::initialize;
use rsmpi_collective::mpi::traits::Communicator;

fn main() {
    let universe = initialize().unwrap();
    let world = universe.world();
    println!("rank {} before the barrier", world.rank());
    barrier(&world);
    println!("rank {} after the barrier", world.rank());
}
