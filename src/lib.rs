/*!
Global/local domain decomposition for structured grids on 3-axis process
grids.

A multi-process structured-grid computation arranges its ranks in a 3-axis
grid; each rank owns a contiguous block along every partitioned axis. This
crate maps coordinate sequences, uniform intervals and 2-D/3-D fields
between the **global** view (as a single logical simulation sees them) and
the **local** view owned by one rank, and back, keeping all ranks exactly
consistent using nothing but sum-reductions-to-all.

The key idiom is *scatter via zero-fill + collective sum*: every rank
prepares a mostly-zero buffer, only a designated rank fills each slot, and a
single reduction recovers the full value everywhere. Because every call site
is symmetric across ranks, there is no message ordering to get wrong; and
because at most one rank contributes per slot, the reduced result is
bit-exact and independent of the reduction order.

# Backends

The same operations run unchanged on a single process, on an in-process team
of threads, or on MPI; the backend is selected once, when the
[`ProcessTopology`] is constructed:

```
use ndarray::Array1;
use pencil_decomp::{Axis3, ProcessTopology};

let topo = ProcessTopology::single_process([12, 1, 1]);
let vertices = Array1::linspace(0.0, 12.0, 13);
let local = topo.partition_coordinate(&vertices, [12, 1, 1], Axis3::X)?;
let global = topo.assemble_coordinate(&local, [12, 1, 1], Axis3::X)?;
assert_eq!(global, vertices);
# Ok::<(), pencil_decomp::DecompError>(())
```

Distributed runs build the topology over `mpi::MpiWorldComm` (feature
`mpi`) instead; see `demos/split_assemble_mpi.rs`.

# Array data

Fields are cut along the first two axes only; the third axis always keeps
its full extent (z-pencil layout). Topologies that split the z axis are
rejected for array data.
*/
#![deny(rustdoc::broken_intra_doc_links)]

pub mod collective;
pub mod error;
pub mod memory;
pub mod mpi;
pub mod topology;
pub mod types;
pub mod utils;

mod array;
mod coords;
mod sizes;

pub use collective::{Collective, InProcessComm, SharedMemoryComm, SingleProcessComm};
pub use error::{DecompError, Result};
pub use memory::{HostMemory, MemoryPlacement};
pub use topology::{grid_coords, Axis3, GlobalSize, ProcessTopology};
pub use types::{CommElement, FloatNum};
