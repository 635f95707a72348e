use approx::assert_relative_eq;
use mpi::{environment::Universe, traits::Communicator};
use ndpart::{DistributedArray, MpiComm, traits::Comm};

/// Fill a distributed array, refresh its ghosts and reduce it over all processes
fn main() {
    let universe: Universe = mpi::initialize().unwrap();
    let world = universe.world();
    let comm = MpiComm::new(&world);

    let mut a = DistributedArray::<f64, _>::from_dims(&comm, &[10, 10]).unwrap();
    a.fill(0.5);
    let sum = a.global_sum();
    assert_relative_eq!(sum, 50.0, epsilon = 1e-12);

    // Every process keeps a copy of the first and last offset.
    let mut b = DistributedArray::<f64, _>::with_ghosts(
        &comm,
        a.translator().clone(),
        a.ownership_map().clone(),
        &[0, 99],
    )
    .unwrap();
    for offset in b.owned_offsets() {
        b.set(&[offset], &[offset as f64]).unwrap();
    }
    b.update_ghosts().unwrap();
    for (&offset, &value) in b.ghost_offsets().iter().zip(b.ghost_values()) {
        assert_relative_eq!(value, offset as f64);
    }

    let norm = b.sqrt().norm2();
    if comm.rank() == 0 {
        println!(
            "{} processes: global sum {sum}, norm of sqrt {norm}",
            world.size()
        );
    }
}
