use mpi::{environment::Universe, traits::Communicator};
use ndpart::{
    DistributedArray, MpiComm, OwnershipMap, ShapeTranslator, traits::Comm, types::Partitioner,
};
use std::rc::Rc;

/// Test that gather returns the same values in request order on every process
fn test_gather<C: Comm>(comm: &C) {
    let mut a = DistributedArray::<i64, _>::from_dims(comm, &[20]).unwrap();
    for offset in a.owned_offsets() {
        a.set(&[offset], &[offset as i64 * 3]).unwrap();
    }
    let ids = [19, 0, 7, 7, 12];
    let values = a.gather(&ids).unwrap();
    assert_eq!(values, ids.iter().map(|&i| i as i64 * 3).collect::<Vec<_>>());

    let all = a.gather_to(&ids, 0).unwrap();
    assert_eq!(all.is_some(), comm.rank() == 0);
}

/// Test gathering from a round robin ownership map
fn test_gather_manual<C: Comm>(comm: &C) {
    let size = comm.size();
    let translator = Rc::new(ShapeTranslator::new(&[4, 5]).unwrap());
    let owners = (0..20).map(|i| i % size).collect();
    let map = OwnershipMap::from_partitioner(20, size, Partitioner::Manual(owners)).unwrap();
    let map = Rc::new(map);
    let values = (0..20).map(|i| i as f64 * 0.25).collect::<Vec<_>>();
    let a = DistributedArray::from_global_slice(comm, translator, map, &values).unwrap();
    assert_eq!(a.gather_all(), values);
}

/// Run tests
fn main() {
    let universe: Universe = mpi::initialize().unwrap();
    let world = universe.world();
    let comm = MpiComm::new(&world);

    if world.rank() == 0 {
        println!("Testing gather");
    }
    test_gather(&comm);

    if world.rank() == 0 {
        println!("Testing gather with a manual partition");
    }
    test_gather_manual(&comm);
}
