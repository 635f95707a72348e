//! Test layouts and arrays over several partitions
use approx::assert_relative_eq;
use itertools::Itertools;
use ndpart::{
    DistributedArray, OwnershipMap, SerialComm, ShapeTranslator, ThreadComm, traits::Comm,
    types::Error,
};
use std::rc::Rc;

#[test]
fn test_uniform_maps_partition_all_offsets() {
    for total in [1, 7, 10, 33] {
        for partitions in 1..6 {
            let map = OwnershipMap::uniform(total, partitions);
            let owned = (0..partitions).map(|p| map.owned_offsets(p)).collect_vec();
            assert_eq!(owned.concat(), (0..total).collect_vec());

            let sizes = owned.iter().map(|o| o.len()).collect_vec();
            assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);

            for (p, offsets) in owned.iter().enumerate() {
                for (slot, &offset) in offsets.iter().enumerate() {
                    assert_eq!(map.owner_of(offset), Ok(p));
                    assert_eq!(map.local_slot(offset, p), Ok(slot));
                    assert_eq!(map.global_offset(p, slot), Ok(offset));
                }
            }
        }
    }
}

#[test]
fn test_scattered_map_slots_are_dense() {
    let owners = (0..23).map(|i| (i * 7 + 3) % 4).collect_vec();
    let map = OwnershipMap::from_owners(owners.clone(), 4).unwrap();
    for p in 0..4 {
        let slots = map
            .owned_offsets(p)
            .iter()
            .map(|&o| map.local_slot(o, p).unwrap())
            .collect_vec();
        assert_eq!(slots, (0..map.owned_count(p)).collect_vec());
    }
    for (offset, &owner) in owners.iter().enumerate() {
        assert_eq!(map.owner_of(offset), Ok(owner));
    }
}

#[test]
fn test_linearize_round_trip() {
    for dims in [vec![1], vec![5], vec![3, 4], vec![2, 3, 4], vec![4, 1, 2, 3]] {
        let shape = ShapeTranslator::new(&dims).unwrap();
        for offset in 0..shape.total_size() {
            let index = shape.delinearize(offset).unwrap();
            assert_eq!(shape.linearize(&index), Ok(offset));
        }
        assert!(shape.delinearize(shape.total_size()).is_err());
    }
}

#[test]
fn test_index_of_four_by_four() {
    let shape = ShapeTranslator::new(&[4, 4]).unwrap();
    assert_eq!(shape.linearize(&[2, 3]), Ok(11));
    assert_eq!(shape.delinearize(11), Ok(vec![2, 3]));
    assert_eq!(
        shape.linearize(&[4, 0]),
        Err(Error::IndexOutOfBounds { index: 4, size: 4 })
    );
}

#[test]
fn test_reshape_round_trip_keeps_values() {
    let results = ThreadComm::run(3, |comm| {
        let mut a = DistributedArray::<i32, _>::from_dims(comm, &[4, 6]).unwrap();
        for offset in a.owned_offsets() {
            a.set(&[offset], &[offset as i32]).unwrap();
        }
        let before = a.gather_all();
        a.reshape(&[2, 3, 4]).unwrap();
        assert_eq!(a.shape(), &[2, 3, 4]);
        assert_eq!(a.get_at(&[1, 2, 3]).unwrap().is_some(), comm.rank() == 2);
        a.reshape(&[4, 6]).unwrap();
        (before, a.gather_all(), a.shape().to_vec())
    });
    for (before, after, shape) in results {
        assert_eq!(before, after);
        assert_eq!(shape, vec![4, 6]);
    }
}

#[test]
fn test_global_sum_of_constant() {
    for partitions in 1..5 {
        for (dims, value) in [(vec![10], 3.0), (vec![3, 5], -0.25), (vec![2, 2, 7], 1.5)] {
            let n = dims.iter().product::<usize>() as f64;
            let sums = ThreadComm::run(partitions, |comm| {
                let mut a = DistributedArray::<f64, _>::from_dims(comm, &dims).unwrap();
                a.fill(value);
                a.global_sum()
            });
            for s in sums {
                assert_relative_eq!(s, n * value, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_set_routes_to_owner() {
    let results = ThreadComm::run(2, |comm| {
        let mut a = DistributedArray::<f64, _>::from_dims(comm, &[10]).unwrap();
        // Every partition writes the same global values; only the owner keeps them.
        a.set(&(0..10).collect_vec(), &(0..10).map(|i| i as f64).collect_vec())
            .unwrap();
        a.local_values().to_vec()
    });
    assert_eq!(results[0], vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(results[1], vec![5.0, 6.0, 7.0, 8.0, 9.0]);
}

#[test]
fn test_finite_volume_stencil_with_ghosts() {
    let n = 13;
    for partitions in 1..5 {
        let results = ThreadComm::run(partitions, |comm| {
            let translator = Rc::new(ShapeTranslator::new(&[n]).unwrap());
            let map = Rc::new(OwnershipMap::uniform(n, comm.size()));
            let owned = map.owned_offsets(comm.rank());
            // Neighbours of the owned cells that live on other partitions.
            let neighbours = owned
                .iter()
                .flat_map(|&i| [i.wrapping_sub(1), i + 1])
                .filter(|&j| j < n)
                .collect_vec();
            let mut u =
                DistributedArray::<f64, _>::with_ghosts(comm, translator, map, &neighbours)
                    .unwrap();
            for offset in &owned {
                u.set(&[*offset], &[(offset * offset) as f64]).unwrap();
            }
            u.update_ghosts().unwrap();

            let mut laplacian = u.zeros_like::<f64>();
            for (slot, &i) in owned.iter().enumerate() {
                if i == 0 || i == n - 1 {
                    continue;
                }
                let value = |j: usize| u.local_values()[u.slot_of_offset(j).unwrap()];
                laplacian.owned_values_mut()[slot] = value(i - 1) - 2.0 * value(i) + value(i + 1);
            }
            laplacian.gather_all()
        });
        for r in results {
            assert_eq!(r[0], 0.0);
            assert_eq!(r[n - 1], 0.0);
            for v in &r[1..n - 1] {
                assert_relative_eq!(*v, 2.0);
            }
        }
    }
}

#[test]
fn test_accumulate_shared_contributions() {
    for partitions in 1..5 {
        let results = ThreadComm::run(partitions, |comm| {
            let translator = Rc::new(ShapeTranslator::new(&[8]).unwrap());
            let map = Rc::new(OwnershipMap::uniform(8, comm.size()));
            let mut a = DistributedArray::<i64, _>::with_ghosts(comm, translator, map, &[0])
                .unwrap();
            a.fill(1);
            a.accumulate_ghosts().unwrap();
            a.gather(&[0, 7]).unwrap()
        });
        for r in results {
            assert_eq!(r, vec![partitions as i64, 1]);
        }
    }
}

#[test]
fn test_dot_over_partitions_matches_serial() {
    let values = (0..17).map(|i| (i as f64).sin()).collect_vec();
    let translator = Rc::new(ShapeTranslator::new(&[17]).unwrap());
    let map = Rc::new(OwnershipMap::uniform(17, 1));
    let serial =
        DistributedArray::from_global_slice(&SerialComm, translator, map, &values).unwrap();
    let expected = serial.dot(&serial).unwrap();
    for partitions in 2..5 {
        let results = ThreadComm::run(partitions, |comm| {
            let translator = Rc::new(ShapeTranslator::new(&[17]).unwrap());
            let map = Rc::new(OwnershipMap::from_fn(17, comm.size(), |i| i % comm.size()).unwrap());
            let a = DistributedArray::from_global_slice(comm, translator, map, &values).unwrap();
            (a.dot(&a).unwrap(), a.norm2())
        });
        for (dot, norm) in results {
            assert_relative_eq!(dot, expected, epsilon = 1e-12);
            assert_relative_eq!(norm, expected.sqrt(), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_derived_arrays_share_layout() {
    let a = DistributedArray::<i64, _>::from_dims(&SerialComm, &[3, 3]).unwrap();
    let b = a.cos().exp().arctan2(&a).unwrap();
    assert!(Rc::ptr_eq(a.translator(), b.translator()));
    assert!(Rc::ptr_eq(a.ownership_map(), b.ownership_map()));
    assert_eq!(b.shape(), &[3, 3]);
}

#[test]
fn test_all_close_is_local() {
    let results = ThreadComm::run(3, |comm| {
        let mut a = DistributedArray::<f64, _>::from_dims(comm, &[6]).unwrap();
        a.fill(2.0);
        let mut b = a.clone();
        b.set(&[0], &[f64::NAN]).unwrap();
        (
            a.all_close(&a, 0.0, 0.0),
            a.all_close(&b, 1.0, 1.0),
            a.global_all_close(&b, 1.0, 1.0),
        )
    });
    assert_eq!(
        results,
        vec![(true, false, false), (true, true, false), (true, true, false)]
    );
}
