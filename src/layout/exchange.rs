//! Ghost slots and their communication plan
use crate::{
    layout::OwnershipMap,
    traits::Comm,
    types::{Element, Error, Ownership, Result, Transferable},
};
use itertools::{izip, Itertools};
use std::collections::HashMap;
use tracing::debug;

/// Non-owned offsets kept in the local buffer of a partition
///
/// Ghosts are sorted by owning partition and then by offset, so that the values received from one
/// partition form one contiguous run of ghost slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ghosts {
    offsets: Vec<usize>,
    owners: Vec<usize>,
    slots: HashMap<usize, usize>,
}

impl Ghosts {
    /// Create new
    ///
    /// Offsets owned by `partition` and repeated offsets are ignored.
    pub fn new(map: &OwnershipMap, partition: usize, requested: &[usize]) -> Result<Self> {
        let mut ghosts = Vec::with_capacity(requested.len());
        for &offset in requested {
            let owner = map.owner_of(offset)?;
            if owner != partition {
                ghosts.push((owner, offset));
            }
        }
        let (owners, offsets): (Vec<_>, Vec<_>) = ghosts.into_iter().sorted().dedup().unzip();
        let slots = offsets
            .iter()
            .enumerate()
            .map(|(slot, &offset)| (offset, slot))
            .collect();
        Ok(Self {
            offsets,
            owners,
            slots,
        })
    }

    /// Global offsets of the ghost slots
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Owning partition of each ghost slot
    pub fn owners(&self) -> &[usize] {
        &self.owners
    }

    /// Position of a global offset among the ghosts
    pub fn slot(&self, offset: usize) -> Option<usize> {
        self.slots.get(&offset).copied()
    }

    /// Number of ghosts
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Are there no ghosts?
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Communication plan that fills the ghost slots of a partition from their owners
///
/// Built once by a collective call and then reused for every exchange with the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangePattern {
    owned_count: usize,
    ghost_ownership: Vec<Ownership>,
    recv_counts: Vec<usize>,
    send_counts: Vec<usize>,
    send_slots: Vec<usize>,
}

impl ExchangePattern {
    /// Create new
    ///
    /// This is a collective operation.
    pub fn new<C: Comm>(comm: &C, map: &OwnershipMap, ghosts: &Ghosts) -> Result<Self> {
        let rank = comm.rank();
        if map.partition_count() != comm.size() {
            return Err(Error::PartitionCountMismatch {
                expected: map.partition_count(),
                actual: comm.size(),
            });
        }

        let mut recv_counts = vec![0; comm.size()];
        for &owner in ghosts.owners() {
            recv_counts[owner] += 1;
        }

        // Every owner learns which of its offsets are ghosts elsewhere, in the order the ghosts
        // are stored on the requesting partition.
        let (send_counts, requested) = comm.all_to_all_varcount(&recv_counts, ghosts.offsets());
        let send_slots = requested
            .iter()
            .map(|&offset| map.local_slot(offset, rank))
            .collect::<Result<Vec<_>>>()?;

        let ghost_ownership = izip!(ghosts.offsets(), ghosts.owners())
            .map(|(&offset, &owner)| Ok(Ownership::Ghost(owner, map.local_slot(offset, owner)?)))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            rank,
            ghosts = ghosts.len(),
            sent = send_slots.len(),
            "built exchange pattern"
        );

        Ok(Self {
            owned_count: map.owned_count(rank),
            ghost_ownership,
            recv_counts,
            send_counts,
            send_slots,
        })
    }

    /// Ownership of each ghost slot
    pub fn ghost_ownership(&self) -> &[Ownership] {
        &self.ghost_ownership
    }

    /// Number of ghost values received from each partition
    pub fn recv_counts(&self) -> &[usize] {
        &self.recv_counts
    }

    /// Number of owned values sent to each partition
    pub fn send_counts(&self) -> &[usize] {
        &self.send_counts
    }

    /// Owned local slots sent to other partitions, grouped by destination partition
    pub fn send_slots(&self) -> &[usize] {
        &self.send_slots
    }

    /// Partitions this partition exchanges values with
    pub fn neighbours(&self) -> Vec<usize> {
        izip!(&self.send_counts, &self.recv_counts)
            .enumerate()
            .filter(|&(_, (&s, &r))| s > 0 || r > 0)
            .map(|(p, _)| p)
            .collect()
    }

    /// Copy owned values into the ghost slots of the partitions that reference them
    ///
    /// `owned` needs one value per owned offset and `ghosts` one value per ghost. The lengths are
    /// checked before any communication. This is a collective operation.
    pub fn exchange<T: Transferable, C: Comm>(
        &self,
        comm: &C,
        owned: &[T],
        ghosts: &mut [T],
    ) -> Result<()> {
        self.check_lengths(owned.len(), ghosts.len())?;
        let send = self.send_slots.iter().map(|&s| owned[s]).collect_vec();
        let (_, received) = comm.all_to_all_varcount(&self.send_counts, &send);
        ghosts.copy_from_slice(&received);
        Ok(())
    }

    /// Add the values in ghost slots to the owned values they are copies of
    ///
    /// Ghost slots keep their values. The lengths are checked as for
    /// [`ExchangePattern::exchange`]. This is a collective operation.
    pub fn accumulate<T: Element, C: Comm>(
        &self,
        comm: &C,
        ghosts: &[T],
        owned: &mut [T],
    ) -> Result<()> {
        self.check_lengths(owned.len(), ghosts.len())?;
        let (_, received) = comm.all_to_all_varcount(&self.recv_counts, ghosts);
        for (&slot, &value) in izip!(&self.send_slots, &received) {
            owned[slot] = owned[slot].elem_add(value);
        }
        Ok(())
    }

    fn check_lengths(&self, owned: usize, ghosts: usize) -> Result<()> {
        for (expected, actual) in [
            (self.owned_count, owned),
            (self.ghost_ownership.len(), ghosts),
        ] {
            if expected != actual {
                return Err(Error::LengthMismatch { expected, actual });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::comm::{SerialComm, ThreadComm};

    #[test]
    fn test_ghosts_sorted_by_owner() {
        let map = OwnershipMap::from_owners(vec![2, 0, 1, 2, 1, 0, 0], 3).unwrap();
        let ghosts = Ghosts::new(&map, 0, &[6, 4, 0, 3, 2, 4, 1]).unwrap();
        assert_eq!(ghosts.offsets(), &[2, 4, 0, 3]);
        assert_eq!(ghosts.owners(), &[1, 1, 2, 2]);
        assert_eq!(ghosts.slot(0), Some(2));
        assert_eq!(ghosts.slot(6), None);
    }

    #[test]
    fn test_ghost_out_of_range() {
        let map = OwnershipMap::uniform(4, 2);
        assert!(Ghosts::new(&map, 0, &[4]).is_err());
    }

    #[test]
    fn test_serial_pattern_is_empty() {
        let map = OwnershipMap::uniform(5, 1);
        let ghosts = Ghosts::new(&map, 0, &[1, 2]).unwrap();
        assert!(ghosts.is_empty());
        let pattern = ExchangePattern::new(&SerialComm, &map, &ghosts).unwrap();
        assert!(pattern.neighbours().is_empty());
        assert!(pattern.send_slots().is_empty());
    }

    #[test]
    fn test_exchange_three_partitions() {
        let map = OwnershipMap::uniform(9, 3);
        let results = ThreadComm::run(3, |comm| {
            let rank = comm.rank();
            // Every partition references the first offset of the next partition.
            let ghosts = Ghosts::new(&map, rank, &[(3 * rank + 3) % 9]).unwrap();
            let pattern = ExchangePattern::new(comm, &map, &ghosts).unwrap();
            let owned = map
                .owned_offsets(rank)
                .iter()
                .map(|&o| 10 * o as i64)
                .collect_vec();
            let mut ghost_values = vec![0i64; ghosts.len()];
            pattern.exchange(comm, &owned, &mut ghost_values).unwrap();
            (pattern, ghost_values)
        });
        assert_eq!(results[0].1, vec![30]);
        assert_eq!(results[1].1, vec![60]);
        assert_eq!(results[2].1, vec![0]);
        assert_eq!(results[0].0.ghost_ownership(), &[Ownership::Ghost(1, 0)]);
        assert_eq!(results[2].0.send_slots(), &[0]);
        assert_eq!(results[1].0.neighbours(), vec![0, 2]);
    }

    #[test]
    fn test_accumulate() {
        let map = OwnershipMap::uniform(4, 2);
        let results = ThreadComm::run(2, |comm| {
            let rank = comm.rank();
            let ghosts = Ghosts::new(&map, rank, &[1, 2]).unwrap();
            let pattern = ExchangePattern::new(comm, &map, &ghosts).unwrap();
            let mut owned = vec![1.0; 2];
            pattern.accumulate(comm, &[0.5], &mut owned).unwrap();
            owned
        });
        assert_eq!(results[0], vec![1.0, 1.5]);
        assert_eq!(results[1], vec![1.5, 1.0]);
    }

    #[test]
    fn test_exchange_length_mismatch() {
        let map = OwnershipMap::from_owners(vec![0, 1], 2).unwrap();
        let results = ThreadComm::run(2, |comm| {
            let ghosts = Ghosts::new(&map, comm.rank(), &[0, 1]).unwrap();
            let pattern = ExchangePattern::new(comm, &map, &ghosts).unwrap();
            let mut owned = vec![1.0];
            let mut ghost_values = vec![0.0; 2];
            (
                pattern.exchange(comm, &owned, &mut ghost_values),
                pattern.exchange(comm, &[1.0, 2.0], &mut [0.0]),
                pattern.accumulate(comm, &[0.5, 0.5], &mut owned),
            )
        });
        for (correct, wrong_owned, wrong_ghosts) in results {
            assert_eq!(correct, Ok(()));
            assert_eq!(
                wrong_owned,
                Err(Error::LengthMismatch {
                    expected: 1,
                    actual: 2
                })
            );
            assert_eq!(
                wrong_ghosts,
                Err(Error::LengthMismatch {
                    expected: 1,
                    actual: 2
                })
            );
        }
    }
}
