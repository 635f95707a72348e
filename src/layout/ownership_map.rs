//! Ownership maps
#[cfg(feature = "serde")]
use crate::traits::ConvertToSerializable;
use crate::types::{Error, Partitioner, Result};
use itertools::Itertools;
use tracing::debug;

#[derive(Debug, Clone)]
enum Assignment {
    // Partition `p` owns `bounds[p]..bounds[p + 1]`.
    Blocks { bounds: Vec<usize> },
    // Arbitrary owners. `slots[o]` is the local slot of offset `o` on its owner and
    // `owned[p]` lists the offsets owned by `p` in ascending order.
    Scattered {
        owners: Vec<usize>,
        slots: Vec<usize>,
        owned: Vec<Vec<usize>>,
    },
}

/// Assignment of global offsets to partitions
///
/// Every offset in `0..total_size` has exactly one owning partition. The offsets owned by a
/// partition are numbered by dense local slots in ascending offset order. The map is global: every
/// partition holds the same map and can answer questions about every other partition.
#[derive(Debug, Clone)]
pub struct OwnershipMap {
    total_size: usize,
    partition_count: usize,
    assignment: Assignment,
}

impl OwnershipMap {
    /// Split `0..total_size` into `partition_count` contiguous blocks
    ///
    /// Block sizes differ by at most one element.
    ///
    /// # Panics
    /// Panics if `partition_count` is zero.
    pub fn uniform(total_size: usize, partition_count: usize) -> Self {
        assert!(partition_count > 0, "An ownership map needs a partition");
        // Partition i ends at total * (i + 1) / P.
        let bounds = (0..=partition_count)
            .map(|i| total_size * i / partition_count)
            .collect_vec();
        debug!(total_size, partition_count, "uniform ownership map");
        Self {
            total_size,
            partition_count,
            assignment: Assignment::Blocks { bounds },
        }
    }

    /// Create a map from the owner of every offset
    pub fn from_owners(owners: Vec<usize>, partition_count: usize) -> Result<Self> {
        check_partition_count(partition_count)?;
        if let Some(&owner) = owners.iter().find(|&&o| o >= partition_count) {
            return Err(Error::IndexOutOfBounds {
                index: owner,
                size: partition_count,
            });
        }
        let mut owned = vec![vec![]; partition_count];
        let mut slots = Vec::with_capacity(owners.len());
        for (offset, &owner) in owners.iter().enumerate() {
            slots.push(owned[owner].len());
            owned[owner].push(offset);
        }
        debug!(
            total_size = owners.len(),
            partition_count, "manual ownership map"
        );
        Ok(Self {
            total_size: owners.len(),
            partition_count,
            assignment: Assignment::Scattered {
                owners,
                slots,
                owned,
            },
        })
    }

    /// Create a map from a function returning the owner of an offset
    pub fn from_fn(
        total_size: usize,
        partition_count: usize,
        owner: impl Fn(usize) -> usize,
    ) -> Result<Self> {
        Self::from_owners((0..total_size).map(owner).collect(), partition_count)
    }

    /// Create a map using a partitioning policy
    pub fn from_partitioner(
        total_size: usize,
        partition_count: usize,
        partitioner: Partitioner,
    ) -> Result<Self> {
        check_partition_count(partition_count)?;
        match partitioner {
            Partitioner::Uniform => Ok(Self::uniform(total_size, partition_count)),
            Partitioner::Manual(owners) => {
                if owners.len() != total_size {
                    return Err(Error::LengthMismatch {
                        expected: total_size,
                        actual: owners.len(),
                    });
                }
                Self::from_owners(owners, partition_count)
            }
        }
    }

    /// The policy that reproduces this map
    pub fn partitioner(&self) -> Partitioner {
        match &self.assignment {
            Assignment::Blocks { .. } => Partitioner::Uniform,
            Assignment::Scattered { owners, .. } => Partitioner::Manual(owners.clone()),
        }
    }

    /// Number of global offsets
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Number of partitions
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Partition owning a global offset
    pub fn owner_of(&self, offset: usize) -> Result<usize> {
        self.check_offset(offset)?;
        Ok(match &self.assignment {
            Assignment::Blocks { bounds } => bounds.partition_point(|&b| b <= offset) - 1,
            Assignment::Scattered { owners, .. } => owners[offset],
        })
    }

    /// Does `partition` own `offset`?
    pub fn is_owned(&self, offset: usize, partition: usize) -> bool {
        self.owner_of(offset) == Ok(partition)
    }

    /// Local slot of a global offset on the partition `partition`
    pub fn local_slot(&self, offset: usize, partition: usize) -> Result<usize> {
        if !self.is_owned(offset, partition) {
            self.check_offset(offset)?;
            return Err(Error::NotOwned { offset, partition });
        }
        Ok(match &self.assignment {
            Assignment::Blocks { bounds } => offset - bounds[partition],
            Assignment::Scattered { slots, .. } => slots[offset],
        })
    }

    /// Global offset of a local slot on the partition `partition`
    pub fn global_offset(&self, partition: usize, slot: usize) -> Result<usize> {
        let count = self.owned_count(partition);
        if slot >= count {
            return Err(Error::IndexOutOfBounds {
                index: slot,
                size: count,
            });
        }
        Ok(match &self.assignment {
            Assignment::Blocks { bounds } => bounds[partition] + slot,
            Assignment::Scattered { owned, .. } => owned[partition][slot],
        })
    }

    /// Number of offsets owned by a partition
    pub fn owned_count(&self, partition: usize) -> usize {
        if partition >= self.partition_count {
            return 0;
        }
        match &self.assignment {
            Assignment::Blocks { bounds } => bounds[partition + 1] - bounds[partition],
            Assignment::Scattered { owned, .. } => owned[partition].len(),
        }
    }

    /// Offsets owned by a partition, in ascending order
    pub fn owned_offsets(&self, partition: usize) -> Vec<usize> {
        if partition >= self.partition_count {
            return vec![];
        }
        match &self.assignment {
            Assignment::Blocks { bounds } => (bounds[partition]..bounds[partition + 1]).collect(),
            Assignment::Scattered { owned, .. } => owned[partition].clone(),
        }
    }

    fn check_offset(&self, offset: usize) -> Result<()> {
        if offset >= self.total_size {
            Err(Error::IndexOutOfBounds {
                index: offset,
                size: self.total_size,
            })
        } else {
            Ok(())
        }
    }
}

fn check_partition_count(partition_count: usize) -> Result<()> {
    if partition_count == 0 {
        Err(Error::PartitionCountMismatch {
            expected: 1,
            actual: 0,
        })
    } else {
        Ok(())
    }
}

impl PartialEq for OwnershipMap {
    // Two maps are equal if they assign every offset to the same partition, however they were built.
    fn eq(&self, other: &Self) -> bool {
        if self.total_size != other.total_size || self.partition_count != other.partition_count {
            return false;
        }
        match (&self.assignment, &other.assignment) {
            (Assignment::Blocks { bounds: a }, Assignment::Blocks { bounds: b }) => a == b,
            _ => (0..self.total_size).all(|o| self.owner_of(o) == other.owner_of(o)),
        }
    }
}

impl Eq for OwnershipMap {}

/// Serializable form of an [`OwnershipMap`]
#[cfg(feature = "serde")]
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SerializableOwnershipMap {
    total_size: usize,
    partition_count: usize,
    partitioner: Partitioner,
}

#[cfg(feature = "serde")]
impl ConvertToSerializable for OwnershipMap {
    type SerializableType = SerializableOwnershipMap;
    fn to_serializable(&self) -> SerializableOwnershipMap {
        SerializableOwnershipMap {
            total_size: self.total_size,
            partition_count: self.partition_count,
            partitioner: self.partitioner(),
        }
    }
    fn from_serializable(data: SerializableOwnershipMap) -> Result<Self> {
        Self::from_partitioner(data.total_size, data.partition_count, data.partitioner)
    }
}
