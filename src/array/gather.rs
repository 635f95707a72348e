//! Gathering values from all partitions
use super::DistributedArray;
use crate::{
    traits::Comm,
    types::{Element, Error, Result},
};
use itertools::izip;
use tracing::trace;

// Marks padding entries that carry no value.
const SENTINEL: usize = usize::MAX;

impl<T: Element, C: Comm> DistributedArray<'_, T, C> {
    /// Values at the global offsets `ids`, in request order, on every partition
    ///
    /// Every partition must call this with the same `ids`. Invalid ids are reported before any
    /// communication takes place. This is a collective operation.
    pub fn gather(&self, ids: &[usize]) -> Result<Vec<T>> {
        let (positions, values) = self.padded_contributions(ids)?;
        let all_positions = self.comm.all_gather(&positions);
        let all_values = self.comm.all_gather(&values);
        Ok(merge_contributions(ids.len(), &all_positions, &all_values))
    }

    /// Values at the global offsets `ids`, in request order, on the partition `root` only
    ///
    /// Returns `None` on every other partition. This is a collective operation.
    pub fn gather_to(&self, ids: &[usize], root: usize) -> Result<Option<Vec<T>>> {
        if root >= self.comm.size() {
            return Err(Error::IndexOutOfBounds {
                index: root,
                size: self.comm.size(),
            });
        }
        let (positions, values) = self.padded_contributions(ids)?;
        let all_positions = self.comm.gather(root, &positions);
        let all_values = self.comm.gather(root, &values);
        Ok(all_positions
            .zip(all_values)
            .map(|(p, v)| merge_contributions(ids.len(), &p, &v)))
    }

    /// Every value of the global array in offset order, on every partition
    ///
    /// This is a collective operation.
    pub fn gather_all(&self) -> Vec<T> {
        let (positions, values): (Vec<_>, Vec<_>) = self
            .owned_offsets()
            .into_iter()
            .zip(self.owned_values().iter().copied())
            .unzip();
        let count = positions.len();
        let max_count = self.comm.all_reduce_max(count);
        let positions = pad(positions, max_count, SENTINEL);
        let values = pad(values, max_count, T::zero());
        let all_positions = self.comm.all_gather(&positions);
        let all_values = self.comm.all_gather(&values);
        merge_contributions(self.total_size(), &all_positions, &all_values)
    }

    // The (request position, value) pairs this partition owns, padded with sentinels to the
    // longest contribution of any partition so that every partition sends the same amount.
    fn padded_contributions(&self, ids: &[usize]) -> Result<(Vec<usize>, Vec<T>)> {
        let rank = self.comm.rank();
        let mut positions = vec![];
        let mut values = vec![];
        for (position, &id) in ids.iter().enumerate() {
            match self.map.local_slot(id, rank) {
                Ok(slot) => {
                    positions.push(position);
                    values.push(self.values[slot]);
                }
                Err(Error::NotOwned { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let max_count = self.comm.all_reduce_max(positions.len());
        trace!(
            rank,
            contributed = positions.len(),
            max_count,
            "gather contributions"
        );
        Ok((
            pad(positions, max_count, SENTINEL),
            pad(values, max_count, T::zero()),
        ))
    }
}

fn pad<V: Copy>(mut data: Vec<V>, len: usize, value: V) -> Vec<V> {
    data.resize(len, value);
    data
}

// Place the received values at their request positions, dropping the padding.
fn merge_contributions<T: Element>(len: usize, positions: &[usize], values: &[T]) -> Vec<T> {
    let mut result = vec![T::zero(); len];
    for (&position, &value) in izip!(positions, values).filter(|&(&p, _)| p != SENTINEL) {
        result[position] = value;
    }
    result
}
