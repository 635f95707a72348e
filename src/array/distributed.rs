//! Distributed array
use crate::{
    layout::{ExchangePattern, Ghosts, OwnershipMap, ShapeTranslator},
    traits::Comm,
    types::{Element, ElementKind, Error, Ownership, Result},
};
use itertools::Itertools;
use std::{cell::OnceCell, fmt, rc::Rc};
use tracing::{debug, trace};

/// Numeric array partitioned over the partitions of a communicator
///
/// The local buffer holds the values of the offsets owned by this partition, in local slot order,
/// followed by the ghost slots. The shape translator and the ownership map are shared with every
/// array of the same layout, including the arrays derived from this one.
#[derive(Debug)]
pub struct DistributedArray<'a, T: Element, C: Comm> {
    pub(super) comm: &'a C,
    pub(super) translator: Rc<ShapeTranslator>,
    pub(super) map: Rc<OwnershipMap>,
    pub(super) ghosts: Rc<Ghosts>,
    pub(super) exchange: OnceCell<Rc<ExchangePattern>>,
    pub(super) owned_count: usize,
    pub(super) values: Vec<T>,
}

impl<'a, T: Element, C: Comm> DistributedArray<'a, T, C> {
    /// Create a zero initialised array without ghost slots
    pub fn new(
        comm: &'a C,
        translator: Rc<ShapeTranslator>,
        map: Rc<OwnershipMap>,
    ) -> Result<Self> {
        Self::with_ghosts(comm, translator, map, &[])
    }

    /// Create a zero initialised array with ghost slots for the given global offsets
    pub fn with_ghosts(
        comm: &'a C,
        translator: Rc<ShapeTranslator>,
        map: Rc<OwnershipMap>,
        ghost_offsets: &[usize],
    ) -> Result<Self> {
        if map.total_size() != translator.total_size() {
            return Err(Error::ShapeMismatch {
                expected: translator.total_size(),
                actual: map.total_size(),
            });
        }
        if map.partition_count() != comm.size() {
            return Err(Error::PartitionCountMismatch {
                expected: map.partition_count(),
                actual: comm.size(),
            });
        }
        let ghosts = Rc::new(Ghosts::new(&map, comm.rank(), ghost_offsets)?);
        let owned_count = map.owned_count(comm.rank());
        debug!(
            rank = comm.rank(),
            owned = owned_count,
            ghosts = ghosts.len(),
            kind = ?T::KIND,
            "created distributed array"
        );
        Ok(Self {
            comm,
            translator,
            map,
            exchange: OnceCell::new(),
            owned_count,
            values: vec![T::zero(); owned_count + ghosts.len()],
            ghosts,
        })
    }

    /// Create a zero initialised array with a uniform partition over all partitions of `comm`
    pub fn from_dims(comm: &'a C, dims: &[usize]) -> Result<Self> {
        let translator = ShapeTranslator::new(dims)?;
        let map = OwnershipMap::uniform(translator.total_size(), comm.size());
        Self::new(comm, Rc::new(translator), Rc::new(map))
    }

    /// Create an array from values given for every global offset
    ///
    /// Each partition copies the values of the offsets it owns.
    pub fn from_global_slice(
        comm: &'a C,
        translator: Rc<ShapeTranslator>,
        map: Rc<OwnershipMap>,
        values: &[T],
    ) -> Result<Self> {
        if values.len() != translator.total_size() {
            return Err(Error::LengthMismatch {
                expected: translator.total_size(),
                actual: values.len(),
            });
        }
        let mut array = Self::new(comm, translator, map)?;
        for (slot, offset) in array.owned_offsets().into_iter().enumerate() {
            array.values[slot] = values[offset];
        }
        Ok(array)
    }

    /// A zero initialised array with the same layout, ghost slots and exchange pattern
    pub fn zeros_like<U: Element>(&self) -> DistributedArray<'a, U, C> {
        self.derive(vec![U::zero(); self.values.len()])
    }

    // New array on the same layout holding the given local buffer.
    pub(super) fn derive<U: Element>(&self, values: Vec<U>) -> DistributedArray<'a, U, C> {
        debug_assert_eq!(values.len(), self.values.len());
        DistributedArray {
            comm: self.comm,
            translator: self.translator.clone(),
            map: self.map.clone(),
            ghosts: self.ghosts.clone(),
            exchange: self.exchange.clone(),
            owned_count: self.owned_count,
            values,
        }
    }

    /// The communicator
    pub fn comm(&self) -> &'a C {
        self.comm
    }

    /// The shape translator
    pub fn translator(&self) -> &Rc<ShapeTranslator> {
        &self.translator
    }

    /// The ownership map
    pub fn ownership_map(&self) -> &Rc<OwnershipMap> {
        &self.map
    }

    /// The ghost slots
    pub fn ghosts(&self) -> &Rc<Ghosts> {
        &self.ghosts
    }

    /// Kind of the stored values
    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    /// Global logical shape
    pub fn shape(&self) -> &[usize] {
        self.translator.dims()
    }

    /// Number of dimensions of the global logical shape
    pub fn rank(&self) -> usize {
        self.translator.rank()
    }

    /// Number of elements of the global array
    pub fn total_size(&self) -> usize {
        self.translator.total_size()
    }

    /// Local buffer: owned values followed by ghost values
    pub fn local_values(&self) -> &[T] {
        &self.values
    }

    /// Mutable local buffer
    pub fn local_values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Values of the owned offsets, in local slot order
    pub fn owned_values(&self) -> &[T] {
        &self.values[..self.owned_count]
    }

    /// Mutable values of the owned offsets
    pub fn owned_values_mut(&mut self) -> &mut [T] {
        &mut self.values[..self.owned_count]
    }

    /// Values of the ghost slots
    pub fn ghost_values(&self) -> &[T] {
        &self.values[self.owned_count..]
    }

    /// Global offsets of the owned slots
    pub fn owned_offsets(&self) -> Vec<usize> {
        self.map.owned_offsets(self.comm.rank())
    }

    /// Global offsets of the ghost slots
    pub fn ghost_offsets(&self) -> &[usize] {
        self.ghosts.offsets()
    }

    /// Number of owned slots
    pub fn owned_count(&self) -> usize {
        self.owned_count
    }

    /// Ownership of a local slot, or `None` if the slot does not exist
    pub fn ownership(&self, slot: usize) -> Option<Ownership> {
        if slot < self.owned_count {
            Some(Ownership::Owned)
        } else if slot < self.values.len() {
            let g = slot - self.owned_count;
            let owner = self.ghosts.owners()[g];
            self.map
                .local_slot(self.ghosts.offsets()[g], owner)
                .ok()
                .map(|remote_slot| Ownership::Ghost(owner, remote_slot))
        } else {
            None
        }
    }

    /// Global offset stored in a local slot
    pub fn offset_of_slot(&self, slot: usize) -> Result<usize> {
        if slot < self.owned_count {
            self.map.global_offset(self.comm.rank(), slot)
        } else {
            self.ghosts
                .offsets()
                .get(slot - self.owned_count)
                .copied()
                .ok_or(Error::IndexOutOfBounds {
                    index: slot,
                    size: self.values.len(),
                })
        }
    }

    /// Local slot of a global offset, owned or ghost
    pub fn slot_of_offset(&self, offset: usize) -> Option<usize> {
        self.map
            .local_slot(offset, self.comm.rank())
            .ok()
            .or_else(|| self.ghosts.slot(offset).map(|g| self.owned_count + g))
    }

    /// Do two arrays have the same shape, ownership map and ghost slots?
    pub fn layout_matches<U: Element>(&self, other: &DistributedArray<'a, U, C>) -> bool {
        self.partition_layout_matches(other)
            && (Rc::ptr_eq(&self.ghosts, &other.ghosts) || self.ghosts == other.ghosts)
    }

    // Same shape and ownership map, ghosts not considered.
    pub(super) fn partition_layout_matches<U: Element>(
        &self,
        other: &DistributedArray<'a, U, C>,
    ) -> bool {
        (Rc::ptr_eq(&self.translator, &other.translator) || self.translator == other.translator)
            && (Rc::ptr_eq(&self.map, &other.map) || self.map == other.map)
    }

    /// Set every owned and ghost slot to a value
    pub fn fill(&mut self, value: T) {
        self.values.fill(value);
    }

    /// Write values at global offsets
    ///
    /// Offsets that are not owned by this partition are skipped: every partition writes only what
    /// it owns. A single value is written to all offsets. Nothing is written if an offset is out of
    /// range or the number of values does not match.
    pub fn set(&mut self, ids: &[usize], values: &[T]) -> Result<()> {
        if values.len() != 1 && values.len() != ids.len() {
            return Err(Error::LengthMismatch {
                expected: ids.len(),
                actual: values.len(),
            });
        }
        if let Some(&id) = ids.iter().find(|&&id| id >= self.total_size()) {
            return Err(Error::IndexOutOfBounds {
                index: id,
                size: self.total_size(),
            });
        }
        let rank = self.comm.rank();
        let mut dropped = 0;
        for (i, &id) in ids.iter().enumerate() {
            match self.map.local_slot(id, rank) {
                Ok(slot) => self.values[slot] = values[if values.len() == 1 { 0 } else { i }],
                Err(_) => dropped += 1,
            }
        }
        if dropped > 0 {
            trace!(rank, dropped, "skipped writes to offsets owned elsewhere");
        }
        Ok(())
    }

    /// Values at the locally owned global offsets among `ids`, in request order
    ///
    /// Offsets owned by other partitions are skipped, so the result can be shorter than `ids`.
    /// Use [`DistributedArray::gather`] to collect values from all partitions.
    pub fn get(&self, ids: &[usize]) -> Result<Vec<T>> {
        let rank = self.comm.rank();
        let mut result = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.map.local_slot(id, rank) {
                Ok(slot) => result.push(self.values[slot]),
                Err(Error::NotOwned { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// Write a value at a multi-dimensional global index
    ///
    /// Returns `false` if the index is owned by another partition and nothing was written.
    pub fn set_at(&mut self, index: &[usize], value: T) -> Result<bool> {
        let offset = self.translator.linearize(index)?;
        match self.map.local_slot(offset, self.comm.rank()) {
            Ok(slot) => {
                self.values[slot] = value;
                Ok(true)
            }
            Err(Error::NotOwned { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Value at a multi-dimensional global index, if it is owned or a ghost on this partition
    pub fn get_at(&self, index: &[usize]) -> Result<Option<T>> {
        let offset = self.translator.linearize(index)?;
        Ok(self.slot_of_offset(offset).map(|slot| self.values[slot]))
    }

    /// Change the logical shape, keeping the total size
    ///
    /// The array gets its own reshaped translator; arrays sharing the previous translator are not
    /// affected. The ownership map and the stored values do not change.
    pub fn reshape(&mut self, dims: &[usize]) -> Result<()> {
        let translator = self.translator.reshaped(dims)?;
        self.translator = Rc::new(translator);
        Ok(())
    }

    /// The exchange pattern filling the ghost slots
    ///
    /// Built on first use and cached. The first call is a collective operation.
    pub fn exchange_pattern(&self) -> Result<Rc<ExchangePattern>> {
        if let Some(pattern) = self.exchange.get() {
            return Ok(pattern.clone());
        }
        let pattern = Rc::new(ExchangePattern::new(self.comm, &self.map, &self.ghosts)?);
        let _ = self.exchange.set(pattern.clone());
        Ok(pattern)
    }

    /// Copy the current owned values of other partitions into the ghost slots
    ///
    /// This is a collective operation.
    pub fn update_ghosts(&mut self) -> Result<()> {
        let pattern = self.exchange_pattern()?;
        let (owned, ghosts) = self.values.split_at_mut(self.owned_count);
        pattern.exchange(self.comm, owned, ghosts)
    }

    /// Add the values in the ghost slots to the owned values on their owning partitions
    ///
    /// Used when contributions to non-owned offsets are assembled locally. Ghost slots keep their
    /// values. This is a collective operation.
    pub fn accumulate_ghosts(&mut self) -> Result<()> {
        let pattern = self.exchange_pattern()?;
        let (owned, ghosts) = self.values.split_at_mut(self.owned_count);
        pattern.accumulate(self.comm, ghosts, owned)
    }
}

impl<T: Element, C: Comm> Clone for DistributedArray<'_, T, C> {
    fn clone(&self) -> Self {
        self.derive(self.values.clone())
    }
}

impl<T: Element, C: Comm> fmt::Display for DistributedArray<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DistributedArray(partition {}/{}, shape {:?}, [{}])",
            self.comm.rank(),
            self.comm.size(),
            self.shape(),
            self.owned_values().iter().join(", ")
        )
    }
}
