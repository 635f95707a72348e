//! Row distributed sparse matrix
use crate::{
    array::DistributedArray,
    layout::{ExchangePattern, Ghosts, OwnershipMap, ShapeTranslator},
    traits::Comm,
    types::{Element, Error, Result},
};
use itertools::{izip, Itertools};
use std::{cell::OnceCell, rc::Rc};
use tracing::debug;

/// Sparse matrix whose rows are distributed according to an ownership map
///
/// Every partition stores its owned rows in compressed row form. Columns are global offsets of the
/// column ownership map; the columns owned by other partitions are the ghosts of the vectors the
/// matrix is applied to.
#[derive(Debug)]
pub struct DistributedMatrix<'a, T: Element, C: Comm> {
    comm: &'a C,
    row_map: Rc<OwnershipMap>,
    column_map: Rc<OwnershipMap>,
    row_translator: Rc<ShapeTranslator>,
    column_ghosts: Rc<Ghosts>,
    exchange: OnceCell<Rc<ExchangePattern>>,
    row_offsets: Vec<usize>,
    columns: Vec<usize>,
    local_columns: Vec<usize>,
    values: Vec<T>,
}

impl<'a, T: Element, C: Comm> DistributedMatrix<'a, T, C> {
    /// Create a matrix from (row, column, value) triplets
    ///
    /// Every partition may pass any triplets: entries of rows owned elsewhere are dropped and
    /// repeated entries are summed.
    pub fn from_triplets(
        comm: &'a C,
        row_map: Rc<OwnershipMap>,
        column_map: Rc<OwnershipMap>,
        rows: &[usize],
        columns: &[usize],
        values: &[T],
    ) -> Result<Self> {
        if columns.len() != rows.len() || values.len() != rows.len() {
            return Err(Error::LengthMismatch {
                expected: rows.len(),
                actual: if columns.len() != rows.len() {
                    columns.len()
                } else {
                    values.len()
                },
            });
        }
        for map in [&row_map, &column_map] {
            if map.partition_count() != comm.size() {
                return Err(Error::PartitionCountMismatch {
                    expected: map.partition_count(),
                    actual: comm.size(),
                });
            }
        }
        if let Some(&c) = columns.iter().find(|&&c| c >= column_map.total_size()) {
            return Err(Error::IndexOutOfBounds {
                index: c,
                size: column_map.total_size(),
            });
        }

        let rank = comm.rank();
        let mut entries = vec![];
        for (&row, &column, &value) in izip!(rows, columns, values) {
            match row_map.local_slot(row, rank) {
                Ok(slot) => entries.push((slot, column, value)),
                Err(Error::NotOwned { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let entries = entries
            .into_iter()
            .sorted_by_key(|&(slot, column, _)| (slot, column))
            .coalesce(|a, b| {
                if (a.0, a.1) == (b.0, b.1) {
                    Ok((a.0, a.1, a.2.elem_add(b.2)))
                } else {
                    Err((a, b))
                }
            })
            .collect_vec();

        let owned_rows = row_map.owned_count(rank);
        let mut row_offsets = vec![0; owned_rows + 1];
        for &(slot, _, _) in &entries {
            row_offsets[slot + 1] += 1;
        }
        for i in 0..owned_rows {
            row_offsets[i + 1] += row_offsets[i];
        }

        let columns = entries.iter().map(|&(_, c, _)| c).collect_vec();
        let values = entries.iter().map(|&(_, _, v)| v).collect_vec();
        let column_ghosts = Ghosts::new(&column_map, rank, &columns)?;
        let owned_columns = column_map.owned_count(rank);
        let local_columns = columns
            .iter()
            .map(|&c| match column_ghosts.slot(c) {
                Some(g) => Ok(owned_columns + g),
                None => column_map.local_slot(c, rank),
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            rank,
            rows = owned_rows,
            entries = values.len(),
            ghost_columns = column_ghosts.len(),
            "assembled distributed matrix"
        );

        Ok(Self {
            comm,
            row_translator: Rc::new(ShapeTranslator::new(&[row_map.total_size()])?),
            row_map,
            column_map,
            column_ghosts: Rc::new(column_ghosts),
            exchange: OnceCell::new(),
            row_offsets,
            columns,
            local_columns,
            values,
        })
    }

    /// The communicator
    pub fn comm(&self) -> &'a C {
        self.comm
    }

    /// Ownership of the rows
    pub fn row_map(&self) -> &Rc<OwnershipMap> {
        &self.row_map
    }

    /// Ownership of the columns, and of the vectors the matrix is applied to
    pub fn column_map(&self) -> &Rc<OwnershipMap> {
        &self.column_map
    }

    /// Number of global rows
    pub fn row_count(&self) -> usize {
        self.row_map.total_size()
    }

    /// Number of global columns
    pub fn column_count(&self) -> usize {
        self.column_map.total_size()
    }

    /// Number of stored entries on this partition
    pub fn local_entry_count(&self) -> usize {
        self.values.len()
    }

    /// Columns owned by other partitions that appear in the owned rows
    pub fn column_ghosts(&self) -> &Rc<Ghosts> {
        &self.column_ghosts
    }

    /// Global columns and values of an owned row, identified by its local slot
    pub fn row(&self, slot: usize) -> Option<(&[usize], &[T])> {
        let (&start, &end) = (self.row_offsets.get(slot)?, self.row_offsets.get(slot + 1)?);
        Some((&self.columns[start..end], &self.values[start..end]))
    }

    /// The exchange pattern filling the ghost columns of a vector
    ///
    /// Built on first use and cached. The first call is a collective operation.
    pub fn exchange_pattern(&self) -> Result<Rc<ExchangePattern>> {
        if let Some(pattern) = self.exchange.get() {
            return Ok(pattern.clone());
        }
        let pattern = Rc::new(ExchangePattern::new(
            self.comm,
            &self.column_map,
            &self.column_ghosts,
        )?);
        let _ = self.exchange.set(pattern.clone());
        Ok(pattern)
    }

    /// Compute the owned rows of `A x` into `out`
    ///
    /// `x` must be distributed according to the column map and `out` must have one entry per owned
    /// row. This is a collective operation.
    pub fn apply_into(&self, x: &DistributedArray<'a, T, C>, out: &mut [T]) -> Result<()> {
        let x_map = x.ownership_map();
        if !(Rc::ptr_eq(x_map, &self.column_map) || **x_map == *self.column_map) {
            return Err(Error::LayoutMismatch);
        }
        let owned_rows = self.row_offsets.len() - 1;
        if out.len() != owned_rows {
            return Err(Error::LengthMismatch {
                expected: owned_rows,
                actual: out.len(),
            });
        }

        let pattern = self.exchange_pattern()?;
        let mut local = x.owned_values().to_vec();
        let mut ghosts = vec![T::zero(); self.column_ghosts.len()];
        pattern.exchange(self.comm, x.owned_values(), &mut ghosts)?;
        local.extend(ghosts);

        for (value, (&start, &end)) in izip!(out, self.row_offsets.iter().tuple_windows()) {
            *value = izip!(&self.local_columns[start..end], &self.values[start..end])
                .fold(T::zero(), |acc, (&c, &a)| acc.elem_add(a.elem_mul(local[c])));
        }
        Ok(())
    }

    /// Matrix vector product `A x`, distributed according to the row map
    ///
    /// This is a collective operation.
    pub fn matvec(&self, x: &DistributedArray<'a, T, C>) -> Result<DistributedArray<'a, T, C>> {
        let mut y = DistributedArray::new(
            self.comm,
            self.row_translator.clone(),
            self.row_map.clone(),
        )?;
        self.apply_into(x, y.owned_values_mut())?;
        Ok(y)
    }

    /// Diagonal entries of the owned rows, distributed according to the row map
    pub fn diagonal(&self) -> Result<DistributedArray<'a, T, C>> {
        let mut d = DistributedArray::new(
            self.comm,
            self.row_translator.clone(),
            self.row_map.clone(),
        )?;
        let rank = self.comm.rank();
        for (slot, value) in d.owned_values_mut().iter_mut().enumerate() {
            let row = self.row_map.global_offset(rank, slot)?;
            let (start, end) = (self.row_offsets[slot], self.row_offsets[slot + 1]);
            if let Ok(i) = self.columns[start..end].binary_search(&row) {
                *value = self.values[start + i];
            }
        }
        Ok(d)
    }
}
