//! Single partition communicator
use crate::{
    traits::Comm,
    types::{Element, Transferable},
};

/// Communicator of a layout with a single partition
///
/// Every collective returns the local contribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Comm for SerialComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn barrier(&self) {}
    fn all_reduce_sum<T: Element>(&self, local: T) -> T {
        local
    }
    fn all_reduce_max(&self, local: usize) -> usize {
        local
    }
    fn all_gather<T: Transferable>(&self, local: &[T]) -> Vec<T> {
        local.to_vec()
    }
    fn gather<T: Transferable>(&self, _root: usize, local: &[T]) -> Option<Vec<T>> {
        Some(local.to_vec())
    }
    fn all_to_all_varcount<T: Transferable>(
        &self,
        counts: &[usize],
        data: &[T],
    ) -> (Vec<usize>, Vec<T>) {
        (counts.to_vec(), data.to_vec())
    }
}
