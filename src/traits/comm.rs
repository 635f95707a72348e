//! Communicators
use crate::types::{Element, Transferable};

pub trait Comm {
    //! Communicator connecting the partitions of a distributed layout
    //!
    //! Every method apart from [`Comm::rank`] and [`Comm::size`] is a collective operation: all
    //! partitions have to call it, in the same order, before any of them returns. A partition that
    //! skips a collective leaves its peers blocked.

    /// Index of the calling partition
    fn rank(&self) -> usize;

    /// Number of partitions
    fn size(&self) -> usize;

    /// Block until every partition has reached the barrier
    fn barrier(&self);

    /// Sum of a value over all partitions
    fn all_reduce_sum<T: Element>(&self, local: T) -> T;

    /// Maximum of a value over all partitions
    fn all_reduce_max(&self, local: usize) -> usize;

    /// Logical and of a flag over all partitions
    fn all_reduce_and(&self, local: bool) -> bool {
        self.all_reduce_max(usize::from(!local)) == 0
    }

    /// Concatenate equally sized contributions of all partitions in rank order
    fn all_gather<T: Transferable>(&self, local: &[T]) -> Vec<T>;

    /// Concatenate equally sized contributions of all partitions in rank order on `root`
    ///
    /// Returns `None` on every other partition.
    fn gather<T: Transferable>(&self, root: usize, local: &[T]) -> Option<Vec<T>>;

    /// All-to-all exchange of variable length data
    ///
    /// `data` holds the values sent to each partition one after another, `counts[p]` of them for
    /// partition `p`. Returns the number of values received from each partition and the received
    /// values ordered by source partition.
    fn all_to_all_varcount<T: Transferable>(
        &self,
        counts: &[usize],
        data: &[T],
    ) -> (Vec<usize>, Vec<T>);
}
