//! MPI communicator
use crate::{
    traits::Comm,
    types::{Element, Transferable},
};
use itertools::Itertools;
use mpi::{
    collective::SystemOperation,
    datatype::{Partition, PartitionMut},
    traits::{Communicator, CommunicatorCollectives, Root},
};

/// Communicator backed by an MPI communicator, one partition per MPI rank
#[derive(Debug)]
pub struct MpiComm<'a, C: Communicator> {
    comm: &'a C,
}

impl<'a, C: Communicator> MpiComm<'a, C> {
    /// Create new
    pub fn new(comm: &'a C) -> Self {
        Self { comm }
    }

    /// The underlying MPI communicator
    pub fn mpi_comm(&self) -> &C {
        self.comm
    }
}

impl<C: Communicator> Comm for MpiComm<'_, C> {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    fn size(&self) -> usize {
        self.comm.size() as usize
    }

    fn barrier(&self) {
        self.comm.barrier();
    }

    fn all_reduce_sum<T: Element>(&self, local: T) -> T {
        let mut global = T::zero();
        self.comm
            .all_reduce_into(&local, &mut global, SystemOperation::sum());
        global
    }

    fn all_reduce_max(&self, local: usize) -> usize {
        let mut global = 0;
        self.comm
            .all_reduce_into(&local, &mut global, SystemOperation::max());
        global
    }

    fn all_gather<T: Transferable>(&self, local: &[T]) -> Vec<T> {
        let total = local.len() * self.size();
        let mut recvbuf = Vec::<T>::with_capacity(total);
        // This avoids having to pre-initialise the array. We transmute the spare capacity
        // into a valid reference and later set the length of the array to the full capacity.
        let recvbuf_ref: &mut [T] = unsafe { std::mem::transmute(recvbuf.spare_capacity_mut()) };
        self.comm.all_gather_into(local, &mut recvbuf_ref[..total]);
        unsafe { recvbuf.set_len(total) };
        recvbuf
    }

    fn gather<T: Transferable>(&self, root: usize, local: &[T]) -> Option<Vec<T>> {
        let root_process = self.comm.process_at_rank(root as i32);
        if self.rank() == root {
            let total = local.len() * self.size();
            let mut recvbuf = Vec::<T>::with_capacity(total);
            let recvbuf_ref: &mut [T] =
                unsafe { std::mem::transmute(recvbuf.spare_capacity_mut()) };
            root_process.gather_into_root(local, &mut recvbuf_ref[..total]);
            unsafe { recvbuf.set_len(total) };
            Some(recvbuf)
        } else {
            root_process.gather_into(local);
            None
        }
    }

    fn all_to_all_varcount<T: Transferable>(
        &self,
        counts: &[usize],
        data: &[T],
    ) -> (Vec<usize>, Vec<T>) {
        // MPI counts and displacements are i32.
        let counts = counts.iter().map(|&x| x as i32).collect_vec();

        let mut recv_counts = vec![0; self.size()];
        self.comm.all_to_all_into(&counts[..], &mut recv_counts[..]);

        let total = recv_counts.iter().sum::<i32>() as usize;
        let mut receive_data = Vec::<T>::with_capacity(total);
        let receive_buf: &mut [T] =
            unsafe { std::mem::transmute(receive_data.spare_capacity_mut()) };

        let send_displacements = exclusive_prefix_sum(&counts);
        let receive_displacements = exclusive_prefix_sum(&recv_counts);

        let send_partition = Partition::new(data, &counts[..], &send_displacements[..]);
        let mut receive_partition = PartitionMut::new(
            &mut receive_buf[..total],
            &recv_counts[..],
            &receive_displacements[..],
        );

        self.comm
            .all_to_all_varcount_into(&send_partition, &mut receive_partition);

        unsafe { receive_data.set_len(total) };

        (
            recv_counts.iter().map(|&i| i as usize).collect_vec(),
            receive_data,
        )
    }
}

fn exclusive_prefix_sum(counts: &[i32]) -> Vec<i32> {
    counts
        .iter()
        .scan(0, |acc, &x| {
            let old = *acc;
            *acc += x;
            Some(old)
        })
        .collect_vec()
}
