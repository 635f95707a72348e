//! Communicator for partitions running as threads of one process
use crate::{
    traits::Comm,
    types::{Element, Transferable},
};
use itertools::Itertools;
use std::{
    any::Any,
    panic,
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread,
};

#[derive(Debug)]
struct Shared {
    size: usize,
    slots: Mutex<Vec<Option<Box<dyn Any + Send>>>>,
    state: Mutex<BarrierState>,
    released: Condvar,
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: usize,
    poisoned: bool,
}

// Panic payload of partitions that stop because another partition panicked.
#[derive(Debug)]
struct PeerPanicked;

impl Shared {
    // Barrier that releases every waiting partition with a panic once the barrier is poisoned.
    fn wait(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.poisoned {
            let generation = state.generation;
            state.arrived += 1;
            if state.arrived == self.size {
                state.arrived = 0;
                state.generation += 1;
                self.released.notify_all();
                return;
            }
            while state.generation == generation && !state.poisoned {
                state = self
                    .released
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if !state.poisoned {
                return;
            }
        }
        drop(state);
        panic::panic_any(PeerPanicked);
    }

    fn poison(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .poisoned = true;
        self.released.notify_all();
    }
}

// Poisons the barrier when a partition thread unwinds.
struct PoisonOnPanic<'a>(&'a Shared);

impl Drop for PoisonOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.poison();
        }
    }
}

/// Communicator connecting partitions that run as threads of the same process
///
/// Each collective deposits the contribution of every partition in a shared slot, waits for all
/// partitions, reads the contributions and waits again before the slots can be reused.
#[derive(Debug, Clone)]
pub struct ThreadComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl ThreadComm {
    /// Create the communicators of `size` partitions, ordered by rank
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn create(size: usize) -> Vec<Self> {
        assert!(size > 0, "A communicator needs a partition");
        let shared = Arc::new(Shared {
            size,
            slots: Mutex::new((0..size).map(|_| None).collect()),
            state: Mutex::new(BarrierState::default()),
            released: Condvar::new(),
        });
        (0..size)
            .map(|rank| Self {
                rank,
                shared: shared.clone(),
            })
            .collect()
    }

    /// Run `f` on `size` partitions, one thread each, and return the results ordered by rank
    ///
    /// If `f` panics on one partition, the other partitions panic at their next collective
    /// instead of waiting forever, and the first panic is resumed on the calling thread.
    /// Communicators from [`ThreadComm::create`] used on threads spawned elsewhere get no such
    /// protection.
    pub fn run<R: Send, F: Fn(&ThreadComm) -> R + Sync>(size: usize, f: F) -> Vec<R> {
        let comms = Self::create(size);
        let f = &f;
        thread::scope(|s| {
            let handles = comms
                .iter()
                .map(|comm| {
                    s.spawn(move || {
                        let _guard = PoisonOnPanic(&comm.shared);
                        f(comm)
                    })
                })
                .collect_vec();
            let mut results = Vec::with_capacity(size);
            let mut first_panic: Option<Box<dyn Any + Send>> = None;
            for handle in handles {
                match handle.join() {
                    Ok(result) => results.push(result),
                    Err(payload) => {
                        let replace = match &first_panic {
                            None => true,
                            Some(p) => p.is::<PeerPanicked>() && !payload.is::<PeerPanicked>(),
                        };
                        if replace {
                            first_panic = Some(payload);
                        }
                    }
                }
            }
            if let Some(payload) = first_panic {
                panic::resume_unwind(payload);
            }
            results
        })
    }

    // Every partition contributes a value and receives the contributions of all partitions.
    fn exchange<V: Any + Send + Clone>(&self, contribution: V) -> Vec<V> {
        self.shared.slots.lock().expect("Poisoned communicator")[self.rank] =
            Some(Box::new(contribution));
        self.shared.wait();
        let all = self
            .shared
            .slots
            .lock()
            .expect("Poisoned communicator")
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .and_then(|b| b.downcast_ref::<V>())
                    .expect("Partitions called different collectives")
                    .clone()
            })
            .collect();
        self.shared.wait();
        all
    }
}

impl Comm for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) {
        self.shared.wait();
    }

    fn all_reduce_sum<T: Element>(&self, local: T) -> T {
        // Summed in rank order so that every partition gets bitwise the same result.
        self.exchange(local)
            .into_iter()
            .fold(T::zero(), |acc, v| acc.elem_add(v))
    }

    fn all_reduce_max(&self, local: usize) -> usize {
        self.exchange(local).into_iter().max().unwrap_or(local)
    }

    fn all_gather<T: Transferable>(&self, local: &[T]) -> Vec<T> {
        self.exchange(local.to_vec()).concat()
    }

    fn gather<T: Transferable>(&self, root: usize, local: &[T]) -> Option<Vec<T>> {
        let all = self.exchange(local.to_vec());
        (self.rank == root).then(|| all.concat())
    }

    fn all_to_all_varcount<T: Transferable>(
        &self,
        counts: &[usize],
        data: &[T],
    ) -> (Vec<usize>, Vec<T>) {
        let all = self.exchange((counts.to_vec(), data.to_vec()));
        let mut recv_counts = Vec::with_capacity(all.len());
        let mut received = vec![];
        for (source_counts, source_data) in &all {
            let start = source_counts[..self.rank].iter().sum::<usize>();
            let count = source_counts[self.rank];
            recv_counts.push(count);
            received.extend_from_slice(&source_data[start..start + count]);
        }
        (recv_counts, received)
    }
}
