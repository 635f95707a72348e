//! Distributed arrays
mod distributed;
mod elementwise;
mod gather;
mod reductions;

pub use distributed::DistributedArray;
