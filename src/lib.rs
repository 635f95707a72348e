//! Partitioned n-dimensional arrays and index layouts
//!
//! A [`DistributedArray`] combines a [`ShapeTranslator`], mapping multi-dimensional indices to
//! global offsets, with an [`OwnershipMap`], assigning every global offset to one partition.
//! Partitions communicate through a [`traits::Comm`]: [`SerialComm`] for a single partition,
//! [`ThreadComm`] for partitions running as threads, and `MpiComm` with the `mpi` feature.
#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod array;
pub mod comm;
mod io;
pub mod layout;
pub mod linalg;
pub mod traits;
pub mod types;

pub use array::DistributedArray;
#[cfg(feature = "mpi")]
pub use comm::MpiComm;
pub use comm::{SerialComm, ThreadComm};
pub use layout::{ExchangePattern, OwnershipMap, ShapeTranslator};
pub use linalg::{DistributedMatrix, LinearSystem};
