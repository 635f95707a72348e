//! Distributed linear algebra
mod matrix;
mod system;

pub use matrix::DistributedMatrix;
pub use system::{LinearSystem, SolveReport};
