//! Traits

mod comm;
#[cfg(feature = "serde")]
mod io;
mod solver;

pub use comm::Comm;
#[cfg(feature = "serde")]
pub use io::{ConvertToSerializable, RONExport, RONImport};
pub use solver::Solver;
