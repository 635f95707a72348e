//! Errors
use thiserror::Error;

/// Errors raised by layouts and distributed arrays
///
/// All of these are local to the calling partition and leave the objects involved unchanged.
#[allow(missing_docs)]
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    #[error("expected an index of rank {expected} but got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    #[error("index {index} is out of bounds for a dimension of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("cannot use a shape of total size {actual} where total size {expected} is required")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("a shape needs at least one dimension and no dimension of size zero, got {dims:?}")]
    EmptyShape { dims: Vec<usize> },

    #[error("global offset {offset} is not owned by partition {partition}")]
    NotOwned { offset: usize, partition: usize },

    #[error("the arrays do not share the same shape and ownership layout")]
    LayoutMismatch,

    #[error("expected {expected} values but got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("integer division by zero at global offset {offset}")]
    DivisionByZero { offset: usize },

    #[error("the ownership map has {expected} partitions but the communicator has {actual}")]
    PartitionCountMismatch { expected: usize, actual: usize },

    #[error("a {rows}x{cols} matrix cannot be solved against a right hand side of size {rhs}")]
    SystemSizeMismatch { rows: usize, cols: usize, rhs: usize },

    #[error("serialization failed: {message}")]
    Serialization { message: String },
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
