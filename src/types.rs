//! Types

mod element;
mod error;
mod ownership;
mod partitioner;

pub use element::{Element, ElementKind, Transferable};
pub use error::{Error, Result};
pub use ownership::Ownership;
pub use partitioner::Partitioner;
