//! Index layouts
//!
//! A layout is made of a [`ShapeTranslator`], which relates multi-dimensional global indices to
//! linear offsets, and an [`OwnershipMap`], which assigns each offset to the partition storing it.
//! Both are immutable once shared between arrays.
mod exchange;
mod ownership_map;
mod shape;

pub use exchange::{ExchangePattern, Ghosts};
#[cfg(feature = "serde")]
pub use ownership_map::SerializableOwnershipMap;
pub use ownership_map::OwnershipMap;
pub use shape::ShapeTranslator;
