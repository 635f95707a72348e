//! Partitioning policies

/// Policy that assigns global offsets to partitions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Partitioner {
    /// Contiguous blocks whose sizes differ by at most one
    #[default]
    Uniform,
    /// Explicit owner for every global offset, e.g. taken from a mesh decomposition
    Manual(Vec<usize>),
}
