//! Ownership

/// Ownership of a local slot
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ownership {
    /// Owned by the current partition
    Owned,
    /// Copy of a value owned elsewhere: the owning partition and the local slot there
    Ghost(usize, usize),
}

impl Ownership {
    /// Is this slot owned by the current partition?
    pub fn is_owned(&self) -> bool {
        matches!(self, Ownership::Owned)
    }
}
