//! Logical shapes
#[cfg(feature = "serde")]
use crate::traits::ConvertToSerializable;
use crate::types::{Error, Result};

/// Translation between global multi-dimensional indices and linear offsets
///
/// Offsets are row-major: the last dimension varies fastest. The rank, the strides and the total
/// size are derived from the dimensions and change only together with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeTranslator {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl ShapeTranslator {
    /// Create new
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() || dims.contains(&0) {
            return Err(Error::EmptyShape {
                dims: dims.to_vec(),
            });
        }
        Ok(Self {
            dims: dims.to_vec(),
            strides: row_major_strides(dims),
        })
    }

    /// Size of each dimension
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Offset increment of a unit step along each dimension
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements
    pub fn total_size(&self) -> usize {
        self.dims[0] * self.strides[0]
    }

    /// Linear offset of a global index
    pub fn linearize(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.rank() {
            return Err(Error::RankMismatch {
                expected: self.rank(),
                actual: index.len(),
            });
        }
        let mut offset = 0;
        for ((&i, &size), &stride) in index.iter().zip(&self.dims).zip(&self.strides) {
            if i >= size {
                return Err(Error::IndexOutOfBounds { index: i, size });
            }
            offset += i * stride;
        }
        Ok(offset)
    }

    /// Global index of a linear offset
    pub fn delinearize(&self, offset: usize) -> Result<Vec<usize>> {
        if offset >= self.total_size() {
            return Err(Error::IndexOutOfBounds {
                index: offset,
                size: self.total_size(),
            });
        }
        let mut remainder = offset;
        Ok(self
            .strides
            .iter()
            .map(|&stride| {
                let i = remainder / stride;
                remainder %= stride;
                i
            })
            .collect())
    }

    /// Change the dimensions, keeping the total size
    ///
    /// On failure the translator is left unchanged.
    pub fn reshape(&mut self, dims: &[usize]) -> Result<()> {
        *self = self.reshaped(dims)?;
        Ok(())
    }

    /// A translator with new dimensions and the same total size
    pub fn reshaped(&self, dims: &[usize]) -> Result<Self> {
        let new = Self::new(dims)?;
        if new.total_size() != self.total_size() {
            return Err(Error::ShapeMismatch {
                expected: self.total_size(),
                actual: new.total_size(),
            });
        }
        Ok(new)
    }
}

fn row_major_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for d in (0..dims.len() - 1).rev() {
        strides[d] = strides[d + 1] * dims[d + 1];
    }
    strides
}

#[cfg(feature = "serde")]
impl ConvertToSerializable for ShapeTranslator {
    type SerializableType = Vec<usize>;
    fn to_serializable(&self) -> Vec<usize> {
        self.dims.clone()
    }
    fn from_serializable(dims: Vec<usize>) -> Result<Self> {
        Self::new(&dims)
    }
}
