//! Element types
use num::{NumCast, Zero};
use std::fmt::{Debug, Display};

/// Kind of values stored in a distributed array
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    /// Signed integers
    Integer,
    /// Floating point numbers
    Float,
}

/// Values that can be sent between partitions
#[cfg(feature = "mpi")]
pub trait Transferable: mpi::traits::Equivalence + Copy + Send + 'static {}
#[cfg(feature = "mpi")]
impl<T: mpi::traits::Equivalence + Copy + Send + 'static> Transferable for T {}

/// Values that can be sent between partitions
#[cfg(not(feature = "mpi"))]
pub trait Transferable: Copy + Send + 'static {}
#[cfg(not(feature = "mpi"))]
impl<T: Copy + Send + 'static> Transferable for T {}

pub trait Element:
    Transferable + Debug + Display + PartialEq + PartialOrd + Zero + NumCast + Sync
{
    //! Scalar stored in a distributed array
    //!
    //! Arithmetic goes through the `elem_*` methods so that integer overflow wraps
    //! and integer division by zero is reported instead of panicking.

    /// The element kind tag
    const KIND: ElementKind;

    /// Sum of two elements
    fn elem_add(self, other: Self) -> Self;
    /// Difference of two elements
    fn elem_sub(self, other: Self) -> Self;
    /// Product of two elements
    fn elem_mul(self, other: Self) -> Self;
    /// Quotient of two elements, or `None` if it is undefined for this kind
    fn elem_div(self, other: Self) -> Option<Self>;
    /// Absolute value
    fn elem_abs(self) -> Self;
    /// Lossy conversion to `f64`
    fn as_f64(self) -> f64;
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const KIND: ElementKind = ElementKind::Float;
                fn elem_add(self, other: Self) -> Self {
                    self + other
                }
                fn elem_sub(self, other: Self) -> Self {
                    self - other
                }
                fn elem_mul(self, other: Self) -> Self {
                    self * other
                }
                fn elem_div(self, other: Self) -> Option<Self> {
                    Some(self / other)
                }
                fn elem_abs(self) -> Self {
                    self.abs()
                }
                fn as_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

macro_rules! impl_integer_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const KIND: ElementKind = ElementKind::Integer;
                fn elem_add(self, other: Self) -> Self {
                    self.wrapping_add(other)
                }
                fn elem_sub(self, other: Self) -> Self {
                    self.wrapping_sub(other)
                }
                fn elem_mul(self, other: Self) -> Self {
                    self.wrapping_mul(other)
                }
                fn elem_div(self, other: Self) -> Option<Self> {
                    self.checked_div(other)
                }
                fn elem_abs(self) -> Self {
                    self.wrapping_abs()
                }
                fn as_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_float_element!(f32, f64);
impl_integer_element!(i32, i64);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(<f64 as Element>::KIND, ElementKind::Float);
        assert_eq!(<f32 as Element>::KIND, ElementKind::Float);
        assert_eq!(<i64 as Element>::KIND, ElementKind::Integer);
        assert_eq!(<i32 as Element>::KIND, ElementKind::Integer);
    }

    #[test]
    fn test_integer_arithmetic_does_not_panic() {
        assert_eq!(i64::MAX.elem_add(1), i64::MIN);
        assert_eq!(7i64.elem_div(0), None);
        assert_eq!(7i64.elem_div(2), Some(3));
    }

    #[test]
    fn test_float_division_by_zero_is_data() {
        let q = 1.0f64.elem_div(0.0).unwrap();
        assert!(q.is_infinite());
        assert!(0.0f64.elem_div(0.0).unwrap().is_nan());
    }
}
